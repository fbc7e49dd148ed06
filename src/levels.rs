use crate::board::Board;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

/// Error type for level parsing operations.
#[derive(Debug)]
pub enum LevelError {
    /// IO error when reading from file
    Io(io::Error),
    /// Invalid level content
    InvalidLevel(String),
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelError::Io(err) => write!(f, "IO error: {}", err),
            LevelError::InvalidLevel(msg) => write!(f, "Invalid level: {}", msg),
        }
    }
}

impl std::error::Error for LevelError {}

impl From<io::Error> for LevelError {
    fn from(err: io::Error) -> Self {
        LevelError::Io(err)
    }
}

impl From<String> for LevelError {
    fn from(err: String) -> Self {
        LevelError::InvalidLevel(err)
    }
}

/// A collection of Sokoban levels in XSB format.
#[derive(Debug)]
pub struct Levels {
    levels: Vec<Board>,
}

impl Levels {
    /// Parse XSB-formatted Sokoban levels from a string.
    ///
    /// The XSB format uses:
    /// - Lines starting with `;` as level separators/comments
    /// - Standard Sokoban characters (#, @, $, ., *, +, space)
    /// - Empty lines between levels (optional)
    pub fn from_text(contents: &str) -> Result<Self, LevelError> {
        let mut levels = Vec::new();
        let mut current_level = String::new();

        for line in contents.lines() {
            // Comment lines and empty lines both terminate a level in
            // progress.
            if line.trim_start().starts_with(';') || line.is_empty() {
                if !current_level.is_empty() {
                    let board = Board::from_text(current_level.trim_end())?;
                    levels.push(board);
                    current_level.clear();
                }
                continue;
            }

            current_level.push_str(line);
            current_level.push('\n');
        }

        // The last level if the file doesn't end with an empty line.
        if !current_level.is_empty() {
            let board = Board::from_text(current_level.trim_end())?;
            levels.push(board);
        }

        Ok(Levels { levels })
    }

    /// Parse XSB-formatted Sokoban levels from a text file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let contents = fs::read_to_string(path)?;
        Self::from_text(&contents)
    }

    /// Get the nth level (0-indexed).
    pub fn get(&self, index: usize) -> Option<&Board> {
        self.levels.get(index)
    }

    /// Get the number of levels.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_text_basic() {
        let level1 = "####\n\
                      # .#\n\
                      #  ###\n\
                      #*@  #\n\
                      #  $ #\n\
                      #  ###\n\
                      ####";

        let level2 = "######\n\
                      #    #\n\
                      # #@ #\n\
                      # $* #\n\
                      # .* #\n\
                      #    #\n\
                      ######";

        let xsb_content = format!("; 1\n\n{}\n\n; 2\n\n{}\n", level1, level2);
        let levels = Levels::from_text(&xsb_content).unwrap();

        assert_eq!(levels.len(), 2);
        assert_eq!(levels.get(0).unwrap().to_string().trim_end(), level1);
        assert_eq!(levels.get(1).unwrap().to_string().trim_end(), level2);
    }

    #[test]
    fn test_from_text_invalid_level() {
        let xsb_content = "; 1\n\n####\n#@@#\n####\n";
        let result = Levels::from_text(xsb_content);
        assert!(matches!(result, Err(LevelError::InvalidLevel(_))));
    }

    #[test]
    fn test_from_file_no_file() {
        let result = Levels::from_file("nonexistent_file.xsb");
        assert!(matches!(result, Err(LevelError::Io(_))));
    }

    #[test]
    fn test_level_without_trailing_newline() {
        let levels = Levels::from_text("####\n#@*#\n####").unwrap();
        assert_eq!(levels.len(), 1);
    }
}
