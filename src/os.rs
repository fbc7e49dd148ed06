use std::sync::OnceLock;

/// The operating system kind the process is running on, detected once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsKind {
    MacOs,
    Linux,
    Windows,
    Other,
}

static OS_KIND: OnceLock<OsKind> = OnceLock::new();

impl OsKind {
    pub fn current() -> OsKind {
        *OS_KIND.get_or_init(|| match std::env::consts::OS {
            "macos" => OsKind::MacOs,
            "linux" => OsKind::Linux,
            "windows" => OsKind::Windows,
            _ => OsKind::Other,
        })
    }
}

/// Sanitizes a file name for the operating system being used: Windows rules
/// on Windows, Unix rules everywhere else.
pub fn sanitize_file_name(file_name: &str) -> String {
    match OsKind::current() {
        OsKind::Windows => sanitize_file_name_windows(file_name),
        _ => sanitize_file_name_unix(file_name),
    }
}

fn sanitize_file_name_windows(file_name: &str) -> String {
    const INVALID_CHARACTERS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
    const RESERVED_NAMES: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7",
        "COM8", "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];

    let replaced: String = file_name
        .chars()
        .map(|ch| if INVALID_CHARACTERS.contains(&ch) { '_' } else { ch })
        .collect();

    let mut name = replaced.trim().trim_end_matches('.').to_string();

    if RESERVED_NAMES.contains(&name.to_uppercase().as_str()) {
        name.push('_');
    }

    if name.chars().count() > 255 {
        name = name.chars().take(255).collect();
    }

    name
}

fn sanitize_file_name_unix(file_name: &str) -> String {
    let mut name = file_name.replace('/', "_").replace('\0', "").trim().to_string();

    if name.starts_with('.') || name.starts_with('-') {
        name.insert(0, '_');
    }

    if name.is_empty() {
        name = "default_filename".to_string();
    }

    name
}

/// Free memory in MiB, or `None` when the platform gives no cheap answer
/// (treated as "plenty" by the solvers).
pub fn available_memory_mib() -> Option<u64> {
    #[cfg(target_os = "linux")]
    {
        let meminfo = std::fs::read_to_string("/proc/meminfo").ok()?;
        for line in meminfo.lines() {
            if let Some(rest) = line.strip_prefix("MemAvailable:") {
                let kib: u64 = rest.trim().trim_end_matches("kB").trim().parse().ok()?;
                return Some(kib / 1024);
            }
        }
        None
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}
