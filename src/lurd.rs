use crate::board::Direction;
use thiserror::Error;

/// Why a LURD string cannot be turned into a puzzle.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InvalidLurd {
    /// An uppercase move claims a box on a square the player already
    /// reached without one.
    #[error("a push revisits a square that cannot hold a box")]
    PushOnReachedSquare,
    /// A lowercase move walks into a box.
    #[error("a walk runs into a box")]
    WalkIntoBox,
    /// A box is pushed into a square already holding a box.
    #[error("a box is pushed into another box")]
    BoxBehindBox,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cell {
    Unreached,
    Floor,
    Wall,
    Goal,
    Box,
}

/// Reverse-engineers a complete puzzle (walls, boxes, goals, player) from a
/// solution trace alone.
///
/// Lowercase `u`, `l`, `d`, `r` are moves without a push; uppercase letters
/// push a box in that direction. All other characters are ignored. Trailing
/// moves beyond the last push are accepted ("RRllu") and simply widen the
/// reachable area; a trace with no pushes yields a puzzle with no boxes or
/// goals, which can still be useful to see the shape of a walk.
///
/// Example: `convert_lurd_to_puzzle("RR")` returns
/// ```text
/// ######
/// #@$ .#
/// ######
/// ```
///
/// An invalid LURD string yields an empty string; see [`InvalidLurd`] for
/// the conditions.
pub fn convert_lurd_to_puzzle(lurd: &str) -> String {
    try_convert_lurd_to_puzzle(lurd).unwrap_or_default()
}

/// Like [`convert_lurd_to_puzzle`], reporting why a trace is invalid.
/// An empty (or noise-only) trace is valid and yields an empty string.
pub fn try_convert_lurd_to_puzzle(lurd: &str) -> Result<String, InvalidLurd> {
    let moves: Vec<(Direction, bool)> = lurd.chars().filter_map(Direction::from_lurd_char).collect();
    if moves.is_empty() {
        return Ok(String::new());
    }

    let (width, height, player_start) = board_bounds(&moves);
    let index = |x: usize, y: usize| y * width + x;

    let mut grid = vec![Cell::Unreached; width * height];
    let mut is_initial_box_position = vec![false; width * height];

    // Replay the trace, marking everything the player or a box touches.
    let (mut x, mut y) = player_start;
    grid[index(x, y)] = Cell::Floor;

    for &(direction, is_push) in &moves {
        let (dx, dy) = direction.delta();
        x = (x as i32 + dx) as usize;
        y = (y as i32 + dy) as usize;
        let reached = index(x, y);

        if is_push && grid[reached] != Cell::Box {
            if grid[reached] != Cell::Unreached {
                // The player reaches a square already reached before, but
                // now there should be a box?!
                return Err(InvalidLurd::PushOnReachedSquare);
            }
            // First touch of the box
            grid[reached] = Cell::Box;
            is_initial_box_position[reached] = true;
        }

        if grid[reached] == Cell::Box {
            if !is_push {
                return Err(InvalidLurd::WalkIntoBox);
            }
            let pushed_to = index((x as i32 + dx) as usize, (y as i32 + dy) as usize);
            if grid[pushed_to] == Cell::Box {
                return Err(InvalidLurd::BoxBehindBox);
            }
            grid[pushed_to] = Cell::Box;
        }

        // The box, if any, has moved off the player's square.
        grid[reached] = Cell::Floor;
    }

    // Surround the reached region with walls; a box's final resting square
    // must be a goal.
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let at = index(x, y);
            if grid[at] == Cell::Floor || grid[at] == Cell::Box {
                for y_offset in -1i32..=1 {
                    for x_offset in -1i32..=1 {
                        let neighbor =
                            index((x as i32 + x_offset) as usize, (y as i32 + y_offset) as usize);
                        if grid[neighbor] == Cell::Unreached {
                            grid[neighbor] = Cell::Wall;
                        }
                    }
                }
                if grid[at] == Cell::Box {
                    grid[at] = Cell::Goal;
                }
            }
        }
    }

    // Render, overlaying the initial boxes and the initial player position.
    let mut board = String::new();
    for y in 0..height {
        let mut row = String::new();
        for x in 0..width {
            let at = index(x, y);
            let mut glyph = match grid[at] {
                Cell::Unreached | Cell::Floor => ' ',
                Cell::Wall => '#',
                Cell::Goal => '.',
                Cell::Box => '$',
            };
            if is_initial_box_position[at] {
                glyph = if grid[at] == Cell::Goal { '*' } else { '$' };
            }
            if (x, y) == player_start {
                glyph = if grid[at] == Cell::Goal { '+' } else { '@' };
            }
            row.push(glyph);
        }
        board.push_str(row.trim_end());
        board.push('\n');
    }

    Ok(board)
}

/// Board width, height and initial player coordinates for a trace.
///
/// The extrema of the walk give the core area; a push reaches one square
/// beyond the player, and a one-square wall border surrounds everything.
fn board_bounds(moves: &[(Direction, bool)]) -> (usize, usize, (usize, usize)) {
    let (mut x, mut y) = (0i32, 0i32);
    let (mut min_x, mut max_x) = (0i32, 0i32);
    let (mut min_y, mut max_y) = (0i32, 0i32);

    for &(direction, is_push) in moves {
        let (dx, dy) = direction.delta();
        x += dx;
        y += dy;
        let reach = if is_push { 1 } else { 0 };
        min_x = min_x.min(x + dx * reach);
        max_x = max_x.max(x + dx * reach);
        min_y = min_y.min(y + dy * reach);
        max_y = max_y.max(y + dy * reach);
    }

    let width = (max_x - min_x + 3) as usize;
    let height = (max_y - min_y + 3) as usize;
    let player = ((-min_x + 1) as usize, (-min_y + 1) as usize);

    (width, height, player)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::history::replay_lurd;

    #[test]
    fn test_two_pushes_right() {
        assert_eq!(
            convert_lurd_to_puzzle("RR"),
            "######\n\
             #@$ .#\n\
             ######\n"
        );
    }

    #[test]
    fn test_empty_and_blank_input() {
        assert_eq!(convert_lurd_to_puzzle(""), "");
        assert_eq!(convert_lurd_to_puzzle("   \n\t"), "");
    }

    #[test]
    fn test_noise_only_input_matches_sanitized() {
        // Stripping non-LURD characters must not change the classification.
        assert_eq!(convert_lurd_to_puzzle("xyz 123"), "");
    }

    #[test]
    fn test_noise_is_ignored() {
        assert_eq!(convert_lurd_to_puzzle("R R!\n"), convert_lurd_to_puzzle("RR"));
    }

    #[test]
    fn test_walks_only() {
        let puzzle = convert_lurd_to_puzzle("rrrd");
        assert!(!puzzle.is_empty());
        assert!(!puzzle.contains('$'));
        assert!(!puzzle.contains('.'));
        assert!(puzzle.contains('@'));
    }

    #[test]
    fn test_overlong_trailing_walks_accepted() {
        let puzzle = convert_lurd_to_puzzle("RRllu");
        assert!(!puzzle.is_empty());

        // The walk beyond the pushes widens the reachable area upward.
        let board = Board::from_text(puzzle.trim_end()).unwrap();
        assert_eq!(board.box_count(), 1);
        assert!(board.height() > 3);
    }

    #[test]
    fn test_box_behind_box_is_invalid() {
        // "RR" parks a box; the final push creates a second box right below
        // the parked one and pushes it up into it.
        assert_eq!(
            try_convert_lurd_to_puzzle("RRddrU"),
            Err(InvalidLurd::BoxBehindBox)
        );
    }

    #[test]
    fn test_walk_into_box_is_invalid() {
        // "R" parks a box one square to the right; the final walk runs
        // into it.
        assert_eq!(
            try_convert_lurd_to_puzzle("Rlrr"),
            Err(InvalidLurd::WalkIntoBox)
        );
    }

    #[test]
    fn test_push_on_reached_square_is_invalid() {
        // The player walks a square, returns, and then claims a box
        // appeared there.
        assert_eq!(
            try_convert_lurd_to_puzzle("rlR"),
            Err(InvalidLurd::PushOnReachedSquare)
        );
    }

    #[test]
    fn test_round_trip_with_solver_replay() {
        // The reconstructed puzzle must accept its own trace as a solution.
        for lurd in ["RR", "DD", "RRDD", "UU"] {
            let puzzle = convert_lurd_to_puzzle(lurd);
            let mut board = Board::from_text(puzzle.trim_end()).unwrap();
            replay_lurd(&mut board, lurd).unwrap();
            assert!(board.every_box_on_goal(), "lurd {:?}", lurd);
        }
    }

    #[test]
    fn test_reconstructed_puzzle_resolves_to_same_trace() {
        use crate::moves_solver::MovesEqualsPushesSolver;
        use crate::solver::{Cancellation, NullProgress};

        let puzzle = convert_lurd_to_puzzle("RRR");
        let board = Board::from_text(puzzle.trim_end()).unwrap();

        let solution = MovesEqualsPushesSolver::new(Cancellation::new())
            .solve(&board, &NullProgress)
            .unwrap();
        assert_eq!(solution.lurd, "RRR");
    }

    #[test]
    fn test_player_ends_on_goal_renders_plus() {
        // Push a box away and walk back over the start: the start square is
        // plain floor, so the player renders as '@'.
        let puzzle = convert_lurd_to_puzzle("RR");
        assert!(puzzle.contains('@'));
        assert!(!puzzle.contains('+'));
    }

    #[test]
    fn test_initial_box_on_goal_renders_star() {
        // Push the box right, walk around it, push it back onto its initial
        // square: the square is both an initial box position and a goal.
        let puzzle = convert_lurd_to_puzzle("RdrruL");
        assert!(puzzle.contains('*'));
        assert!(!puzzle.contains('$'));
    }
}
