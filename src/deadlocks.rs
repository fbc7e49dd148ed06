use crate::bits::SquareSet;
use crate::board::{Board, Direction};

/// Returns whether the box at `square` is freeze-deadlocked: it can never be
/// pushed again, and the frozen cluster it belongs to holds at least one box
/// that is not on a goal.
pub fn is_freeze_deadlock(board: &Board, square: usize) -> bool {
    assert!(board.is_box(square), "no box at square {}", square);
    let mut frozen = Frozen::new(board.size());
    frozen.is_frozen(board, square) && frozen.deadlocked
}

struct Frozen {
    visited: SquareSet,
    deadlocked: bool,
}

impl Frozen {
    fn new(square_count: usize) -> Self {
        Frozen {
            visited: SquareSet::new(square_count),
            deadlocked: false,
        }
    }

    fn is_frozen(&mut self, board: &Board, square: usize) -> bool {
        if board.is_wall(square) {
            return true;
        }
        if !board.is_box(square) {
            return false;
        }
        if self.visited.contains(square) {
            return true;
        }
        self.visited.insert(square);

        let frozen = (self.is_frozen_dir(board, square, Direction::Left)
            || self.is_frozen_dir(board, square, Direction::Right))
            && (self.is_frozen_dir(board, square, Direction::Up)
                || self.is_frozen_dir(board, square, Direction::Down));
        if frozen && !board.is_goal(square) {
            self.deadlocked = true;
        }
        frozen
    }

    fn is_frozen_dir(&mut self, board: &Board, square: usize, direction: Direction) -> bool {
        match board.offset_position(square, direction) {
            Some(next) => self.is_frozen(board, next),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_in_corner_is_deadlocked() {
        let input = "####\n\
                     #$ #\n\
                     # .#\n\
                     #@##";
        let board = Board::from_text(input).unwrap();
        let box_square = board.box_position(0);
        assert!(is_freeze_deadlock(&board, box_square));
    }

    #[test]
    fn test_box_in_corner_on_goal_is_not_deadlocked() {
        let input = "####\n\
                     #* #\n\
                     #  #\n\
                     #@##";
        let board = Board::from_text(input).unwrap();
        let box_square = board.box_position(0);
        assert!(!is_freeze_deadlock(&board, box_square));
    }

    #[test]
    fn test_free_box_is_not_deadlocked() {
        let input = "#####\n\
                     #   #\n\
                     # $ #\n\
                     # . #\n\
                     # @ #\n\
                     #####";
        let board = Board::from_text(input).unwrap();
        let box_square = board.box_position(0);
        assert!(!is_freeze_deadlock(&board, box_square));
    }

    #[test]
    fn test_pair_of_boxes_against_wall_is_deadlocked() {
        // Two boxes side by side against the top wall freeze each other.
        let input = "######\n\
                     # $$ #\n\
                     #.. @#\n\
                     ######";
        let board = Board::from_text(input).unwrap();
        let box_square = board.box_position(0);
        assert!(is_freeze_deadlock(&board, box_square));
    }

    #[test]
    fn test_wall_blocked_axis_but_free_other_axis() {
        // Blocked left-right only: still pushable up or down.
        let input = "#####\n\
                     #   #\n\
                     ##$##\n\
                     # . #\n\
                     # @ #\n\
                     #####";
        let board = Board::from_text(input).unwrap();
        let box_square = board.box_position(0);
        assert!(!is_freeze_deadlock(&board, box_square));
    }
}
