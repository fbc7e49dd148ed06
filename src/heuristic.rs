use crate::board::{Board, Direction};
use crate::deadlocks;

/// Result of the pushes lower-bound estimate for a board position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LowerBound {
    Pushes(usize),
    Deadlock,
}

/// Lower bound on the number of pushes needed to solve the board.
///
/// Zero exactly when every box is already on a goal. `Deadlock` when an
/// off-goal box is freeze-deadlocked. Otherwise every off-goal box needs at
/// least one full step, and a b-type step is two pushes.
pub fn pushes_lower_bound(board: &Board) -> LowerBound {
    let mut pushes = 0;
    for box_no in 0..board.box_count() {
        let square = board.box_position(box_no);
        if board.is_box_on_goal(square) {
            continue;
        }
        if deadlocks::is_freeze_deadlock(board, square) {
            return LowerBound::Deadlock;
        }
        pushes += 2;
    }
    LowerBound::Pushes(pushes)
}

/// Counts the boxes that sit on their correct goals.
///
/// In a b-type level each box has a unique goal along its one free axis: the
/// axis is Right when the square above the box is a wall, Down otherwise.
/// Walking that axis to the wall, the box is on its correct goal when the
/// remaining boxes and goals on the line balance out.
pub fn boxes_on_correct_goal(board: &Board) -> usize {
    let mut on_correct_goal = 0;

    for box_no in 0..board.box_count() {
        let box_square = board.box_position(box_no);
        if !board.is_goal(box_square) {
            continue;
        }

        let above_is_wall = board
            .offset_position(box_square, Direction::Up)
            .map_or(true, |above| board.is_wall(above));
        let axis = if above_is_wall {
            Direction::Right
        } else {
            Direction::Down
        };

        let mut boxes = 0;
        let mut goals = 0;
        let mut square = box_square;
        while let Some(neighbor) = board.offset_position(square, axis) {
            if board.is_goal(neighbor) {
                goals += 1;
            }
            if board.is_box(neighbor) {
                boxes += 1;
            }
            square = neighbor;
            if board.is_wall(square) {
                break;
            }
        }

        if boxes == goals {
            on_correct_goal += 1;
        }
    }

    on_correct_goal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lower_bound_zero_when_solved() {
        let input = "####\n\
                     #@*#\n\
                     ####";
        let board = Board::from_text(input).unwrap();
        assert_eq!(pushes_lower_bound(&board), LowerBound::Pushes(0));
    }

    #[test]
    fn test_lower_bound_counts_off_goal_boxes() {
        let input = "######\n\
                     #@$ .#\n\
                     # $ .#\n\
                     ######";
        let board = Board::from_text(input).unwrap();
        assert_eq!(pushes_lower_bound(&board), LowerBound::Pushes(4));
    }

    #[test]
    fn test_lower_bound_detects_deadlock() {
        let input = "####\n\
                     #$ #\n\
                     # .#\n\
                     #@##";
        let board = Board::from_text(input).unwrap();
        assert_eq!(pushes_lower_bound(&board), LowerBound::Deadlock);
    }

    #[test]
    fn test_box_on_correct_goal_along_row() {
        // Box on a goal with the square above walled: the free axis is Right,
        // and the rest of the row holds no boxes and no goals.
        let input = "######\n\
                     #@*  #\n\
                     ######";
        let board = Board::from_text(input).unwrap();
        assert_eq!(boxes_on_correct_goal(&board), 1);
    }

    #[test]
    fn test_box_on_wrong_goal_along_row() {
        // A goal further along the row with its box elsewhere: the line
        // does not balance, so the box is not on its correct goal.
        let input = "########\n\
                     #@*  . #\n\
                     #  $   #\n\
                     ########";
        let board = Board::from_text(input).unwrap();
        assert_eq!(boxes_on_correct_goal(&board), 0);
    }

    #[test]
    fn test_box_off_goal_not_counted() {
        let input = "######\n\
                     #@$ .#\n\
                     ######";
        let board = Board::from_text(input).unwrap();
        assert_eq!(boxes_on_correct_goal(&board), 0);
    }

    #[test]
    fn test_column_axis_when_no_wall_above() {
        // Square above the box is floor, so the free axis is Down.
        let input = "#####\n\
                     # @ #\n\
                     # * #\n\
                     #   #\n\
                     #####";
        let board = Board::from_text(input).unwrap();
        assert_eq!(boxes_on_correct_goal(&board), 1);
    }
}
