use crate::board::{Board, Direction};

/// One recorded push: the pushed box and the direction it moved one square.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Movement {
    pub direction: Direction,
    pub box_no: usize,
}

/// Records the `(direction, box_no)` push events of a solver run and renders
/// them as a LURD string.
///
/// The solvers only emit pushes; the walks the player needs between pushes
/// are reconstructed here by replaying the pushes against a clone of the
/// starting board and routing the player with shortest paths.
#[derive(Debug, Default)]
pub struct MoveHistory {
    movements: Vec<Movement>,
}

impl MoveHistory {
    pub fn new() -> Self {
        MoveHistory::default()
    }

    pub fn add_movement(&mut self, direction: Direction, box_no: usize) {
        self.movements.push(Movement { direction, box_no });
    }

    pub fn len(&self) -> usize {
        self.movements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movements.is_empty()
    }

    /// Render the recorded pushes as a complete LURD string starting from
    /// `start`: lowercase walks to reach each pushing square, one uppercase
    /// letter per push.
    ///
    /// Panics if a recorded push is not executable on the replayed board;
    /// that would mean the solver recorded an invalid solution.
    pub fn to_lurd(&self, start: &Board) -> String {
        let mut board = start.clone();
        let mut lurd = String::new();

        for movement in &self.movements {
            let box_square = board.box_position(movement.box_no);
            let target = board
                .offset_position(box_square, movement.direction)
                .expect("recorded push leaves the board");
            let behind = board
                .offset_position(box_square, movement.direction.reverse())
                .expect("recorded push has no square to push from");

            if board.player_position != behind {
                let path = board
                    .player_path_to(behind)
                    .expect("player cannot reach the pushing square");
                for direction in path {
                    lurd.push(direction.walk_char());
                }
                board.player_position = behind;
            }

            board.push_box(box_square, target);
            board.player_position = box_square;
            lurd.push(movement.direction.push_char());
        }

        lurd
    }
}

/// Replay a LURD string against `board`, mutating it move by move.
/// Characters outside the LURD alphabet are ignored. Errors leave the board
/// in the state reached so far.
pub fn replay_lurd(board: &mut Board, lurd: &str) -> Result<(), String> {
    for ch in lurd.chars() {
        let Some((direction, is_push)) = Direction::from_lurd_char(ch) else {
            continue;
        };
        let next = board
            .offset_position(board.player_position, direction)
            .ok_or_else(|| format!("move '{}' walks off the board", ch))?;

        if is_push {
            if !board.is_box(next) {
                return Err(format!("push '{}' has no box to push", ch));
            }
            let destination = board
                .offset_position(next, direction)
                .ok_or_else(|| format!("push '{}' pushes off the board", ch))?;
            if !board.is_accessible_box(destination) {
                return Err(format!("push '{}' pushes into a blocked square", ch));
            }
            board.push_box(next, destination);
            board.player_position = next;
        } else {
            if !board.is_accessible(next) {
                return Err(format!("walk '{}' enters a blocked square", ch));
            }
            board.player_position = next;
        }
    }
    Ok(())
}
