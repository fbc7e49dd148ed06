use crate::board::{Board, Direction, ALL_DIRECTIONS};
use crate::deadlocks;
use crate::history::MoveHistory;
use crate::solver::{is_memory_low, Cancellation, ProgressSink, SolveError, Solution};
use ahash::AHashSet;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Solves puzzles whose optimal solution has as many moves as pushes: the
/// player never walks without pushing, so the search space is chains of
/// pushes and a plain BFS by pushes finds the move-optimal solution.
///
/// This solver can only be used for this special type of puzzle.
pub struct MovesEqualsPushesSolver {
    cancellation: Cancellation,
    positions_count: usize,
}

struct Node {
    boxes: Box<[u16]>, // sorted ascending
    player_position: u16,
    pushed_box_position: Option<u16>,
    push_direction: Option<Direction>,
    push_count: u32,
    parent: Option<Rc<Node>>,
}

impl Node {
    fn root(board: &Board) -> Rc<Node> {
        Rc::new(Node {
            boxes: sorted_boxes(board),
            player_position: board.player_position as u16,
            pushed_box_position: None,
            push_direction: None,
            push_count: 0,
            parent: None,
        })
    }

    /// Snapshot of `board` after a push has been applied to it.
    fn pushed(
        board: &Board,
        pushed_box_position: usize,
        direction: Direction,
        parent: &Rc<Node>,
    ) -> Rc<Node> {
        Rc::new(Node {
            boxes: sorted_boxes(board),
            player_position: board.player_position as u16,
            pushed_box_position: Some(pushed_box_position as u16),
            push_direction: Some(direction),
            push_count: parent.push_count + 1,
            parent: Some(parent.clone()),
        })
    }
}

// See PositionNode: parent chains are as deep as the solution is long, so
// they are unlinked iteratively on drop.
impl Drop for Node {
    fn drop(&mut self) {
        let mut parent = self.parent.take();
        while let Some(node) = parent {
            match Rc::try_unwrap(node) {
                Ok(mut inner) => parent = inner.parent.take(),
                Err(_) => break,
            }
        }
    }
}

fn sorted_boxes(board: &Board) -> Box<[u16]> {
    let mut boxes = board.box_positions_clone();
    boxes.sort_unstable();
    boxes.into_boxed_slice()
}

/// Visited-set key: two positions are equal when they have the same boxes
/// and the same player square.
struct VisitedKey(Rc<Node>);

impl Hash for VisitedKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.boxes.hash(state);
        self.0.player_position.hash(state);
    }
}

impl PartialEq for VisitedKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.player_position == other.0.player_position && self.0.boxes == other.0.boxes
    }
}

impl Eq for VisitedKey {}

impl MovesEqualsPushesSolver {
    pub fn new(cancellation: Cancellation) -> Self {
        MovesEqualsPushesSolver {
            cancellation,
            positions_count: 0,
        }
    }

    /// Number of board positions generated by the last `solve` call.
    pub fn positions_count(&self) -> usize {
        self.positions_count
    }

    /// Search for a moves-equals-pushes solution. The caller's board is not
    /// modified; the search works on an internal clone.
    pub fn solve(
        &mut self,
        start: &Board,
        progress: &dyn ProgressSink,
    ) -> Result<Solution, SolveError> {
        self.positions_count = 0;

        let mut board = start.clone();
        let mut open_queue = VecDeque::new();
        let mut visited = AHashSet::new();

        let root = Node::root(&board);
        visited.insert(VisitedKey(root.clone()));
        open_queue.push_back(root);
        self.positions_count += 1;

        let solution_node =
            self.forward_search(&mut board, &mut open_queue, &mut visited, progress);

        match &solution_node {
            Ok(_) => progress.publish("solved"),
            Err(SolveError::NoSolution) => progress.publish("no solution found"),
            Err(_) => {}
        }
        let solution_node = solution_node?;

        // Collect the pushes of the solution, root-first.
        let mut pushes = Vec::new();
        let mut node = Some(solution_node);
        while let Some(current) = node {
            if current.parent.is_some() && current.pushed_box_position.is_some() {
                pushes.push(current.clone());
            }
            node = current.parent.clone();
        }
        pushes.reverse();

        // Replay the pushes on a fresh board to recover box numbers, feeding
        // the move history.
        let mut history = MoveHistory::new();
        let mut replay_board = start.clone();
        for push in &pushes {
            let from = push.player_position as usize;
            let to = push.pushed_box_position.expect("push node without a box") as usize;
            let direction = push.push_direction.expect("push node without a direction");
            let box_no = replay_board
                .box_no_at(from)
                .expect("pushed box missing during solution replay");
            history.add_movement(direction, box_no);
            replay_board.push_box(from, to);
        }

        Ok(Solution::new(history.to_lurd(start), "moves=pushes solver"))
    }

    fn forward_search(
        &mut self,
        board: &mut Board,
        open_queue: &mut VecDeque<Rc<Node>>,
        visited: &mut AHashSet<VisitedKey>,
        progress: &dyn ProgressSink,
    ) -> Result<Rc<Node>, SolveError> {
        while let Some(current) = open_queue.pop_front() {
            if self.cancellation.is_cancelled() {
                return Err(SolveError::Cancelled);
            }

            board.set_box_positions(&current.boxes);
            board.player_position = current.player_position as usize;

            for direction in ALL_DIRECTIONS {
                let Some(new_player_position) =
                    board.offset_position(current.player_position as usize, direction)
                else {
                    continue;
                };
                let Some(new_box_position) = board.offset_position(new_player_position, direction)
                else {
                    continue;
                };

                if !board.is_box(new_player_position) || !board.is_accessible_box(new_box_position)
                {
                    continue;
                }

                board.push_box(new_player_position, new_box_position);
                board.player_position = new_player_position;

                let new_node = Node::pushed(board, new_box_position, direction, &current);

                if deadlocks::is_freeze_deadlock(board, new_box_position) {
                    board.push_box_undo(new_box_position, new_player_position);
                    continue;
                }

                let is_solved =
                    board.is_box_on_goal(new_box_position) && board.every_box_on_goal();

                board.push_box_undo(new_box_position, new_player_position);

                if is_solved {
                    return Ok(new_node);
                }

                self.positions_count += 1;

                if self.positions_count & 511 == 0 {
                    if is_memory_low() {
                        return Err(SolveError::OutOfMemory);
                    }
                    progress.publish(&format!(
                        "positions: {}, search depth: {}",
                        self.positions_count, current.push_count
                    ));
                }

                if visited.insert(VisitedKey(new_node.clone())) {
                    open_queue.push_back(new_node);
                }
            }
        }

        Err(SolveError::NoSolution)
    }
}
