use crate::board::{Board, ALL_DIRECTIONS};
use crate::heuristic::{self, LowerBound};
use crate::history::MoveHistory;
use crate::positions::{NodeRef, PositionNode};
use crate::queue::OpenQueue;
use crate::solver::{is_memory_low, Cancellation, ProgressSink, SolveError, Solution};
use crate::transposition::TranspositionTable;
use log::warn;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

/// Solver for b-type (zero-space) puzzles, where the boxes and walls form a
/// spanning tree on the board. Every legal step pushes a box exactly two
/// squares along its free axis, the player can always walk to any free
/// square, and each box has a unique correct goal.
///
/// Two searches run concurrently, forward from the start position and
/// backward from the solved position, sharing one transposition table. The
/// searches meet when either inserts a position the other direction already
/// stored.
///
/// Example level:
/// ```text
/// #####################
/// #@                  #
/// # #*#*#*#$#$#.#*#.# #
/// #   . *   *   $ . $ #
/// # #*#$#*# #*#$#.# # #
/// # *   $ . .   $ * * #
/// #                   #
/// #####################
/// ```
pub struct BTypeSolver {
    cancellation: Cancellation,
    positions_count: usize,
}

struct Search<'a> {
    transposition_table: TranspositionTable,
    open_queue_forward: OpenQueue<NodeRef>,
    open_queue_backward: OpenQueue<NodeRef>,
    positions_count: AtomicUsize,
    solver_running: AtomicBool,
    out_of_memory: AtomicBool,
    // Workers that saw their open queue empty; all idle at once means the
    // search space is exhausted.
    idle_workers: AtomicUsize,
    worker_count: usize,
    solution: Mutex<Option<Vec<NodeRef>>>,
    cancellation: Cancellation,
    progress: &'a dyn ProgressSink,
}

impl BTypeSolver {
    pub fn new(cancellation: Cancellation) -> Self {
        BTypeSolver {
            cancellation,
            positions_count: 0,
        }
    }

    /// Number of board positions generated by the last `solve` call.
    pub fn positions_count(&self) -> usize {
        self.positions_count
    }

    /// Search for a solution. The caller's board is not modified; every
    /// worker operates on its own clone.
    pub fn solve(
        &mut self,
        start: &Board,
        progress: &dyn ProgressSink,
    ) -> Result<Solution, SolveError> {
        self.positions_count = 0;

        let lower_bound = match heuristic::pushes_lower_bound(start) {
            LowerBound::Deadlock => return Err(SolveError::DeadlockAtStart),
            LowerBound::Pushes(pushes) => pushes,
        };
        if lower_bound == 0 {
            // Start position is already solved.
            progress.publish("solved");
            return Ok(Solution::new(String::new(), "b-type solver"));
        }

        let worker_count = worker_count();
        let search = Search {
            transposition_table: TranspositionTable::new(),
            open_queue_forward: OpenQueue::new(start.box_count()),
            open_queue_backward: OpenQueue::new(start.box_count()),
            positions_count: AtomicUsize::new(0),
            solver_running: AtomicBool::new(true),
            out_of_memory: AtomicBool::new(false),
            idle_workers: AtomicUsize::new(0),
            worker_count,
            solution: Mutex::new(None),
            cancellation: self.cancellation.clone(),
            progress,
        };

        let backward_board = create_backward_board(start);

        let forward_root = PositionNode::full(start.box_positions_clone(), false, None);
        search.transposition_table.put_if_absent(&forward_root);
        search.add_to_open_queue(start, &forward_root);
        search.positions_count.fetch_add(1, Ordering::Relaxed);

        let backward_root = PositionNode::full(backward_board.box_positions_clone(), true, None);
        search.transposition_table.put_if_absent(&backward_root);
        search.add_to_open_queue(&backward_board, &backward_root);
        search.positions_count.fetch_add(1, Ordering::Relaxed);

        thread::scope(|scope| {
            let search = &search;
            for _ in 0..worker_count / 2 {
                let forward_board = start.clone();
                scope.spawn(move || search.worker(forward_board, false));

                let board = backward_board.clone();
                scope.spawn(move || search.worker(board, true));
            }
        });

        self.positions_count = search.positions_count.load(Ordering::Relaxed);

        let solution_path = search
            .solution
            .lock()
            .expect("solution mutex poisoned")
            .take();

        let Some(path) = solution_path else {
            if search.out_of_memory.load(Ordering::Acquire) {
                return Err(SolveError::OutOfMemory);
            }
            if self.cancellation.is_cancelled() {
                return Err(SolveError::Cancelled);
            }
            progress.publish("no solution found");
            return Err(SolveError::NoSolution);
        };

        progress.publish(&format!("solved, positions: {}", self.positions_count));

        Ok(Solution::new(
            lurd_from_path(start, &path),
            "b-type solver",
        ))
    }
}

fn worker_count() -> usize {
    let threads = thread::available_parallelism()
        .map(|count| count.get())
        .unwrap_or(2);
    (threads / 2).max(1) * 2
}

/// Mirror board for the backward search: boxes start on the goal squares and
/// the goals sit where the boxes started.
fn create_backward_board(board: &Board) -> Board {
    let mut backward_board = board.clone();

    let box_positions = board.box_positions_clone();
    let goal_positions = board.goal_positions().to_vec();

    backward_board.remove_all_boxes();
    for &goal in &goal_positions {
        backward_board.remove_goal(goal as usize);
    }

    for &goal in &goal_positions {
        backward_board.add_box(goal);
    }
    for &box_position in &box_positions {
        backward_board.set_goal(box_position as usize);
    }

    backward_board
}

impl<'a> Search<'a> {
    /// Generates successor configurations by performing all legal pushes,
    /// storing each in the transposition table and dropping the ones already
    /// reached from the same direction.
    ///
    /// Forward and backward search run the same code: there are no deadlocks
    /// beyond corrals and the player position is irrelevant, so the searches
    /// only differ in their start position (initial vs. solved board).
    fn worker(&self, mut board: Board, backward: bool) {
        struct StopOnPanic<'s>(&'s AtomicBool);
        impl Drop for StopOnPanic<'_> {
            fn drop(&mut self) {
                if thread::panicking() {
                    self.0.store(false, Ordering::Release);
                }
            }
        }
        let _guard = StopOnPanic(&self.solver_running);

        let mut box_positions = vec![0u16; board.box_count()];

        while self.solver_running.load(Ordering::Acquire) && !self.cancellation.is_cancelled() {
            let Some(current) = self.open_queue(backward).pop() else {
                if self.check_solver_ended() {
                    break;
                }
                continue;
            };

            current.fill_boxes(&mut box_positions);
            board.set_box_positions(&box_positions);

            for box_no in 0..board.box_count() {
                if !self.solver_running.load(Ordering::Acquire) {
                    break;
                }
                let box_position = board.box_position(box_no);

                for direction in ALL_DIRECTIONS {
                    let Some(one_step) = board.offset_position(box_position, direction) else {
                        continue;
                    };
                    let Some(new_box_position) = board.offset_position(one_step, direction)
                    else {
                        continue;
                    };
                    if !board.is_accessible_box(one_step)
                        || !board.is_accessible_box(new_box_position)
                    {
                        continue;
                    }

                    board.push_box(box_position, new_box_position);
                    board.player_position = one_step; // for the corral check

                    if has_corral(&mut board, new_box_position) {
                        board.push_box_undo(new_box_position, box_position);
                        continue;
                    }

                    let new_node = PositionNode::delta(
                        box_position as u16,
                        new_box_position as u16,
                        backward,
                        &current,
                    );

                    self.publish_progress();

                    match self.transposition_table.put_if_absent(&new_node) {
                        None => {
                            // First time this board position has been reached.
                            self.add_to_open_queue(&board, &new_node);
                        }
                        Some(stored) => {
                            if stored.is_backward() != new_node.is_backward() {
                                // The other search direction already reached
                                // this position: the paths meet here.
                                self.set_solution(&new_node, &stored);
                                self.solver_running.store(false, Ordering::Release);
                                return;
                            }
                        }
                    }

                    board.push_box_undo(new_box_position, box_position);
                }
            }
        }
    }

    fn open_queue(&self, backward: bool) -> &OpenQueue<NodeRef> {
        if backward {
            &self.open_queue_backward
        } else {
            &self.open_queue_forward
        }
    }

    /// Enqueue with bucket index = boxes on their correct goals, so dequeues
    /// prefer positions closest to done. `board` must hold the node's boxes.
    fn add_to_open_queue(&self, board: &Board, node: &NodeRef) {
        let boxes_on_goal_count = heuristic::boxes_on_correct_goal(board);
        if boxes_on_goal_count == 0 {
            // Canonical b-type positions always have at least one box on its
            // correct goal; clamp instead of underflowing the bucket index.
            warn!("position with no box on a correct goal; using bucket 0");
        }
        let bucket = boxes_on_goal_count.saturating_sub(1);
        self.open_queue(node.is_backward()).push(bucket, node.clone());
    }

    /// Returns true if ALL workers saw an empty open queue, meaning no worker
    /// is processing board positions anymore.
    fn check_solver_ended(&self) -> bool {
        let idle_count = self.idle_workers.fetch_add(1, Ordering::AcqRel) + 1;
        if idle_count == self.worker_count {
            self.solver_running.store(false, Ordering::Release);
            return true;
        }

        thread::sleep(Duration::from_millis(20));

        // Re-check after the pause: another worker may have refilled the
        // queue and gone back to work in the meantime.
        if self.idle_workers.load(Ordering::Acquire) == self.worker_count {
            self.solver_running.store(false, Ordering::Release);
            return true;
        }

        self.idle_workers.fetch_sub(1, Ordering::AcqRel);
        false
    }

    fn publish_progress(&self) {
        let count = self.positions_count.fetch_add(1, Ordering::Relaxed) + 1;
        if count & 65535 == 0 {
            self.progress.publish(&format!("positions: {}", count));

            if is_memory_low() {
                self.out_of_memory.store(true, Ordering::Release);
                self.solver_running.store(false, Ordering::Release);
            }
        }
    }

    /// Assemble the solution path from the two meeting positions and store
    /// it. If a previously recorded solution is shorter, it is kept.
    fn set_solution(&self, position_a: &NodeRef, position_b: &NodeRef) {
        let (forward, backward) = if position_a.is_backward() {
            (position_b, position_a)
        } else {
            (position_a, position_b)
        };

        // Forward chain, root-first; the forward root itself is the start
        // position and carries no push.
        let mut path = Vec::new();
        let mut node = forward.clone();
        while let Some(parent) = node.parent().cloned() {
            path.push(node);
            node = parent;
        }
        path.reverse();

        // Backward chain in traversal order. Its first position equals the
        // last forward position, hence it is skipped.
        let mut node = backward.parent().cloned();
        while let Some(current) = node {
            node = current.parent().cloned();
            path.push(current);
        }

        let mut stored = self.solution.lock().expect("solution mutex poisoned");
        match &*stored {
            Some(existing) if existing.len() < path.len() => {} // shorter solution wins
            _ => *stored = Some(path),
        }
    }
}

/// Returns whether pushing a box to `new_box_position` created a corral: a
/// free neighbor of the box that the player can no longer reach. For this
/// puzzle type a corral is always a deadlock.
fn has_corral(board: &mut Board, new_box_position: usize) -> bool {
    board.update_player_reachable();

    for direction in ALL_DIRECTIONS {
        if let Some(neighbor) = board.offset_position(new_box_position, direction) {
            if board.is_accessible(neighbor) && !board.is_player_reachable(neighbor) {
                return true;
            }
        }
    }

    false
}

/// Replays the solution path against the start board, recording two push
/// movements per step (this level type always pushes two squares), and
/// renders the complete LURD.
fn lurd_from_path(start: &Board, path: &[NodeRef]) -> String {
    let mut history = MoveHistory::new();
    let mut board = start.clone();
    let mut next_boxes = vec![0u16; start.box_count()];

    for node in path {
        let current_boxes = board.box_positions_clone();
        node.fill_boxes(&mut next_boxes);

        let old_position = current_boxes
            .iter()
            .copied()
            .find(|position| !next_boxes.contains(position))
            .expect("no box moved between adjacent solution positions")
            as usize;
        let new_position = next_boxes
            .iter()
            .copied()
            .find(|position| !current_boxes.contains(position))
            .expect("no box moved between adjacent solution positions")
            as usize;

        let direction = ALL_DIRECTIONS
            .into_iter()
            .find(|&direction| {
                new_position as isize - old_position as isize == 2 * board.offset(direction)
            })
            .expect("solution step is not a double push");

        board.push_box(old_position, new_position);
        let box_no = board
            .box_no_at(new_position)
            .expect("pushed box missing during solution replay");

        history.add_movement(direction, box_no);
        history.add_movement(direction, box_no); // this level type always pushes twice
    }

    history.to_lurd(start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::replay_lurd;
    use crate::solver::NullProgress;

    fn solve(input: &str) -> Result<Solution, SolveError> {
        let board = Board::from_text(input).unwrap();
        BTypeSolver::new(Cancellation::new()).solve(&board, &NullProgress)
    }

    #[test]
    fn test_single_double_push() {
        let input = "######\n\
                     #@$ .#\n\
                     ######";
        let solution = solve(input).unwrap();
        assert_eq!(solution.lurd, "RR");

        let mut board = Board::from_text(input).unwrap();
        replay_lurd(&mut board, &solution.lurd).unwrap();
        assert!(board.every_box_on_goal());
    }

    #[test]
    fn test_already_solved_level_returns_empty_lurd() {
        let input = "####\n\
                     #@*#\n\
                     ####";
        let board = Board::from_text(input).unwrap();
        let before = board.clone();

        let solution = BTypeSolver::new(Cancellation::new())
            .solve(&board, &NullProgress)
            .unwrap();

        assert_eq!(solution.lurd, "");
        assert_eq!(board, before);
    }

    #[test]
    fn test_deadlocked_start_position() {
        let input = "####\n\
                     #$ #\n\
                     # .#\n\
                     #@##";
        assert_eq!(solve(input), Err(SolveError::DeadlockAtStart));
    }

    #[test]
    fn test_no_double_push_available() {
        // The box can only move one square before hitting the wall, so no
        // legal two-square step exists and the search exhausts.
        let input = "#####\n\
                     #@$ #\n\
                     # . #\n\
                     #####";
        assert_eq!(solve(input), Err(SolveError::NoSolution));
    }

    #[test]
    fn test_two_boxes_solvable() {
        let input = "########\n\
                     #@$ .  #\n\
                     # $ .  #\n\
                     ########";
        let solution = solve(input).unwrap();

        let mut board = Board::from_text(input).unwrap();
        replay_lurd(&mut board, &solution.lurd).unwrap();
        assert!(board.every_box_on_goal());

        // Every step of this level type is a double push.
        assert!(solution.push_count() >= 4);
        assert_eq!(solution.push_count() % 2, 0);
    }

    #[test]
    fn test_cancellation_before_start() {
        let input = "######\n\
                     #@$ .#\n\
                     ######";
        let board = Board::from_text(input).unwrap();
        let cancellation = Cancellation::new();
        cancellation.cancel();

        let result = BTypeSolver::new(cancellation).solve(&board, &NullProgress);
        assert_eq!(result, Err(SolveError::Cancelled));
    }

    #[test]
    fn test_board_left_untouched_after_search() {
        let input = "######\n\
                     #@$ .#\n\
                     ######";
        let board = Board::from_text(input).unwrap();
        let before = board.clone();

        BTypeSolver::new(Cancellation::new())
            .solve(&board, &NullProgress)
            .unwrap();

        assert_eq!(board, before);
        assert_eq!(board.box_positions_clone(), before.box_positions_clone());
    }

    #[test]
    fn test_backward_board_swaps_boxes_and_goals() {
        let input = "######\n\
                     #@$ .#\n\
                     ######";
        let board = Board::from_text(input).unwrap();
        let backward_board = create_backward_board(&board);

        assert!(backward_board.is_box(10));
        assert!(!backward_board.is_box(8));
        assert!(backward_board.is_goal(8));
        assert!(!backward_board.is_goal(10));
        assert!(!backward_board.every_box_on_goal());
    }
}
