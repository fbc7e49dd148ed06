use crate::os;
use log::info;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Free-memory threshold below which a running search gives up.
pub const LOW_MEMORY_MIB: u64 = 15;

/// A solved level: the complete LURD from the initial board to the solved
/// board, plus a display name for the solution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub lurd: String,
    pub name: String,
}

impl Solution {
    pub fn new(lurd: String, name: &str) -> Self {
        Solution {
            lurd,
            name: name.to_string(),
        }
    }

    /// Number of pushes in the solution (uppercase LURD letters).
    pub fn push_count(&self) -> usize {
        self.lurd.chars().filter(|ch| ch.is_ascii_uppercase()).count()
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SolveError {
    #[error("no solution found")]
    NoSolution,
    #[error("solver cancelled")]
    Cancelled,
    #[error("out of memory (less than 15 MiB free)")]
    OutOfMemory,
    #[error("level is deadlocked in its start position")]
    DeadlockAtStart,
}

/// Cooperative cancellation flag, cloneable across threads. Solvers check it
/// between expansions, so cancellation takes effect within one expansion per
/// worker.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    flag: Arc<AtomicBool>,
}

impl Cancellation {
    pub fn new() -> Self {
        Cancellation::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Sink for human-readable solver status ("solved", position counts, search
/// depth).
pub trait ProgressSink: Sync {
    fn publish(&self, message: &str);
}

/// Routes progress messages to the log.
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn publish(&self, message: &str) {
        info!("{}", message);
    }
}

/// Discards progress messages.
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn publish(&self, _message: &str) {}
}

/// Whether free memory has fallen below the solver threshold. An unknown
/// amount of free memory counts as enough.
pub fn is_memory_low() -> bool {
    os::available_memory_mib().is_some_and(|mib| mib <= LOW_MEMORY_MIB)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_flag() {
        let cancellation = Cancellation::new();
        assert!(!cancellation.is_cancelled());

        let shared = cancellation.clone();
        shared.cancel();
        assert!(cancellation.is_cancelled());
    }

    #[test]
    fn test_push_count_counts_uppercase_only() {
        let solution = Solution::new("rrULdD".to_string(), "test");
        assert_eq!(solution.push_count(), 3);
    }

    #[test]
    fn test_solve_error_messages() {
        assert_eq!(SolveError::NoSolution.to_string(), "no solution found");
        assert!(SolveError::OutOfMemory.to_string().contains("15 MiB"));
    }
}
