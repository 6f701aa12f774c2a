//! Consecutive failed-day tracking.

use crate::domain::models::Plan;

/// Default number of consecutive failed days that aborts a move.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

#[derive(Debug, Clone, Copy)]
pub struct FailureTracker {
    threshold: u32,
}

impl Default for FailureTracker {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_THRESHOLD)
    }
}

impl FailureTracker {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Count fully failed days walking back from `current_day`.
    ///
    /// A day fails when it has tasks and every one of them is overdue or
    /// abandoned. The walk stops at the first day that did not fail. A day
    /// with no tasks stops it too: an empty day neither extends nor resets
    /// a streak that ended before it. Days past the end of the move have no
    /// tasks, so a run after the move ends counts zero.
    pub fn count_consecutive_failures(&self, plan: &Plan, current_day: u32) -> u32 {
        let mut count = 0;
        for day in (1..=current_day).rev() {
            let mut tasks = plan.tasks_on_day(day).peekable();
            if tasks.peek().is_none() {
                break;
            }
            if !tasks.all(|t| t.status.is_failure()) {
                break;
            }
            count += 1;
        }
        count
    }

    pub fn is_threshold_reached(&self, consecutive_failures: u32) -> bool {
        consecutive_failures >= self.threshold
    }
}
