//! Read-only scan for tasks past their due date.

use chrono::NaiveDate;

use crate::domain::models::{Plan, Task};

#[derive(Debug, Clone, Copy, Default)]
pub struct OverdueDetector;

impl OverdueDetector {
    pub fn new() -> Self {
        Self
    }

    /// Tasks due before `as_of` that were not completed, in (day, id) order.
    pub fn detect<'a>(&self, plan: &'a Plan, as_of: NaiveDate) -> Vec<&'a Task> {
        let mut overdue: Vec<&Task> = plan
            .tasks
            .iter()
            .filter(|t| t.is_overdue_as_of(as_of))
            .collect();
        overdue.sort_by_key(|t| t.sort_key());
        overdue
    }

    /// Overdue tasks still awaiting a decision. Tasks already compressed or
    /// abandoned by an earlier run are left out.
    pub fn actionable<'a>(&self, plan: &'a Plan, as_of: NaiveDate) -> Vec<&'a Task> {
        self.detect(plan, as_of)
            .into_iter()
            .filter(|t| t.status.is_unresolved())
            .collect()
    }
}
