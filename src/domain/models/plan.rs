//! Move domain model.
//!
//! A move is a time-boxed execution plan: a fixed number of days, a start
//! date, and the tasks scheduled across those days. The type is called
//! `Plan` because `move` is a reserved word; it serializes as a move.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::compression::{CompressionLog, CompressionRecord};
use super::task::{Task, TaskStatus};
use crate::domain::errors::{DomainError, DomainResult};

/// Lifecycle of a move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveStatus {
    /// Running; accepts task changes
    #[default]
    Active,
    /// Terminated after repeated failed days
    Aborted,
    /// Every task resolved and the duration has elapsed
    Completed,
}

impl MoveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Aborted => "aborted",
            Self::Completed => "completed",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(Self::Active),
            "aborted" => Some(Self::Aborted),
            "completed" | "complete" => Some(Self::Completed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }
}

impl fmt::Display for MoveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A time-boxed plan of dependency-linked tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Unique identifier
    pub id: Uuid,
    /// Display name, used in user-facing messages
    pub name: String,
    /// Number of days the move spans
    pub duration_days: u32,
    /// Calendar date of day 1
    pub start_date: NaiveDate,
    /// Current lifecycle status
    #[serde(default)]
    pub status: MoveStatus,
    /// Tasks in insertion order
    #[serde(default)]
    pub tasks: Vec<Task>,
    /// Decisions taken about this move
    #[serde(default)]
    pub compression_log: CompressionLog,
}

impl Plan {
    pub fn new(name: impl Into<String>, start_date: NaiveDate, duration_days: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            duration_days,
            start_date,
            status: MoveStatus::default(),
            tasks: Vec::new(),
            compression_log: CompressionLog::new(),
        }
    }

    /// Calendar date for a 1-indexed plan day.
    pub fn due_date_for(&self, day_number: u32) -> NaiveDate {
        let offset = u64::from(day_number.saturating_sub(1));
        self.start_date
            .checked_add_days(Days::new(offset))
            .unwrap_or(NaiveDate::MAX)
    }

    /// The last plan day whose tasks are due strictly before `as_of`.
    ///
    /// A nightly run on `as_of` evaluates this day. Zero means nothing is
    /// due yet.
    pub fn current_day(&self, as_of: NaiveDate) -> u32 {
        let elapsed = (as_of - self.start_date).num_days();
        u32::try_from(elapsed.max(0)).unwrap_or(u32::MAX)
    }

    /// Add a task, deriving its due date from its day number.
    pub fn add_task(&mut self, mut task: Task) -> DomainResult<Uuid> {
        self.ensure_active()?;
        task.validate()?;
        if task.day_number > self.duration_days {
            return Err(DomainError::ValidationFailed(format!(
                "Task {} is on day {}, but move '{}' lasts {} days",
                task.id, task.day_number, self.name, self.duration_days
            )));
        }
        if self.task(task.id).is_some() {
            return Err(DomainError::ValidationFailed(format!(
                "Task {} already exists in move {}",
                task.id, self.id
            )));
        }
        task.due_date = self.due_date_for(task.day_number);
        let id = task.id;
        self.tasks.push(task);
        Ok(id)
    }

    /// Builder form of [`Plan::add_task`].
    pub fn with_task(mut self, task: Task) -> DomainResult<Self> {
        self.add_task(task)?;
        Ok(self)
    }

    pub fn task(&self, task_id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn task_mut(&mut self, task_id: Uuid) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == task_id)
    }

    /// Look up a task, failing with move/task context.
    pub fn require_task(&self, task_id: Uuid) -> DomainResult<&Task> {
        let move_id = self.id;
        self.task(task_id)
            .ok_or(DomainError::TaskNotFound { move_id, task_id })
    }

    pub fn tasks_on_day(&self, day_number: u32) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(move |t| t.day_number == day_number)
    }

    /// Tasks that list `task_id` as their upstream dependency.
    pub fn dependents_of(&self, task_id: Uuid) -> impl Iterator<Item = &Task> {
        self.tasks
            .iter()
            .filter(move |t| t.dependency_id == Some(task_id))
    }

    /// Task ids ordered by (day, id), the order decisions are taken in.
    pub fn ordered_task_ids(&self) -> Vec<Uuid> {
        let mut keys: Vec<_> = self.tasks.iter().map(Task::sort_key).collect();
        keys.sort_unstable();
        keys.into_iter().map(|(_, id)| id).collect()
    }

    pub fn is_active(&self) -> bool {
        self.status == MoveStatus::Active
    }

    /// Reject mutation of a move that has reached a terminal status.
    pub fn ensure_active(&self) -> DomainResult<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(DomainError::MoveNotActive {
                move_id: self.id,
                status: self.status,
            })
        }
    }

    /// Move a task to a new status, enforcing both state machines.
    pub fn transition_task(&mut self, task_id: Uuid, status: TaskStatus) -> DomainResult<()> {
        self.ensure_active()?;
        let move_id = self.id;
        self.task_mut(task_id)
            .ok_or(DomainError::TaskNotFound { move_id, task_id })?
            .transition_to(status)
    }

    /// Record that the user finished a task.
    pub fn complete_task(&mut self, task_id: Uuid, at: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_active()?;
        let move_id = self.id;
        self.task_mut(task_id)
            .ok_or(DomainError::TaskNotFound { move_id, task_id })?
            .complete(at)
    }

    /// Append to the audit log. Returns whether a new record was stored.
    pub fn record(&mut self, record: CompressionRecord) -> bool {
        self.compression_log.append(record)
    }

    /// Terminate the move. Only an active move can be aborted.
    pub fn abort(&mut self) -> DomainResult<()> {
        self.ensure_active()?;
        self.status = MoveStatus::Aborted;
        Ok(())
    }

    /// Close the move once its last day has passed and nothing is pending.
    ///
    /// Returns whether the status changed.
    pub fn complete_if_finished(&mut self, as_of: NaiveDate) -> bool {
        if !self.is_active() || self.current_day(as_of) < self.duration_days {
            return false;
        }
        if self.tasks.iter().all(Task::is_terminal) {
            self.status = MoveStatus::Completed;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::task::TaskKind;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_due_dates_follow_day_numbers() {
        let mut plan = Plan::new("Launch", date(2024, 1, 30), 7);
        let id = plan.add_task(Task::new("Day three", TaskKind::Pillar, 3)).unwrap();
        assert_eq!(plan.task(id).unwrap().due_date, date(2024, 2, 1));
        assert_eq!(plan.due_date_for(1), date(2024, 1, 30));
    }

    #[test]
    fn test_current_day() {
        let plan = Plan::new("Launch", date(2024, 1, 1), 7);
        assert_eq!(plan.current_day(date(2023, 12, 30)), 0);
        assert_eq!(plan.current_day(date(2024, 1, 1)), 0);
        assert_eq!(plan.current_day(date(2024, 1, 4)), 3);
    }

    #[test]
    fn test_add_task_outside_duration_rejected() {
        let mut plan = Plan::new("Short", date(2024, 1, 1), 2);
        let result = plan.add_task(Task::new("Too late", TaskKind::Support, 3));
        assert!(matches!(result, Err(DomainError::ValidationFailed(_))));
        assert!(plan.tasks.is_empty());
    }

    #[test]
    fn test_aborted_move_rejects_mutation() {
        let mut plan = Plan::new("Launch", date(2024, 1, 1), 3);
        let id = plan.add_task(Task::new("Task", TaskKind::Cluster, 1)).unwrap();
        plan.abort().unwrap();

        let err = plan.transition_task(id, TaskStatus::Overdue).unwrap_err();
        assert!(matches!(err, DomainError::MoveNotActive { .. }));
        assert!(plan.complete_task(id, Utc::now()).is_err());
        assert!(plan.abort().is_err());
        assert_eq!(plan.task(id).unwrap().status, TaskStatus::Scheduled);
    }

    #[test]
    fn test_ordered_task_ids_by_day_then_id() {
        let mut plan = Plan::new("Launch", date(2024, 1, 1), 5);
        let late = plan.add_task(Task::new("Late", TaskKind::Pillar, 4)).unwrap();
        let early = plan.add_task(Task::new("Early", TaskKind::Pillar, 1)).unwrap();
        let a = plan.add_task(Task::new("Mid a", TaskKind::Support, 2)).unwrap();
        let b = plan.add_task(Task::new("Mid b", TaskKind::Support, 2)).unwrap();

        let (first_mid, second_mid) = if a < b { (a, b) } else { (b, a) };
        assert_eq!(plan.ordered_task_ids(), vec![early, first_mid, second_mid, late]);
    }

    #[test]
    fn test_complete_if_finished() {
        let mut plan = Plan::new("Tiny", date(2024, 1, 1), 1);
        let id = plan.add_task(Task::new("Only", TaskKind::Pillar, 1)).unwrap();

        assert!(!plan.complete_if_finished(date(2024, 1, 2)));
        plan.complete_task(id, Utc::now()).unwrap();
        assert!(!plan.complete_if_finished(date(2024, 1, 1)));
        assert!(plan.complete_if_finished(date(2024, 1, 2)));
        assert_eq!(plan.status, MoveStatus::Completed);
    }
}
