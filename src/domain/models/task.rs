//! Task domain model.
//!
//! Tasks are the day-numbered units of work inside a move. Each task can
//! depend on at most one earlier task, so a move's tasks form a forest of
//! dependency chains.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};

/// How critical a task is to the move's forward progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Critical-path work; a miss threatens dependents.
    Pillar,
    /// Non-critical content that supports a pillar.
    Cluster,
    /// Non-critical housekeeping.
    Support,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pillar => "pillar",
            Self::Cluster => "cluster",
            Self::Support => "support",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pillar" => Some(Self::Pillar),
            "cluster" => Some(Self::Cluster),
            "support" => Some(Self::Support),
            _ => None,
        }
    }

    /// Whether a miss on this kind of task is compressed rather than dropped.
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::Pillar)
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a task within a move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Planned and not yet done
    #[default]
    Scheduled,
    /// Done by the user
    Completed,
    /// Past due and not done
    Overdue,
    /// Dropped permanently after a miss
    Abandoned,
    /// Folded into a merged task; kept for audit only
    Compressed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Completed => "completed",
            Self::Overdue => "overdue",
            Self::Abandoned => "abandoned",
            Self::Compressed => "compressed",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "scheduled" => Some(Self::Scheduled),
            "completed" | "complete" => Some(Self::Completed),
            "overdue" => Some(Self::Overdue),
            "abandoned" => Some(Self::Abandoned),
            "compressed" => Some(Self::Compressed),
            _ => None,
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Abandoned | Self::Compressed)
    }

    /// Still waiting on a decision: either not yet due or missed but unresolved.
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::Scheduled | Self::Overdue)
    }

    /// Counts against the day when tallying consecutive failures.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Overdue | Self::Abandoned)
    }

    /// Valid transitions from this status.
    pub fn valid_transitions(&self) -> Vec<TaskStatus> {
        match self {
            // A not-yet-due task can be folded into a merge with a missed upstream.
            Self::Scheduled => vec![Self::Completed, Self::Overdue, Self::Compressed],
            Self::Overdue => vec![Self::Compressed, Self::Abandoned],
            Self::Completed | Self::Abandoned | Self::Compressed => vec![],
        }
    }

    pub fn can_transition_to(&self, new_status: Self) -> bool {
        self.valid_transitions().contains(&new_status)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single day-numbered unit of work inside a move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: Uuid,
    /// Human-readable title
    pub title: String,
    /// Detailed description
    #[serde(default)]
    pub description: String,
    /// Criticality
    pub kind: TaskKind,
    /// 1-indexed day within the move
    pub day_number: u32,
    /// Current status
    #[serde(default)]
    pub status: TaskStatus,
    /// The single upstream task this one builds on
    #[serde(default)]
    pub dependency_id: Option<Uuid>,
    /// Calendar date the task is due
    pub due_date: NaiveDate,
    /// When the user finished it
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Tag naming the artifact this task yields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub produces: Option<String>,
    /// Tag naming the artifact this task consumes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires: Option<String>,
    /// Originals replaced by this task when it is the product of a merge
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merged_from: Vec<Uuid>,
}

impl Task {
    /// Create a scheduled task. The due date is filled in when the task is
    /// added to a move.
    pub fn new(title: impl Into<String>, kind: TaskKind, day_number: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: String::new(),
            kind,
            day_number,
            status: TaskStatus::default(),
            dependency_id: None,
            due_date: NaiveDate::MIN,
            completed_at: None,
            produces: None,
            requires: None,
            merged_from: Vec::new(),
        }
    }

    /// Set description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the upstream dependency.
    pub fn with_dependency(mut self, task_id: Uuid) -> Self {
        self.dependency_id = Some(task_id);
        self
    }

    /// Tag the artifact this task produces.
    pub fn producing(mut self, tag: impl Into<String>) -> Self {
        self.produces = Some(tag.into());
        self
    }

    /// Tag the artifact this task requires.
    pub fn requiring(mut self, tag: impl Into<String>) -> Self {
        self.requires = Some(tag.into());
        self
    }

    /// Check if can transition to given status.
    pub fn can_transition_to(&self, new_status: TaskStatus) -> bool {
        self.status.can_transition_to(new_status)
    }

    /// Transition to new status.
    pub fn transition_to(&mut self, new_status: TaskStatus) -> DomainResult<()> {
        if !self.can_transition_to(new_status) {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: new_status.to_string(),
                reason: format!("task {} does not allow this transition", self.id),
            });
        }
        self.status = new_status;
        Ok(())
    }

    /// Mark the task done at the given instant.
    pub fn complete(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        self.transition_to(TaskStatus::Completed)?;
        self.completed_at = Some(at);
        Ok(())
    }

    /// Check if task is terminal.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Past its due date and not completed as of `as_of`.
    pub fn is_overdue_as_of(&self, as_of: NaiveDate) -> bool {
        self.due_date < as_of && self.status != TaskStatus::Completed
    }

    /// Ordering key used for deterministic processing.
    pub fn sort_key(&self) -> (u32, Uuid) {
        (self.day_number, self.id)
    }

    /// Validate task fields that do not depend on the enclosing move.
    pub fn validate(&self) -> DomainResult<()> {
        if self.title.trim().is_empty() {
            return Err(DomainError::ValidationFailed(
                "Task title cannot be empty".to_string(),
            ));
        }
        if self.day_number == 0 {
            return Err(DomainError::ValidationFailed(format!(
                "Task {} day_number is 1-indexed",
                self.id
            )));
        }
        if self.dependency_id == Some(self.id) {
            return Err(DomainError::ValidationFailed(
                "Task cannot depend on itself".to_string(),
            ));
        }
        Ok(())
    }
}
