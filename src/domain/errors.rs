//! Domain errors for the taskpress protocol.

use thiserror::Error;
use uuid::Uuid;

use super::models::plan::MoveStatus;

/// Format a cycle path as a human-readable string: `A -> B -> C -> A`.
fn format_cycle_path(path: &[Uuid]) -> String {
    path.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Structural problems in a move aggregate, detected when it is loaded.
///
/// These are fatal for the affected move's run only; a batch keeps going
/// for every other move.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("Task dependency cycle detected: {}", format_cycle_path(.0))]
    DependencyCycle(Vec<Uuid>),

    #[error("Task {task_id} depends on unknown task {dependency_id}")]
    OrphanedDependency { task_id: Uuid, dependency_id: Uuid },

    #[error(
        "Task {task_id} (day {day}) depends on task {dependency_id} scheduled for day {dependency_day}"
    )]
    DependencyNotEarlier {
        task_id: Uuid,
        day: u32,
        dependency_id: Uuid,
        dependency_day: u32,
    },

    #[error("Task {task_id} is on day {day}, outside the move duration 1..={duration_days}")]
    DayOutOfRange {
        task_id: Uuid,
        day: u32,
        duration_days: u32,
    },

    #[error("Task {task_id} is due {actual} but day {day} falls on {expected}")]
    DueDateMismatch {
        task_id: Uuid,
        day: u32,
        expected: chrono::NaiveDate,
        actual: chrono::NaiveDate,
    },

    #[error("Duplicate task id: {0}")]
    DuplicateTask(Uuid),

    #[error("Move duration must be at least one day")]
    ZeroDuration,
}

/// Domain-level errors that can occur while running the protocol.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Move not found: {0}")]
    MoveNotFound(Uuid),

    #[error("Task {task_id} not found in move {move_id}")]
    TaskNotFound { move_id: Uuid, task_id: Uuid },

    #[error("Move {move_id} is misconfigured: {source}")]
    Configuration {
        move_id: Uuid,
        #[source]
        source: ConfigurationError,
    },

    #[error("Move {move_id} is {status} and accepts no further changes")]
    MoveNotActive { move_id: Uuid, status: MoveStatus },

    #[error("Invalid state transition from {from} to {to}: {reason}")]
    InvalidStateTransition {
        from: String,
        to: String,
        reason: String,
    },

    #[error("Task {0} is a pillar task and cannot be abandoned")]
    NotAbandonable(Uuid),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Wrap a structural problem with the move it was found in.
    pub fn configuration(move_id: Uuid, source: ConfigurationError) -> Self {
        Self::Configuration { move_id, source }
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
