//! Drops missed non-critical tasks.
//!
//! Cluster and support work is never carried forward. Rolling it onto later
//! days piles up obligations the user has already fallen behind on, which
//! erodes adherence faster than losing the task does.

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    CompressionAction, CompressionActionKind, CompressionRecord, Plan, TaskStatus,
};

/// Rationale stored with every abandonment record.
pub const ABANDON_RATIONALE: &str =
    "missed, too late to recover — dropped to prevent Debt Fatigue.";

#[derive(Debug, Clone, Copy, Default)]
pub struct AbandonmentEngine;

impl AbandonmentEngine {
    pub fn new() -> Self {
        Self
    }

    /// Abandon a missed cluster/support task.
    ///
    /// Pillar tasks are refused and left untouched. Calling this again for a
    /// task that is already abandoned changes nothing; the returned action is
    /// `None` when no new record was logged.
    pub fn abandon(
        &self,
        plan: &mut Plan,
        task_id: Uuid,
        current_day: u32,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<CompressionAction>> {
        plan.ensure_active()?;
        let task = plan.require_task(task_id)?;
        if task.kind.is_critical() {
            return Err(DomainError::NotAbandonable(task_id));
        }
        let status = task.status;

        match status {
            TaskStatus::Abandoned => {
                debug!(move_id = %plan.id, task_id = %task_id, "task already abandoned");
                return Ok(None);
            }
            TaskStatus::Scheduled => {
                plan.transition_task(task_id, TaskStatus::Overdue)?;
                plan.transition_task(task_id, TaskStatus::Abandoned)?;
            }
            _ => plan.transition_task(task_id, TaskStatus::Abandoned)?,
        }

        let record = CompressionRecord::new(
            plan.id,
            vec![task_id],
            CompressionActionKind::Abandoned,
            ABANDON_RATIONALE,
            now,
        )
        .on_night(current_day);
        let action = CompressionAction::from_record(&record, None);
        if !plan.record(record) {
            return Ok(None);
        }

        info!(move_id = %plan.id, task_id = %task_id, "abandoned missed task");
        Ok(Some(action))
    }
}
