//! Compression of missed critical-path tasks.
//!
//! When a pillar task is missed, its next not-yet-due dependent absorbs it:
//! both are replaced by one merged task on the dependent's day. The move
//! loses a day of slack instead of sliding every later date. A merge is only
//! made when the dependent can still run without the missed task's output
//! having existed beforehand (see [`ViabilityPolicy`]).

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    CompressionAction, CompressionActionKind, CompressionRecord, Plan, Recommendation, Task,
    TaskKind, TaskOutcome, TaskStatus,
};
use crate::services::abandonment_engine::AbandonmentEngine;
use crate::services::viability::{Viability, ViabilityPolicy};

#[derive(Debug, Clone, Default)]
pub struct CompressionEngine {
    policy: ViabilityPolicy,
    abandonment: AbandonmentEngine,
}

impl CompressionEngine {
    pub fn new(policy: ViabilityPolicy) -> Self {
        Self {
            policy,
            abandonment: AbandonmentEngine::new(),
        }
    }

    pub fn policy(&self) -> &ViabilityPolicy {
        &self.policy
    }

    /// Route a missed task by kind: pillars are compressed, everything else
    /// is abandoned.
    pub fn handle(
        &self,
        plan: &mut Plan,
        task_id: Uuid,
        current_day: u32,
        now: DateTime<Utc>,
    ) -> DomainResult<TaskOutcome> {
        let kind = plan.require_task(task_id)?.kind;
        match kind {
            TaskKind::Pillar => self.compress_critical_path(plan, task_id, current_day, now),
            TaskKind::Cluster | TaskKind::Support => {
                let actions = self
                    .abandonment
                    .abandon(plan, task_id, current_day, now)?
                    .into_iter()
                    .collect();
                Ok(TaskOutcome {
                    task_kind: kind,
                    compression_applied: false,
                    actions,
                })
            }
        }
    }

    /// Try to merge a missed pillar into its next pending dependent.
    pub fn compress_critical_path(
        &self,
        plan: &mut Plan,
        task_id: Uuid,
        current_day: u32,
        now: DateTime<Utc>,
    ) -> DomainResult<TaskOutcome> {
        plan.ensure_active()?;
        let missed = plan.require_task(task_id)?;
        if !missed.kind.is_critical() {
            return Err(DomainError::ValidationFailed(format!(
                "Task {task_id} is a {} task; only pillar tasks are compressed",
                missed.kind
            )));
        }

        let status = missed.status;
        let mut outcome = TaskOutcome {
            task_kind: TaskKind::Pillar,
            compression_applied: false,
            actions: Vec::new(),
        };

        match status {
            TaskStatus::Scheduled => plan.transition_task(task_id, TaskStatus::Overdue)?,
            TaskStatus::Overdue => {}
            status => {
                debug!(move_id = %plan.id, task_id = %task_id, %status, "task already resolved");
                return Ok(outcome);
            }
        }

        let Some(dependent_id) = next_pending_dependent(plan, task_id, current_day) else {
            warn!(
                move_id = %plan.id,
                task_id = %task_id,
                current_day,
                "missed pillar has no pending dependent to merge into"
            );
            return Ok(outcome);
        };

        let viability = {
            let missed = plan.require_task(task_id)?;
            let dependent = plan.require_task(dependent_id)?;
            self.policy.assess(dependent, missed)
        };

        match viability {
            Viability::Viable => {
                let (record, merged_id) = self.merge(plan, task_id, dependent_id, now)?;
                let record = record.on_night(current_day);
                outcome.compression_applied = true;
                outcome
                    .actions
                    .push(CompressionAction::from_record(&record, Some(merged_id)));
                plan.record(record);
            }
            Viability::NotViable { reason } => {
                warn!(
                    move_id = %plan.id,
                    task_id = %task_id,
                    dependent_id = %dependent_id,
                    %reason,
                    "compression rejected"
                );
                let record = CompressionRecord::new(
                    plan.id,
                    vec![task_id, dependent_id],
                    CompressionActionKind::FailedCompression,
                    reason,
                    now,
                )
                .with_recommendation(Recommendation::RescheduleMove)
                .on_night(current_day);
                let action = CompressionAction::from_record(&record, None);
                if plan.record(record) {
                    outcome.actions.push(action);
                }
            }
        }

        Ok(outcome)
    }

    /// Replace `missed` and `dependent` with a single task on the dependent's
    /// day. Both originals become `Compressed`; tasks downstream of either
    /// original are re-linked to the merged task.
    ///
    /// Returns the audit record (not yet appended) and the merged task id.
    pub fn merge(
        &self,
        plan: &mut Plan,
        missed_id: Uuid,
        dependent_id: Uuid,
        now: DateTime<Utc>,
    ) -> DomainResult<(CompressionRecord, Uuid)> {
        plan.ensure_active()?;
        let missed = plan.require_task(missed_id)?;
        let dependent = plan.require_task(dependent_id)?;

        for task in [missed, dependent] {
            if !task.can_transition_to(TaskStatus::Compressed) {
                return Err(DomainError::InvalidStateTransition {
                    from: task.status.to_string(),
                    to: TaskStatus::Compressed.to_string(),
                    reason: format!("task {} cannot be merged", task.id),
                });
            }
        }

        let merged = merged_task(missed, dependent);
        let rationale = format!(
            "'{}' missed on day {}; merged into '{}' on day {} to keep the critical path moving",
            missed.title, missed.day_number, dependent.title, dependent.day_number
        );
        let merged_day = merged.day_number;

        let merged_id = plan.add_task(merged)?;
        plan.transition_task(missed_id, TaskStatus::Compressed)?;
        plan.transition_task(dependent_id, TaskStatus::Compressed)?;

        for task in &mut plan.tasks {
            let downstream = matches!(task.dependency_id, Some(dep) if dep == missed_id || dep == dependent_id);
            if downstream && task.id != dependent_id && !task.is_terminal() && task.day_number > merged_day {
                task.dependency_id = Some(merged_id);
            }
        }

        info!(
            move_id = %plan.id,
            missed_id = %missed_id,
            dependent_id = %dependent_id,
            merged_id = %merged_id,
            day = merged_day,
            "compressed missed pillar into dependent"
        );

        let record = CompressionRecord::new(
            plan.id,
            vec![missed_id, dependent_id, merged_id],
            CompressionActionKind::Compressed,
            rationale,
            now,
        );
        Ok((record, merged_id))
    }
}

/// First unresolved dependent scheduled after `current_day`, by (day, id).
fn next_pending_dependent(plan: &Plan, task_id: Uuid, current_day: u32) -> Option<Uuid> {
    plan.dependents_of(task_id)
        .filter(|t| t.day_number > current_day && t.status == TaskStatus::Scheduled)
        .min_by_key(|t| t.sort_key())
        .map(|t| t.id)
}

fn merged_task(missed: &Task, dependent: &Task) -> Task {
    let description = [missed.description.trim(), dependent.description.trim()]
        .into_iter()
        .filter(|d| !d.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut merged = Task::new(
        format!("{} + {}", missed.title, dependent.title),
        TaskKind::Pillar,
        dependent.day_number,
    )
    .with_description(description);
    merged.produces = dependent.produces.clone().or_else(|| missed.produces.clone());
    merged.merged_from = vec![missed.id, dependent.id];
    merged
}
