//! Results of a nightly check, as handed to the scheduler and notifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::compression::{CompressionActionKind, CompressionRecord, Recommendation};
use super::task::TaskKind;

/// A single decision taken during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionAction {
    pub action: CompressionActionKind,
    pub task_ids: Vec<Uuid>,
    /// Task created by a successful merge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_task_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<Recommendation>,
    pub rationale: String,
}

impl CompressionAction {
    /// Describe the decision carried by an audit record.
    pub fn from_record(record: &CompressionRecord, merged_task_id: Option<Uuid>) -> Self {
        Self {
            action: record.action,
            task_ids: record.task_ids.clone(),
            merged_task_id,
            recommendation: record.recommendation,
            rationale: record.rationale.clone(),
        }
    }
}

/// What happened to a single missed task routed through the compression engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub task_kind: TaskKind,
    pub compression_applied: bool,
    pub actions: Vec<CompressionAction>,
}

/// Ways a user can recover from an aborted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryOption {
    RestartMove,
    DowngradeIntensity,
    AbortCampaign,
}

impl RecoveryOption {
    /// Every option offered after an abort, in display order.
    pub const ALL: [Self; 3] = [
        Self::RestartMove,
        Self::DowngradeIntensity,
        Self::AbortCampaign,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RestartMove => "restart_move",
            Self::DowngradeIntensity => "downgrade_intensity",
            Self::AbortCampaign => "abort_campaign",
        }
    }
}

impl fmt::Display for RecoveryOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-facing notification emitted when a move is aborted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbortPayload {
    pub move_id: Uuid,
    pub move_name: String,
    pub consecutive_failures: u32,
    pub options: Vec<RecoveryOption>,
    pub message: String,
}

impl AbortPayload {
    pub fn new(move_id: Uuid, move_name: impl Into<String>, consecutive_failures: u32) -> Self {
        let move_name = move_name.into();
        let message = abort_message(consecutive_failures, &move_name);
        Self {
            move_id,
            move_name,
            consecutive_failures,
            options: RecoveryOption::ALL.to_vec(),
            message,
        }
    }
}

/// Message shown to the user when their move is aborted.
pub fn abort_message(missed_days: u32, move_name: &str) -> String {
    format!(
        "You have missed {missed_days} days. The '{move_name}' strategy is broken. \
         Do you want to restart the move or downgrade to a 'Light Intensity' plan?"
    )
}

/// Outcome of one nightly check for one move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CompressionResult {
    /// Nothing was overdue, or every overdue task was already resolved.
    NoAction,
    /// At least one decision was taken and the move is still active.
    CompressionApplied { actions: Vec<CompressionAction> },
    /// The failure threshold was reached and the move was terminated.
    MoveAborted {
        actions: Vec<CompressionAction>,
        payload: AbortPayload,
    },
}

impl CompressionResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoAction => "no_action",
            Self::CompressionApplied { .. } => "compression_applied",
            Self::MoveAborted { .. } => "move_aborted",
        }
    }

    /// Decisions taken during the run.
    pub fn actions(&self) -> &[CompressionAction] {
        match self {
            Self::NoAction => &[],
            Self::CompressionApplied { actions } | Self::MoveAborted { actions, .. } => actions,
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::MoveAborted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abort_message_template() {
        assert_eq!(
            abort_message(3, "Product Launch"),
            "You have missed 3 days. The 'Product Launch' strategy is broken. \
             Do you want to restart the move or downgrade to a 'Light Intensity' plan?"
        );
    }

    #[test]
    fn test_abort_payload_offers_three_options() {
        let payload = AbortPayload::new(Uuid::nil(), "Launch", 4);
        assert_eq!(
            payload.options,
            vec![
                RecoveryOption::RestartMove,
                RecoveryOption::DowngradeIntensity,
                RecoveryOption::AbortCampaign
            ]
        );
        assert!(payload.message.starts_with("You have missed 4 days."));
    }

    #[test]
    fn test_result_serializes_with_outcome_tag() {
        let value = serde_json::to_value(CompressionResult::NoAction).unwrap();
        assert_eq!(value["outcome"], "no_action");

        let payload = AbortPayload::new(Uuid::nil(), "Launch", 3);
        let aborted = CompressionResult::MoveAborted {
            actions: vec![],
            payload,
        };
        let value = serde_json::to_value(&aborted).unwrap();
        assert_eq!(value["outcome"], "move_aborted");
        assert_eq!(value["payload"]["options"][1], "downgrade_intensity");
        assert!(aborted.is_aborted());
    }
}
