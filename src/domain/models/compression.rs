//! Compression audit log.
//!
//! Every decision the protocol takes about a move is written here as a
//! [`CompressionRecord`]. The log only grows: records are never edited or
//! removed, and an identical decision about the same tasks is stored once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// What the protocol did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionActionKind {
    /// A missed pillar was merged into its next dependent.
    Compressed,
    /// A merge was attempted but the dependent cannot run without the
    /// missed task's output.
    FailedCompression,
    /// A missed non-critical task was dropped.
    Abandoned,
    /// The move was terminated after repeated failed days.
    Aborted,
}

impl CompressionActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compressed => "compressed",
            Self::FailedCompression => "failed_compression",
            Self::Abandoned => "abandoned",
            Self::Aborted => "aborted",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "compressed" => Some(Self::Compressed),
            "failed_compression" => Some(Self::FailedCompression),
            "abandoned" => Some(Self::Abandoned),
            "aborted" => Some(Self::Aborted),
            _ => None,
        }
    }
}

impl fmt::Display for CompressionActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Follow-up suggested to a human operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// The plan's dates need to move; compression cannot save it.
    RescheduleMove,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RescheduleMove => "reschedule_move",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "reschedule_move" => Some(Self::RescheduleMove),
            _ => None,
        }
    }
}

/// One audited decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionRecord {
    pub id: Uuid,
    pub move_id: Uuid,
    /// Tasks the decision refers to (missed task first for merges).
    pub task_ids: Vec<Uuid>,
    pub action: CompressionActionKind,
    pub rationale: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<Recommendation>,
    /// Plan day the nightly run was evaluating when it took the decision.
    #[serde(default)]
    pub night: u32,
    pub recorded_at: DateTime<Utc>,
}

impl CompressionRecord {
    pub fn new(
        move_id: Uuid,
        task_ids: Vec<Uuid>,
        action: CompressionActionKind,
        rationale: impl Into<String>,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            move_id,
            task_ids,
            action,
            rationale: rationale.into(),
            recommendation: None,
            night: 0,
            recorded_at,
        }
    }

    pub fn with_recommendation(mut self, recommendation: Recommendation) -> Self {
        self.recommendation = Some(recommendation);
        self
    }

    pub fn on_night(mut self, night: u32) -> Self {
        self.night = night;
        self
    }

    /// Two records describe the same decision when they were taken on the
    /// same night with the same action and tasks.
    pub fn same_decision(&self, other: &Self) -> bool {
        self.move_id == other.move_id
            && self.night == other.night
            && self.action == other.action
            && self.task_ids == other.task_ids
    }
}

/// Append-only sequence of records for a single move.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompressionLog {
    records: Vec<CompressionRecord>,
}

impl CompressionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a log from stored records, preserving their order.
    pub fn from_records(records: Vec<CompressionRecord>) -> Self {
        Self { records }
    }

    /// Append a record unless the same decision is already logged.
    ///
    /// Returns whether the record was stored.
    pub fn append(&mut self, record: CompressionRecord) -> bool {
        if self.records.iter().any(|r| r.same_decision(&record)) {
            return false;
        }
        self.records.push(record);
        true
    }

    pub fn records(&self) -> &[CompressionRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompressionRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records of one action kind, in append order.
    pub fn by_action(&self, action: CompressionActionKind) -> impl Iterator<Item = &CompressionRecord> {
        self.records.iter().filter(move |r| r.action == action)
    }

    /// Records that mention a task.
    pub fn for_task(&self, task_id: Uuid) -> impl Iterator<Item = &CompressionRecord> {
        self.records.iter().filter(move |r| r.task_ids.contains(&task_id))
    }
}
