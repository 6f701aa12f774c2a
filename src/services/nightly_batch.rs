//! Nightly check across every active move.
//!
//! Each move runs in its own tokio task, bounded by a semaphore. A failing
//! move is reported and logged; the others carry on.

use chrono::NaiveDate;
use futures::future::join_all;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{BatchConfig, CompressionResult};
use crate::domain::ports::MoveFilter;
use crate::services::compression_protocol::CompressionProtocol;

/// Result of one move's run inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveRun {
    pub move_id: Uuid,
    pub result: CompressionResult,
}

/// A move whose run failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveFailure {
    pub move_id: Uuid,
    pub error: String,
}

/// Summary of a batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub as_of: Option<NaiveDate>,
    pub runs: Vec<MoveRun>,
    pub failures: Vec<MoveFailure>,
    /// Moves not started because a stop was requested.
    pub skipped: Vec<Uuid>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.runs.len() + self.failures.len() + self.skipped.len()
    }

    pub fn aborted(&self) -> impl Iterator<Item = &MoveRun> {
        self.runs.iter().filter(|r| r.result.is_aborted())
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.skipped.is_empty()
    }
}

/// Handle for stopping a batch from another task.
#[derive(Clone)]
pub struct BatchHandle {
    stop_flag: Arc<AtomicBool>,
}

impl BatchHandle {
    /// Request the batch to stop. Moves already running finish normally.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Release);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop_flag.load(Ordering::Acquire)
    }
}

enum Slot {
    Ran(CompressionResult),
    Failed(DomainError),
    Skipped,
}

pub struct NightlyBatch {
    protocol: Arc<CompressionProtocol>,
    config: BatchConfig,
    stop_flag: Arc<AtomicBool>,
}

impl NightlyBatch {
    pub fn new(protocol: Arc<CompressionProtocol>, config: BatchConfig) -> Self {
        Self {
            protocol,
            config,
            stop_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn handle(&self) -> BatchHandle {
        BatchHandle {
            stop_flag: self.stop_flag.clone(),
        }
    }

    /// Run the nightly check for every active move as of `as_of`.
    ///
    /// Only listing the moves can fail the batch as a whole.
    #[instrument(skip(self), fields(as_of = %as_of))]
    pub async fn run(&self, as_of: NaiveDate) -> DomainResult<BatchReport> {
        let move_ids = self
            .protocol
            .repository()
            .list_ids(MoveFilter::active())
            .await?;
        info!(moves = move_ids.len(), "starting nightly batch");

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let mut handles = Vec::with_capacity(move_ids.len());

        for &move_id in &move_ids {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| DomainError::ValidationFailed("Semaphore error".to_string()))?;

            let protocol = self.protocol.clone();
            let stop_flag = self.stop_flag.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                if stop_flag.load(Ordering::Acquire) {
                    return Slot::Skipped;
                }
                match protocol.run_nightly_check(move_id, as_of).await {
                    Ok(result) => Slot::Ran(result),
                    Err(e) => Slot::Failed(e),
                }
            });
            handles.push(handle);
        }

        let mut report = BatchReport {
            as_of: Some(as_of),
            ..BatchReport::default()
        };
        let slots = join_all(handles).await;
        for (move_id, slot) in move_ids.into_iter().zip(slots) {
            match slot {
                Ok(Slot::Ran(result)) => report.runs.push(MoveRun { move_id, result }),
                Ok(Slot::Skipped) => report.skipped.push(move_id),
                Ok(Slot::Failed(e)) => {
                    error!(move_id = %move_id, error = %e, "nightly check failed");
                    report.failures.push(MoveFailure {
                        move_id,
                        error: e.to_string(),
                    });
                }
                Err(e) => {
                    error!(move_id = %move_id, error = %e, "nightly check task panicked");
                    report.failures.push(MoveFailure {
                        move_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            ran = report.runs.len(),
            failed = report.failures.len(),
            skipped = report.skipped.len(),
            aborted = report.aborted().count(),
            "nightly batch finished"
        );
        Ok(report)
    }
}
