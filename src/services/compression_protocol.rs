//! Nightly compression protocol.
//!
//! Coordinates one run for one move: load the aggregate, validate its
//! structure, find missed tasks, route each to compression or abandonment,
//! then check whether the move has failed enough days in a row to abort.
//! The decision steps operate on the in-memory aggregate only; the
//! repository is touched once to load and once to save.

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{CompressionResult, Plan, ProtocolConfig, TaskStatus};
use crate::domain::ports::{Clock, MoveRepository};
use crate::services::abort_handler::AbortHandler;
use crate::services::compression_engine::CompressionEngine;
use crate::services::dependency_resolver::DependencyResolver;
use crate::services::failure_tracker::FailureTracker;
use crate::services::overdue_detector::OverdueDetector;
use crate::services::viability::ViabilityPolicy;

/// Service running the nightly check against an injected repository.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use taskpress::adapters::memory::InMemoryMoveRepository;
/// use taskpress::domain::models::ProtocolConfig;
/// use taskpress::domain::ports::SystemClock;
/// use taskpress::services::CompressionProtocol;
///
/// # async fn example(move_id: uuid::Uuid) -> taskpress::domain::DomainResult<()> {
/// let protocol = CompressionProtocol::new(
///     Arc::new(InMemoryMoveRepository::new()),
///     Arc::new(SystemClock),
///     &ProtocolConfig::default(),
/// );
/// let result = protocol.run_nightly_check_today(move_id).await?;
/// println!("{}", result.as_str());
/// # Ok(())
/// # }
/// ```
pub struct CompressionProtocol {
    repo: Arc<dyn MoveRepository>,
    clock: Arc<dyn Clock>,
    resolver: DependencyResolver,
    detector: OverdueDetector,
    engine: CompressionEngine,
    tracker: FailureTracker,
    abort_handler: AbortHandler,
}

impl CompressionProtocol {
    pub fn new(
        repo: Arc<dyn MoveRepository>,
        clock: Arc<dyn Clock>,
        config: &ProtocolConfig,
    ) -> Self {
        Self {
            repo,
            clock,
            resolver: DependencyResolver::new(),
            detector: OverdueDetector::new(),
            engine: CompressionEngine::new(ViabilityPolicy::from_config(config)),
            tracker: FailureTracker::new(config.failure_threshold),
            abort_handler: AbortHandler::new(),
        }
    }

    pub fn repository(&self) -> &Arc<dyn MoveRepository> {
        &self.repo
    }

    /// Load a move and reject it if its structure is broken.
    pub async fn load_validated(&self, move_id: Uuid) -> DomainResult<Plan> {
        let plan = self.repo.load(move_id).await?;
        self.resolver
            .validate(&plan)
            .map_err(|e| DomainError::configuration(move_id, e))?;
        Ok(plan)
    }

    /// Run the nightly check for one move as of `as_of`.
    ///
    /// The move is saved only when the run changed it, and never when a
    /// step failed part-way.
    #[instrument(skip(self), fields(move_id = %move_id, as_of = %as_of), err)]
    pub async fn run_nightly_check(
        &self,
        move_id: Uuid,
        as_of: NaiveDate,
    ) -> DomainResult<CompressionResult> {
        let mut plan = self.load_validated(move_id).await?;
        let before = plan.clone();

        let result = self.evaluate(&mut plan, as_of)?;

        if plan != before {
            self.repo.save(&plan).await?;
        }
        info!(outcome = result.as_str(), actions = result.actions().len(), "nightly check finished");
        Ok(result)
    }

    /// Run the nightly check using the clock's current date.
    pub async fn run_nightly_check_today(&self, move_id: Uuid) -> DomainResult<CompressionResult> {
        self.run_nightly_check(move_id, self.clock.today()).await
    }

    /// Apply the protocol to an in-memory move.
    ///
    /// Missed tasks are handled in (day, id) order, so a merge made for an
    /// earlier task is visible to every later step of the same run.
    pub fn evaluate(&self, plan: &mut Plan, as_of: NaiveDate) -> DomainResult<CompressionResult> {
        if !plan.is_active() {
            debug!(move_id = %plan.id, status = %plan.status, "move is not active, skipping");
            return Ok(CompressionResult::NoAction);
        }

        let now = self.clock.now();
        let current_day = plan.current_day(as_of);

        if self.detector.detect(plan, as_of).is_empty() {
            if plan.complete_if_finished(as_of) {
                info!(move_id = %plan.id, "move completed");
            }
            return Ok(CompressionResult::NoAction);
        }

        let actionable: Vec<Uuid> = self
            .detector
            .actionable(plan, as_of)
            .iter()
            .map(|t| t.id)
            .collect();

        for &task_id in &actionable {
            if plan.require_task(task_id)?.status == TaskStatus::Scheduled {
                plan.transition_task(task_id, TaskStatus::Overdue)?;
            }
        }

        let mut actions = Vec::new();
        for task_id in actionable {
            if !plan.require_task(task_id)?.status.is_unresolved() {
                continue;
            }
            let outcome = self.engine.handle(plan, task_id, current_day, now)?;
            actions.extend(outcome.actions);
        }

        let consecutive_failures = self.tracker.count_consecutive_failures(plan, current_day);
        debug!(move_id = %plan.id, current_day, consecutive_failures, "failure streak");

        if self.tracker.is_threshold_reached(consecutive_failures) {
            let payload = self.abort_handler.abort(plan, consecutive_failures, current_day, now)?;
            return Ok(CompressionResult::MoveAborted { actions, payload });
        }

        if plan.complete_if_finished(as_of) {
            info!(move_id = %plan.id, "move completed");
        }

        if actions.is_empty() {
            Ok(CompressionResult::NoAction)
        } else {
            Ok(CompressionResult::CompressionApplied { actions })
        }
    }

    /// Record that the user finished a task.
    #[instrument(skip(self), fields(move_id = %move_id, task_id = %task_id), err)]
    pub async fn complete_task(&self, move_id: Uuid, task_id: Uuid) -> DomainResult<Plan> {
        let mut plan = self.load_validated(move_id).await?;
        plan.complete_task(task_id, self.clock.now())?;
        self.repo.save(&plan).await?;
        Ok(plan)
    }
}
