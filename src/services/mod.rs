//! Protocol services.
//!
//! The decision components are synchronous and work on a borrowed
//! [`Plan`](crate::domain::models::Plan); [`CompressionProtocol`] and
//! [`NightlyBatch`] add the repository round-trip around them.

pub mod abandonment_engine;
pub mod abort_handler;
pub mod compression_engine;
pub mod compression_protocol;
pub mod dependency_resolver;
pub mod failure_tracker;
pub mod nightly_batch;
pub mod overdue_detector;
pub mod viability;

pub use abandonment_engine::{AbandonmentEngine, ABANDON_RATIONALE};
pub use abort_handler::AbortHandler;
pub use compression_engine::CompressionEngine;
pub use compression_protocol::CompressionProtocol;
pub use dependency_resolver::DependencyResolver;
pub use failure_tracker::{FailureTracker, DEFAULT_FAILURE_THRESHOLD};
pub use nightly_batch::{BatchHandle, BatchReport, MoveFailure, MoveRun, NightlyBatch};
pub use overdue_detector::OverdueDetector;
pub use viability::{Viability, ViabilityPolicy};
