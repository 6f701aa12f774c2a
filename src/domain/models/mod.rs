//! Domain models.

pub mod compression;
pub mod config;
pub mod definition;
pub mod outcome;
pub mod plan;
pub mod task;

pub use compression::{CompressionActionKind, CompressionLog, CompressionRecord, Recommendation};
pub use config::{BatchConfig, Config, DatabaseConfig, LoggingConfig, ProtocolConfig};
pub use definition::{MoveDefinition, TaskDefinition};
pub use outcome::{
    abort_message, AbortPayload, CompressionAction, CompressionResult, RecoveryOption, TaskOutcome,
};
pub use plan::{MoveStatus, Plan};
pub use task::{Task, TaskKind, TaskStatus};
