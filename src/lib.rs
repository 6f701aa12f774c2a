//! Taskpress - compression protocol for time-boxed task moves
//!
//! A move is a fixed-length plan of daily tasks. Every night the protocol
//! looks at what was missed: critical work is merged into the next task that
//! depends on it, optional work is dropped, and a move that keeps failing
//! day after day is aborted with recovery options for the user.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): move/task aggregate, audit log, ports
//! - **Service Layer** (`services`): the nightly check and its building blocks
//! - **Adapters** (`adapters`): SQLite and in-memory move repositories
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use taskpress::adapters::memory::InMemoryMoveRepository;
//! use taskpress::domain::ports::SystemClock;
//! use taskpress::services::CompressionProtocol;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let repo = Arc::new(InMemoryMoveRepository::new());
//!     let protocol = CompressionProtocol::new(repo, Arc::new(SystemClock), &Default::default());
//!     // import a move, then run protocol.run_nightly_check_today(move_id)
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    CompressionAction, CompressionActionKind, CompressionRecord, CompressionResult, Config,
    MoveDefinition, MoveStatus, Plan, Task, TaskKind, TaskStatus,
};
pub use domain::ports::{Clock, MoveFilter, MoveRepository};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{CompressionProtocol, NightlyBatch};
