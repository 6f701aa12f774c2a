//! Domain layer for the taskpress protocol
//!
//! This module contains the move/task aggregate, the error taxonomy and the
//! ports the protocol consumes.

pub mod errors;
pub mod models;
pub mod ports;

// Re-export error types for convenient access
pub use errors::{ConfigurationError, DomainError, DomainResult};
