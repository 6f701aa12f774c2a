//! Infrastructure layer
//!
//! - Configuration management (figment)
//! - Logging (tracing)
//!
//! Persistence adapters live in `crate::adapters`.

pub mod config;
pub mod logging;
