//! CLI command implementations.

pub mod batch;
pub mod check;
pub mod init;
pub mod log;
pub mod moves;
pub mod task;
