//! Port trait definitions (Hexagonal Architecture)
//!
//! - MoveRepository: persistence of move aggregates
//! - Clock: source of "now" for deterministic runs
//!
//! Adapters live in `crate::adapters`.

pub mod clock;
pub mod move_repository;

pub use clock::{Clock, FixedClock, SystemClock};
pub use move_repository::{MoveFilter, MoveRepository};
