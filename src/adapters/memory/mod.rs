//! In-memory adapters.

pub mod move_repository;

pub use move_repository::InMemoryMoveRepository;
