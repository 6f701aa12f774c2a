//! In-memory MoveRepository, used by tests and dry runs.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Plan;
use crate::domain::ports::{MoveFilter, MoveRepository};

/// Moves kept in insertion order behind a tokio `RwLock`.
#[derive(Default)]
pub struct InMemoryMoveRepository {
    moves: RwLock<Vec<Plan>>,
    saves: AtomicUsize,
}

impl InMemoryMoveRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `save` calls so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::Acquire)
    }
}

#[async_trait]
impl MoveRepository for InMemoryMoveRepository {
    async fn insert(&self, plan: &Plan) -> DomainResult<()> {
        let mut moves = self.moves.write().await;
        if moves.iter().any(|m| m.id == plan.id) {
            return Err(DomainError::ValidationFailed(format!(
                "Move {} already exists",
                plan.id
            )));
        }
        moves.push(plan.clone());
        Ok(())
    }

    async fn load(&self, id: Uuid) -> DomainResult<Plan> {
        let moves = self.moves.read().await;
        moves
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or(DomainError::MoveNotFound(id))
    }

    async fn save(&self, plan: &Plan) -> DomainResult<()> {
        let mut moves = self.moves.write().await;
        let stored = moves
            .iter_mut()
            .find(|m| m.id == plan.id)
            .ok_or(DomainError::MoveNotFound(plan.id))?;
        *stored = plan.clone();
        self.saves.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    async fn list_ids(&self, filter: MoveFilter) -> DomainResult<Vec<Uuid>> {
        let moves = self.moves.read().await;
        Ok(moves
            .iter()
            .filter(|m| filter.status.map_or(true, |s| m.status == s))
            .map(|m| m.id)
            .collect())
    }
}
