//! Repository port for move persistence.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{MoveStatus, Plan};

/// Filter for listing moves.
#[derive(Debug, Default, Clone)]
pub struct MoveFilter {
    pub status: Option<MoveStatus>,
}

impl MoveFilter {
    pub fn active() -> Self {
        Self {
            status: Some(MoveStatus::Active),
        }
    }
}

/// Loads and stores whole move aggregates (tasks and compression log).
#[async_trait]
pub trait MoveRepository: Send + Sync {
    /// Store a new move.
    async fn insert(&self, plan: &Plan) -> DomainResult<()>;

    /// Load a move; fails with `MoveNotFound` when it does not exist.
    async fn load(&self, id: Uuid) -> DomainResult<Plan>;

    /// Persist the current state of an existing move.
    async fn save(&self, plan: &Plan) -> DomainResult<()>;

    /// Ids of moves matching the filter, oldest first.
    async fn list_ids(&self, filter: MoveFilter) -> DomainResult<Vec<Uuid>>;

    /// Load every move matching the filter.
    async fn list(&self, filter: MoveFilter) -> DomainResult<Vec<Plan>> {
        let mut plans = Vec::new();
        for id in self.list_ids(filter).await? {
            plans.push(self.load(id).await?);
        }
        Ok(plans)
    }
}
