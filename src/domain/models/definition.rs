//! Authoring format for moves.
//!
//! Users write a move as YAML (or JSON) where tasks refer to each other by
//! short keys. Converting a definition assigns ids and due dates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::plan::Plan;
use super::task::{Task, TaskKind};
use crate::domain::errors::{DomainError, DomainResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveDefinition {
    pub name: String,
    pub start_date: NaiveDate,
    pub duration_days: u32,
    #[serde(default)]
    pub tasks: Vec<TaskDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// Reference used by `depends_on`; unique within the move
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub kind: TaskKind,
    pub day: u32,
    #[serde(default)]
    pub depends_on: Option<String>,
    #[serde(default)]
    pub produces: Option<String>,
    #[serde(default)]
    pub requires: Option<String>,
}

impl MoveDefinition {
    pub fn from_yaml(source: &str) -> DomainResult<Self> {
        serde_yaml::from_str(source).map_err(|e| DomainError::SerializationError(e.to_string()))
    }

    /// Build the move. Structural checks beyond key resolution are left to
    /// the dependency resolver.
    pub fn into_plan(self) -> DomainResult<Plan> {
        let mut plan = Plan::new(self.name, self.start_date, self.duration_days);

        let mut ids: HashMap<&str, Uuid> = HashMap::with_capacity(self.tasks.len());
        for def in &self.tasks {
            if ids.insert(def.key.as_str(), Uuid::new_v4()).is_some() {
                return Err(DomainError::ValidationFailed(format!(
                    "Duplicate task key '{}'",
                    def.key
                )));
            }
        }

        for def in &self.tasks {
            let mut task = Task::new(def.title.clone(), def.kind, def.day)
                .with_description(def.description.clone());
            task.id = ids[def.key.as_str()];
            if let Some(dep) = &def.depends_on {
                let dep_id = ids.get(dep.as_str()).ok_or_else(|| {
                    DomainError::ValidationFailed(format!(
                        "Task '{}' depends on unknown task '{dep}'",
                        def.key
                    ))
                })?;
                task.dependency_id = Some(*dep_id);
            }
            task.produces = def.produces.clone();
            task.requires = def.requires.clone();
            plan.add_task(task)?;
        }

        Ok(plan)
    }
}
