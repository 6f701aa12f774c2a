use crate::domain::errors::ConfigurationError;
use crate::domain::models::{Plan, Task};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Structural validation of a move's dependency graph.
///
/// Runs when a move is loaded, before any decision is taken, so a malformed
/// aggregate never reaches the compression engine.
#[derive(Debug, Clone, Default)]
pub struct DependencyResolver;

// Standalone helper for cycle detection (no self needed)
fn detect_cycle_util(
    node: Uuid,
    graph: &HashMap<Uuid, Vec<Uuid>>,
    visited: &mut HashSet<Uuid>,
    rec_stack: &mut HashSet<Uuid>,
    path: &mut Vec<Uuid>,
) -> bool {
    visited.insert(node);
    rec_stack.insert(node);
    path.push(node);

    if let Some(neighbors) = graph.get(&node) {
        for &neighbor in neighbors {
            if !visited.contains(&neighbor) {
                if detect_cycle_util(neighbor, graph, visited, rec_stack, path) {
                    return true;
                }
            } else if rec_stack.contains(&neighbor) {
                if let Some(cycle_start) = path.iter().position(|&id| id == neighbor) {
                    path.drain(0..cycle_start);
                    path.push(neighbor);
                    return true;
                }
            }
        }
    }

    rec_stack.remove(&node);
    path.pop();
    false
}

impl DependencyResolver {
    pub fn new() -> Self {
        Self
    }

    /// Check every structural invariant of a move.
    ///
    /// Reports the first problem found; checks run in a fixed order so the
    /// same aggregate always yields the same error.
    pub fn validate(&self, plan: &Plan) -> Result<(), ConfigurationError> {
        if plan.duration_days == 0 {
            return Err(ConfigurationError::ZeroDuration);
        }

        let mut seen = HashSet::new();
        for task in &plan.tasks {
            if !seen.insert(task.id) {
                return Err(ConfigurationError::DuplicateTask(task.id));
            }
        }

        for task in &plan.tasks {
            if task.day_number == 0 || task.day_number > plan.duration_days {
                return Err(ConfigurationError::DayOutOfRange {
                    task_id: task.id,
                    day: task.day_number,
                    duration_days: plan.duration_days,
                });
            }
            let expected = plan.due_date_for(task.day_number);
            if task.due_date != expected {
                return Err(ConfigurationError::DueDateMismatch {
                    task_id: task.id,
                    day: task.day_number,
                    expected,
                    actual: task.due_date,
                });
            }
        }

        self.validate_dependencies(&plan.tasks)?;

        if let Some(cycle) = self.detect_cycle(&plan.tasks) {
            return Err(ConfigurationError::DependencyCycle(cycle));
        }

        self.validate_day_order(&plan.tasks)
    }

    /// Validate that every dependency points at a task in the same move
    pub fn validate_dependencies(&self, tasks: &[Task]) -> Result<(), ConfigurationError> {
        let available_ids: HashSet<Uuid> = tasks.iter().map(|t| t.id).collect();
        for task in tasks {
            if let Some(dep_id) = task.dependency_id {
                if !available_ids.contains(&dep_id) {
                    return Err(ConfigurationError::OrphanedDependency {
                        task_id: task.id,
                        dependency_id: dep_id,
                    });
                }
            }
        }
        Ok(())
    }

    /// Detect a circular dependency chain. The returned path starts and ends
    /// at the same task.
    pub fn detect_cycle(&self, tasks: &[Task]) -> Option<Vec<Uuid>> {
        let mut graph: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for task in tasks {
            graph
                .entry(task.id)
                .or_default()
                .extend(task.dependency_id.iter().copied());
        }

        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();
        let mut path = Vec::new();

        // Walk in a stable order so the reported cycle is deterministic.
        let mut roots: Vec<Uuid> = graph.keys().copied().collect();
        roots.sort_unstable();

        for task_id in roots {
            if !visited.contains(&task_id)
                && detect_cycle_util(task_id, &graph, &mut visited, &mut rec_stack, &mut path)
            {
                return Some(path);
            }
        }

        None
    }

    /// Every dependency must be scheduled on a strictly earlier day.
    pub fn validate_day_order(&self, tasks: &[Task]) -> Result<(), ConfigurationError> {
        let days: HashMap<Uuid, u32> = tasks.iter().map(|t| (t.id, t.day_number)).collect();
        for task in tasks {
            let Some(dep_id) = task.dependency_id else {
                continue;
            };
            if let Some(&dependency_day) = days.get(&dep_id) {
                if dependency_day >= task.day_number {
                    return Err(ConfigurationError::DependencyNotEarlier {
                        task_id: task.id,
                        day: task.day_number,
                        dependency_id: dep_id,
                        dependency_day,
                    });
                }
            }
        }
        Ok(())
    }

    /// Length of the dependency chain above a task (0 for a root).
    pub fn chain_depth(&self, task: &Task, all_tasks: &[Task]) -> Result<u32, ConfigurationError> {
        let task_map: HashMap<Uuid, &Task> = all_tasks.iter().map(|t| (t.id, t)).collect();
        let mut visited = HashSet::new();
        let mut depth = 0;
        let mut current = task;
        visited.insert(current.id);

        while let Some(dep_id) = current.dependency_id {
            let Some(&next) = task_map.get(&dep_id) else {
                return Err(ConfigurationError::OrphanedDependency {
                    task_id: current.id,
                    dependency_id: dep_id,
                });
            };
            if !visited.insert(next.id) {
                return Err(ConfigurationError::DependencyCycle(vec![next.id, current.id]));
            }
            depth += 1;
            current = next;
        }

        Ok(depth)
    }
}
