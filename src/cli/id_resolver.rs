//! Short ID prefix resolution for CLI arguments.
//!
//! Any unique prefix of a UUID is accepted in place of the full id, similar
//! to git short hashes.

use anyhow::{bail, Result};
use uuid::Uuid;

use crate::domain::models::Plan;
use crate::domain::ports::{MoveFilter, MoveRepository};

/// Resolve a move id prefix against every stored move.
pub async fn resolve_move_id(repo: &dyn MoveRepository, prefix: &str) -> Result<Uuid> {
    if let Ok(uuid) = Uuid::parse_str(prefix) {
        return Ok(uuid);
    }
    validate_prefix(prefix)?;
    let ids = repo.list_ids(MoveFilter::default()).await?;
    pick(prefix, "move", ids)
}

/// Resolve a task id prefix within one move.
pub fn resolve_task_id(plan: &Plan, prefix: &str) -> Result<Uuid> {
    if let Ok(uuid) = Uuid::parse_str(prefix) {
        return Ok(uuid);
    }
    validate_prefix(prefix)?;
    pick(prefix, "task", plan.tasks.iter().map(|t| t.id))
}

fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() {
        bail!("ID prefix must not be empty");
    }
    if !prefix.chars().all(|c| c.is_ascii_hexdigit() || c == '-') {
        bail!("Invalid ID prefix '{prefix}': must contain only hex characters and dashes");
    }
    Ok(())
}

fn pick(prefix: &str, entity: &str, candidates: impl IntoIterator<Item = Uuid>) -> Result<Uuid> {
    let needle = prefix.to_lowercase();
    let matches: Vec<Uuid> = candidates
        .into_iter()
        .filter(|id| id.to_string().starts_with(&needle))
        .collect();

    match matches.as_slice() {
        [] => bail!("No {entity} found matching '{prefix}'"),
        [id] => Ok(*id),
        many => {
            let mut msg = format!("Ambiguous prefix '{prefix}': matches {} {entity}s:", many.len());
            for id in many {
                msg.push_str(&format!("\n  {id}"));
            }
            bail!("{msg}")
        }
    }
}
