//! Move CLI commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use comfy_table::Cell;
use std::path::PathBuf;

use crate::cli::id_resolver::resolve_move_id;
use crate::cli::open_repository;
use crate::cli::output::{
    detail, list_table, move_status_cell, output, render_list, short_id, task_status_cell, truncate, CommandOutput,
};
use crate::domain::errors::DomainError;
use crate::domain::models::{Config, MoveDefinition, MoveStatus, Plan};
use crate::domain::ports::{MoveFilter, MoveRepository};
use crate::services::DependencyResolver;

#[derive(Args, Debug)]
pub struct MoveArgs {
    #[command(subcommand)]
    pub command: MoveCommands,
}

#[derive(Subcommand, Debug)]
pub enum MoveCommands {
    /// Import a move from a YAML or JSON file
    Import {
        /// Path to the move definition
        file: PathBuf,
    },
    /// List moves
    List {
        /// Filter by status (active, aborted, completed)
        #[arg(short, long)]
        status: Option<String>,
    },
    /// Show a move and its tasks
    Show {
        /// Move ID or unique prefix
        id: String,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct MoveSummary {
    pub id: String,
    pub name: String,
    pub status: MoveStatus,
    pub start_date: String,
    pub duration_days: u32,
    pub tasks: usize,
    pub open_tasks: usize,
}

impl From<&Plan> for MoveSummary {
    fn from(plan: &Plan) -> Self {
        Self {
            id: plan.id.to_string(),
            name: plan.name.clone(),
            status: plan.status,
            start_date: plan.start_date.to_string(),
            duration_days: plan.duration_days,
            tasks: plan.tasks.len(),
            open_tasks: plan.tasks.iter().filter(|t| t.status.is_unresolved()).count(),
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct MoveListOutput {
    pub moves: Vec<MoveSummary>,
    pub total: usize,
}

impl CommandOutput for MoveListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["id", "name", "status", "start", "days", "open"]);
        for m in &self.moves {
            table.add_row(vec![
                Cell::new(short_id(&m.id)),
                Cell::new(truncate(&m.name, 30)),
                move_status_cell(m.status),
                Cell::new(&m.start_date),
                Cell::new(m.duration_days),
                Cell::new(format!("{}/{}", m.open_tasks, m.tasks)),
            ]);
        }
        render_list("move", &table, self.total)
    }
}

/// Full move, serialized as stored.
#[derive(Debug, serde::Serialize)]
pub struct MoveDetailOutput {
    #[serde(flatten)]
    pub plan: Plan,
}

impl CommandOutput for MoveDetailOutput {
    fn to_human(&self) -> String {
        let plan = &self.plan;
        let mut text = detail(
            &format!("Move: {}", plan.name),
            &[
                ("ID", plan.id.to_string()),
                ("Status", plan.status.to_string()),
                ("Start", plan.start_date.to_string()),
                ("Days", plan.duration_days.to_string()),
                ("Log entries", plan.compression_log.len().to_string()),
            ],
        );

        let mut table = list_table(&["id", "day", "kind", "title", "status", "depends on"]);
        for id in plan.ordered_task_ids() {
            let Some(task) = plan.task(id) else { continue };
            let depends_on = task
                .dependency_id
                .map(|d| short_id(&d.to_string()).to_string())
                .unwrap_or_else(|| "-".to_string());
            table.add_row(vec![
                Cell::new(short_id(&task.id.to_string())),
                Cell::new(task.day_number),
                Cell::new(task.kind.as_str()),
                Cell::new(truncate(&task.title, 40)),
                task_status_cell(task.status),
                Cell::new(depends_on),
            ]);
        }
        text.push_str("\n\n");
        text.push_str(&render_list("task", &table, plan.tasks.len()));
        text
    }
}

#[derive(Debug, serde::Serialize)]
pub struct MoveImportOutput {
    pub success: bool,
    pub message: String,
    pub move_id: String,
    pub tasks: usize,
}

impl CommandOutput for MoveImportOutput {
    fn to_human(&self) -> String {
        format!("{}\nID: {}", self.message, self.move_id)
    }
}

/// Parse and validate a move definition file.
pub async fn load_definition(path: &PathBuf) -> Result<Plan> {
    let source = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let plan = MoveDefinition::from_yaml(&source)
        .and_then(MoveDefinition::into_plan)
        .with_context(|| format!("Invalid move definition in {}", path.display()))?;

    DependencyResolver::new()
        .validate(&plan)
        .map_err(|e| DomainError::configuration(plan.id, e))
        .with_context(|| format!("Move in {} is misconfigured", path.display()))?;
    Ok(plan)
}

pub async fn execute(args: MoveArgs, config: &Config, json_mode: bool) -> Result<()> {
    let repo = open_repository(config).await?;

    match args.command {
        MoveCommands::Import { file } => {
            let plan = load_definition(&file).await?;
            repo.insert(&plan).await.context("Failed to store move")?;

            output(
                &MoveImportOutput {
                    success: true,
                    message: format!("Imported move '{}' with {} task(s).", plan.name, plan.tasks.len()),
                    move_id: plan.id.to_string(),
                    tasks: plan.tasks.len(),
                },
                json_mode,
            );
        }
        MoveCommands::List { status } => {
            let status = status
                .map(|s| MoveStatus::from_str(&s).ok_or_else(|| anyhow::anyhow!("Invalid status: {s}")))
                .transpose()?;
            let plans = repo.list(MoveFilter { status }).await?;
            let moves: Vec<MoveSummary> = plans.iter().map(MoveSummary::from).collect();
            let total = moves.len();
            output(&MoveListOutput { moves, total }, json_mode);
        }
        MoveCommands::Show { id } => {
            let move_id = resolve_move_id(repo.as_ref(), &id).await?;
            let plan = repo.load(move_id).await?;
            output(&MoveDetailOutput { plan }, json_mode);
        }
    }

    Ok(())
}
