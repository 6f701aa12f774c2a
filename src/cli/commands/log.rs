//! Implementation of the `taskpress log` command.

use anyhow::Result;
use clap::Args;
use comfy_table::Cell;

use crate::cli::id_resolver::{resolve_move_id, resolve_task_id};
use crate::cli::open_repository;
use crate::cli::output::{action_cell, list_table, output, render_list, short_id, truncate, CommandOutput};
use crate::domain::models::{CompressionRecord, Config};
use crate::domain::ports::MoveRepository;

#[derive(Args, Debug)]
pub struct LogArgs {
    /// Move ID or unique prefix
    pub move_id: String,

    /// Only show records touching this task (ID or prefix)
    #[arg(long)]
    pub task: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct LogOutput {
    pub move_id: String,
    pub move_name: String,
    pub records: Vec<CompressionRecord>,
}

impl CommandOutput for LogOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["when", "night", "action", "tasks", "rationale"]);
        for record in &self.records {
            let tasks: Vec<String> = record
                .task_ids
                .iter()
                .map(|id| short_id(&id.to_string()).to_owned())
                .collect();
            table.add_row(vec![
                Cell::new(record.recorded_at.format("%Y-%m-%d %H:%M")),
                Cell::new(record.night),
                action_cell(record.action),
                Cell::new(tasks.join(", ")),
                Cell::new(truncate(&record.rationale, 70)),
            ]);
        }
        format!(
            "Compression log for '{}'\n{}",
            self.move_name,
            render_list("record", &table, self.records.len())
        )
    }
}

pub async fn execute(args: LogArgs, config: &Config, json_mode: bool) -> Result<()> {
    let repo = open_repository(config).await?;
    let move_id = resolve_move_id(repo.as_ref(), &args.move_id).await?;
    let plan = repo.load(move_id).await?;

    let records: Vec<CompressionRecord> = match args.task {
        Some(prefix) => {
            let task_id = resolve_task_id(&plan, &prefix)?;
            plan.compression_log.for_task(task_id).cloned().collect()
        }
        None => plan.compression_log.iter().cloned().collect(),
    };

    output(
        &LogOutput {
            move_id: plan.id.to_string(),
            move_name: plan.name.clone(),
            records,
        },
        json_mode,
    );
    Ok(())
}
