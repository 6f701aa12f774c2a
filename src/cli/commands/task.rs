//! Task CLI commands.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::cli::id_resolver::{resolve_move_id, resolve_task_id};
use crate::cli::open_protocol;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, TaskStatus};
use crate::domain::ports::MoveRepository;

#[derive(Args, Debug)]
pub struct TaskArgs {
    #[command(subcommand)]
    pub command: TaskCommands,
}

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Mark a scheduled task as completed
    Complete {
        /// Move ID or unique prefix
        move_id: String,
        /// Task ID or unique prefix
        task_id: String,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct TaskActionOutput {
    pub success: bool,
    pub message: String,
    pub move_id: String,
    pub task_id: String,
    pub status: TaskStatus,
}

impl CommandOutput for TaskActionOutput {
    fn to_human(&self) -> String {
        self.message.clone()
    }
}

pub async fn execute(args: TaskArgs, config: &Config, json_mode: bool) -> Result<()> {
    let protocol = open_protocol(config).await?;

    match args.command {
        TaskCommands::Complete { move_id, task_id } => {
            let move_id = resolve_move_id(protocol.repository().as_ref(), &move_id).await?;
            let plan = protocol.repository().load(move_id).await?;
            let task_id = resolve_task_id(&plan, &task_id)?;

            let plan = protocol.complete_task(move_id, task_id).await?;
            let task = plan.require_task(task_id)?;

            output(
                &TaskActionOutput {
                    success: true,
                    message: format!("Completed '{}' (day {}).", task.title, task.day_number),
                    move_id: move_id.to_string(),
                    task_id: task_id.to_string(),
                    status: task.status,
                },
                json_mode,
            );
        }
    }

    Ok(())
}
