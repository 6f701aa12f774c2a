//! Implementation of the `taskpress check` command.

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;

use crate::cli::id_resolver::resolve_move_id;
use crate::cli::output::{output, short_id, CommandOutput};
use crate::cli::{as_of_or_today, open_protocol};
use crate::domain::models::{CompressionAction, CompressionResult, Config, RecoveryOption};

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Move ID or unique prefix
    pub move_id: String,

    /// Evaluate as of this date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, serde::Serialize)]
pub struct CheckOutput {
    pub move_id: String,
    pub as_of: NaiveDate,
    #[serde(flatten)]
    pub result: CompressionResult,
}

/// One line per decision, shared with the batch output.
pub fn describe_actions(actions: &[CompressionAction]) -> Vec<String> {
    actions
        .iter()
        .map(|a| {
            let tasks: Vec<String> = a
                .task_ids
                .iter()
                .map(|id| short_id(&id.to_string()).to_owned())
                .collect();
            format!("  - {}: {} [{}]", a.action, a.rationale, tasks.join(", "))
        })
        .collect()
}

impl CommandOutput for CheckOutput {
    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        match &self.result {
            CompressionResult::NoAction => {
                lines.push(format!(
                    "No action needed for move {} as of {}.",
                    short_id(&self.move_id),
                    self.as_of
                ));
            }
            CompressionResult::CompressionApplied { actions } => {
                lines.push(format!("{} decision(s) taken:", actions.len()));
                lines.extend(describe_actions(actions));
            }
            CompressionResult::MoveAborted { actions, payload } => {
                if !actions.is_empty() {
                    lines.push(format!("{} decision(s) taken:", actions.len()));
                    lines.extend(describe_actions(actions));
                }
                lines.push(format!("Move aborted: {}", payload.message));
                let options: Vec<&str> = payload.options.iter().map(RecoveryOption::as_str).collect();
                lines.push(format!("Options: {}", options.join(", ")));
            }
        }
        lines.join("\n")
    }
}

pub async fn execute(args: CheckArgs, config: &Config, json_mode: bool) -> Result<()> {
    let protocol = open_protocol(config).await?;
    let move_id = resolve_move_id(protocol.repository().as_ref(), &args.move_id).await?;
    let as_of = as_of_or_today(args.as_of);

    let result = protocol.run_nightly_check(move_id, as_of).await?;

    output(
        &CheckOutput {
            move_id: move_id.to_string(),
            as_of,
            result,
        },
        json_mode,
    );
    Ok(())
}
