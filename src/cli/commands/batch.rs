//! Implementation of the `taskpress batch` command.

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use std::sync::Arc;
use tracing::warn;

use crate::cli::commands::check::describe_actions;
use crate::cli::output::{output, short_id, CommandOutput};
use crate::cli::{as_of_or_today, open_protocol};
use crate::domain::models::{CompressionResult, Config};
use crate::services::{BatchReport, NightlyBatch};

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Evaluate as of this date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, serde::Serialize)]
pub struct BatchOutput {
    #[serde(flatten)]
    pub report: BatchReport,
}

impl CommandOutput for BatchOutput {
    fn to_human(&self) -> String {
        let report = &self.report;
        if report.total() == 0 {
            return "No active moves.".to_string();
        }

        let mut lines = vec![format!(
            "Checked {} move(s): {} ran, {} failed, {} skipped.",
            report.total(),
            report.runs.len(),
            report.failures.len(),
            report.skipped.len()
        )];
        for run in &report.runs {
            lines.push(format!("{} {}", short_id(&run.move_id.to_string()), run.result.as_str()));
            lines.extend(describe_actions(run.result.actions()));
            if let CompressionResult::MoveAborted { payload, .. } = &run.result {
                lines.push(format!("  {}", payload.message));
            }
        }
        for failure in &report.failures {
            lines.push(format!("{} error: {}", short_id(&failure.move_id.to_string()), failure.error));
        }
        lines.join("\n")
    }
}

pub async fn execute(args: BatchArgs, config: &Config, json_mode: bool) -> Result<()> {
    let protocol = Arc::new(open_protocol(config).await?);
    let batch = NightlyBatch::new(protocol, config.batch.clone());

    let handle = batch.handle();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, finishing moves already in progress");
            handle.stop();
        }
    });

    let report = batch.run(as_of_or_today(args.as_of)).await;
    ctrl_c.abort();

    output(&BatchOutput { report: report? }, json_mode);
    Ok(())
}
