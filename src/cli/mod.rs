//! Command-line interface.

pub mod commands;
pub mod id_resolver;
pub mod output;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::sync::Arc;

use crate::adapters::sqlite::{initialize_database, SqliteMoveRepository};
use crate::domain::models::Config;
use crate::domain::ports::{Clock, SystemClock};
use crate::services::CompressionProtocol;

use commands::{batch::BatchArgs, check::CheckArgs, init::InitArgs, log::LogArgs, moves::MoveArgs, task::TaskArgs};

#[derive(Parser, Debug)]
#[command(name = "taskpress")]
#[command(about = "Compress or drop missed tasks in time-boxed moves", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create .taskpress/ with a default config and database
    Init(InitArgs),
    /// Import, list and inspect moves
    Move(MoveArgs),
    /// Record task progress
    Task(TaskArgs),
    /// Run the nightly check for one move
    Check(CheckArgs),
    /// Run the nightly check for every active move
    Batch(BatchArgs),
    /// Show the compression log of a move
    Log(LogArgs),
}

/// Open the configured database as a move repository.
pub async fn open_repository(config: &Config) -> Result<Arc<SqliteMoveRepository>> {
    let pool = initialize_database(&config.database)
        .await
        .context("Failed to initialize database. Run 'taskpress init' first.")?;
    Ok(Arc::new(SqliteMoveRepository::new(pool)))
}

/// Protocol service over the configured database and the system clock.
pub async fn open_protocol(config: &Config) -> Result<CompressionProtocol> {
    let repo = open_repository(config).await?;
    Ok(CompressionProtocol::new(repo, Arc::new(SystemClock), &config.protocol))
}

/// The evaluation date: the given one, or today.
pub fn as_of_or_today(as_of: Option<NaiveDate>) -> NaiveDate {
    as_of.unwrap_or_else(|| SystemClock.today())
}

/// Print an error in the selected output mode and exit non-zero.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let chain: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();
        let body = serde_json::json!({
            "success": false,
            "error": err.to_string(),
            "causes": chain,
        });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}
