//! Command-line front end over the pipeline.

pub mod commands;
pub mod output;
pub mod types;

use std::path::Path;

use anyhow::Result;
use console::style;
use serde::Serialize;

use crate::domain::models::{Config, CycleState};
use crate::infrastructure::config::ConfigLoader;

pub use types::{Cli, Commands, PlacementArgs};

/// Exit status for system errors
pub const EXIT_FAILURE: u8 = 1;

/// Exit status for a request whose generative step yielded no record
pub const EXIT_NO_STRUCTURED_RESULT: u8 = 2;

/// The model was called but no usable record came out of the cycle
#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[error("{detail}")]
pub struct NoStructuredResult {
    pub detail: String,
    pub state: CycleState,
}

/// Load configuration from `--config` or the project layering
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

/// Dispatch a parsed command line
pub async fn run(cli: Cli, config: Config) -> Result<()> {
    let json = cli.json;
    match cli.command {
        Commands::Index { force } => commands::index::execute(&config, force, json).await,
        Commands::Search { query, k } => commands::search::execute(&config, &query, k, json).await,
        Commands::Plan(args) => commands::generate::execute_plan(&config, args, json).await,
        Commands::Overview(args) => commands::generate::execute_overview(&config, args, json).await,
        Commands::Analysis(args) => commands::generate::execute_analysis(&config, args, json).await,
        Commands::Chunk { file, max_len } => {
            commands::chunk::execute(&config, &file, max_len, json).await
        }
    }
}

/// Report an error and pick the process exit status
pub fn handle_error(err: &anyhow::Error, json_mode: bool) -> u8 {
    if let Some(no_result) = err.downcast_ref::<NoStructuredResult>() {
        if json_mode {
            println!(
                "{}",
                serde_json::to_string_pretty(no_result).unwrap_or_default()
            );
        } else {
            eprintln!(
                "{} {} ({})",
                style("No structured result:").yellow().bold(),
                no_result.detail,
                no_result.state
            );
        }
        return EXIT_NO_STRUCTURED_RESULT;
    }

    if json_mode {
        let body = serde_json::json!({ "error": format!("{err:#}") });
        println!(
            "{}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );
    } else {
        eprintln!("{} {err:#}", style("Error:").red().bold());
    }
    EXIT_FAILURE
}
