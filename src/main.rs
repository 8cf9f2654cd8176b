//! healmap CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

use healmap::cli::{self, Cli};
use healmap::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let json = cli.json;

    let config = match cli::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => return ExitCode::from(cli::handle_error(&err, json)),
    };

    // Held for the lifetime of the process so buffered file logs are flushed
    let _logger = match LoggerImpl::init(&LogConfig::from(&config.logging)) {
        Ok(logger) => logger,
        Err(err) => return ExitCode::from(cli::handle_error(&err, json)),
    };
    debug!(command = ?cli.command, "Starting healmap");

    match cli::run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => ExitCode::from(cli::handle_error(&err, json)),
    }
}
