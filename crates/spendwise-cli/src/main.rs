//! Spendwise CLI - Monthly spending analysis
//!
//! Usage:
//!   spendwise analyze --file CSV         Analyze a statement and publish reports
//!   spendwise history import --file CSV  Seed history from a statement
//!   spendwise history show --user ID     Show a user's history by month
//!   spendwise config                     Show the effective analysis config

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let history_dir = commands::history_dir(cli.history.as_deref());
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Analyze {
            file,
            out,
            no_append,
            json,
        } => {
            commands::cmd_analyze(&history_dir, config_path, &file, &out, no_append, json).await
        }
        Commands::History { action } => match action {
            HistoryAction::Import { file } => commands::cmd_history_import(&history_dir, &file).await,
            HistoryAction::Show { user } => commands::cmd_history_show(&history_dir, &user).await,
        },
        Commands::Config => commands::cmd_config(config_path, &history_dir),
    }
}
