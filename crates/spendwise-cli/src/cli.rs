//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Spendwise - Monthly spending analysis for statement batches
#[derive(Parser)]
#[command(name = "spendwise")]
#[command(about = "Analyze monthly spending, flag risky transactions, project recurring costs", long_about = None)]
#[command(version)]
pub struct Cli {
    /// History directory (defaults to the platform data directory)
    #[arg(long, global = true)]
    pub history: Option<PathBuf>,

    /// Analysis config file (defaults to the data dir override, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a statement CSV and publish one report per user and month
    Analyze {
        /// Statement CSV file
        #[arg(short, long)]
        file: PathBuf,

        /// Directory for published reports
        #[arg(short, long, default_value = "reports")]
        out: PathBuf,

        /// Do not record analyzed transactions in history
        #[arg(long)]
        no_append: bool,

        /// Print the run outcome as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Inspect or seed the transaction history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Show the effective analysis config
    Config,
}

#[derive(Subcommand)]
pub enum HistoryAction {
    /// Record a statement CSV as history without analyzing it
    Import {
        /// Statement CSV file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Show a user's recorded history by month
    Show {
        /// User id
        #[arg(short, long)]
        user: String,
    },
}
