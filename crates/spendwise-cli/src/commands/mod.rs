//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `analyze` - Statement analysis and report summaries
//! - `history` - History import and inspection
//! - `config` - Effective config display

pub mod analyze;
pub mod config;
pub mod history;

use std::path::{Path, PathBuf};

use spendwise_core::config::default_history_dir;

// Re-export command functions for main.rs
pub use analyze::*;
pub use config::*;
pub use history::*;

/// History directory from `--history`, or the platform default
pub fn history_dir(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(default_history_dir)
}

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
