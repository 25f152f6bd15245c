//! Config command implementation

use std::path::Path;

use anyhow::{Context, Result};
use spendwise_core::config::default_config_path;
use spendwise_core::AnalysisConfig;

pub fn cmd_config(config_path: Option<&Path>, history_dir: &Path) -> Result<()> {
    let config = AnalysisConfig::load(config_path).context("Failed to load analysis config")?;

    let source = match config_path {
        Some(path) => path.display().to_string(),
        None => match default_config_path() {
            Some(path) if path.exists() => path.display().to_string(),
            _ => "built-in defaults".to_string(),
        },
    };

    println!("⚙️  Analysis config");
    println!("   Source: {}", source);
    println!("   History: {}", history_dir.display());
    println!();
    println!("   high_value_limit      = {}", config.high_value_limit);
    println!("   max_concurrent_groups = {}", config.max_concurrent_groups);
    println!("   append_history        = {}", config.append_history);
    println!("   report_decimal_places = {}", config.report_decimal_places);

    Ok(())
}
