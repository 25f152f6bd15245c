//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::path::{Path, PathBuf};

use rust_decimal_macros::dec;
use spendwise_core::{AnalysisReport, HistoricalStore, JsonHistoryStore};

use crate::commands::{self, truncate};

const HEADER: &str = "UserId,YearMonth,transactions.id,transactions.date,transactions.vendor,transactions.category,transactions.amount,transactions.currency,transactions.recurring,transactions.type,transactions.location,transactions.description";

/// Write a statement CSV into `dir` and return its path
fn write_statement(dir: &Path, name: &str, rows: &[&str]) -> PathBuf {
    let mut csv = String::from(HEADER);
    for row in rows {
        csv.push('\n');
        csv.push_str(row);
    }
    let path = dir.join(name);
    std::fs::write(&path, csv).unwrap();
    path
}

fn history_rows() -> Vec<&'static str> {
    vec![
        "u1,202401,h1,2024-01-05,Grocer,Groceries,100.00,USD,false,debit,US,",
        "u1,202402,h2,2024-02-05,Grocer,Groceries,100.00,USD,false,debit,US-NY-New York,",
        "u1,202402,h3,2024-02-18,Poutine Place,Dining,50.00,CAD,false,debit,CA,",
    ]
}

// ========== Helper Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("exactly ten", 11), "exactly ten");
    assert_eq!(truncate("a long vendor name", 10), "a long ...");
    assert_eq!(truncate("Café Münchén", 6), "Caf...");
}

#[test]
fn test_history_dir_prefers_explicit_path() {
    let explicit = Path::new("/tmp/spendwise-history");
    assert_eq!(commands::history_dir(Some(explicit)), explicit);
}

// ========== History Command Tests ==========

#[tokio::test]
async fn test_cmd_history_import_and_show() {
    let dir = tempfile::tempdir().unwrap();
    let history_dir = dir.path().join("history");
    let file = write_statement(dir.path(), "history.csv", &history_rows());

    commands::cmd_history_import(&history_dir, &file).await.unwrap();
    // Importing again adds nothing
    commands::cmd_history_import(&history_dir, &file).await.unwrap();

    let store = JsonHistoryStore::new(&history_dir);
    assert_eq!(store.fetch("u1").await.unwrap().len(), 3);

    assert!(commands::cmd_history_show(&history_dir, "u1").await.is_ok());
    assert!(commands::cmd_history_show(&history_dir, "nobody").await.is_ok());
}

#[tokio::test]
async fn test_cmd_history_import_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result =
        commands::cmd_history_import(&dir.path().join("history"), &dir.path().join("nope.csv"))
            .await;
    assert!(result.is_err());
}

// ========== Analyze Command Tests ==========

#[tokio::test]
async fn test_cmd_analyze_writes_reports() {
    let dir = tempfile::tempdir().unwrap();
    let history_dir = dir.path().join("history");
    let out_dir = dir.path().join("reports");

    let history = write_statement(dir.path(), "history.csv", &history_rows());
    commands::cmd_history_import(&history_dir, &history).await.unwrap();

    let current = write_statement(
        dir.path(),
        "march.csv",
        &["u1,202403,c1,2024-03-02,Air Canada,Travel,200.00,CAD,false,debit,CA,"],
    );
    commands::cmd_analyze(&history_dir, None, &current, &out_dir, false, false)
        .await
        .unwrap();

    let path = out_dir.join("user_u1_report_202403.json");
    let report: AnalysisReport =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(report.historical_average, dec!(83.33));
    assert_eq!(report.home_country.as_deref(), Some("United States"));
    assert_eq!(report.flagged_transactions.len(), 1);
    assert_eq!(report.flagged_transactions[0].risk_level.as_str(), "High Risk");

    // Analyzed transactions were recorded
    let store = JsonHistoryStore::new(&history_dir);
    assert_eq!(store.fetch("u1").await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_cmd_analyze_no_append_leaves_history() {
    let dir = tempfile::tempdir().unwrap();
    let history_dir = dir.path().join("history");
    let current = write_statement(
        dir.path(),
        "march.csv",
        &["u2,202403,c1,2024-03-02,Cafe,Dining,5.00,USD,false,debit,US,"],
    );

    commands::cmd_analyze(
        &history_dir,
        None,
        &current,
        &dir.path().join("reports"),
        true,
        true,
    )
    .await
    .unwrap();

    let store = JsonHistoryStore::new(&history_dir);
    assert!(store.fetch("u2").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cmd_analyze_fails_when_a_group_fails() {
    let dir = tempfile::tempdir().unwrap();
    // Reports cannot be written under a regular file
    let blocked = dir.path().join("reports");
    std::fs::write(&blocked, "").unwrap();
    let current = write_statement(
        dir.path(),
        "march.csv",
        &["u3,202403,c1,2024-03-02,Cafe,Dining,5.00,USD,false,debit,US,"],
    );

    let result = commands::cmd_analyze(
        &dir.path().join("history"),
        None,
        &current,
        &blocked,
        false,
        false,
    )
    .await;

    let err = result.unwrap_err();
    assert!(err.to_string().contains("1 of 1 groups failed"));
}

#[tokio::test]
async fn test_cmd_analyze_with_explicit_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("analysis.toml");
    std::fs::write(&config, "high_value_limit = 1\nappend_history = false\n").unwrap();

    let current = write_statement(
        dir.path(),
        "march.csv",
        &[
            "u4,202403,a,2024-03-02,Shop,Misc,10.00,USD,false,debit,US,",
            "u4,202403,b,2024-03-03,Shop,Misc,20.00,USD,false,debit,US,",
        ],
    );
    let out_dir = dir.path().join("reports");
    commands::cmd_analyze(
        &dir.path().join("history"),
        Some(config.as_path()),
        &current,
        &out_dir,
        false,
        false,
    )
    .await
    .unwrap();

    let report: AnalysisReport = serde_json::from_str(
        &std::fs::read_to_string(out_dir.join("user_u4_report_202403.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(report.high_value_transactions.len(), 2);
    assert_eq!(report.top_high_value_transactions.len(), 1);
    assert_eq!(report.top_high_value_transactions[0].transaction_id, "b");
    assert!(!dir.path().join("history").join("u4").exists());
}

// ========== Config Command Tests ==========

#[test]
fn test_cmd_config_rejects_invalid_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("analysis.toml");
    std::fs::write(&config, "max_concurrent_groups = 0\n").unwrap();

    assert!(commands::cmd_config(Some(config.as_path()), dir.path()).is_err());
}
