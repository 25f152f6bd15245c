//! File-backed history store
//!
//! Directory structure:
//! ```text
//! history/
//!   {user_id}/
//!     202401.json
//!     202402.json
//! ```
//!
//! Each file holds one [`HistoryRecord`]. Writes go through a temp file in
//! the same directory and are renamed into place.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use super::{validate_user_id, HistoricalStore};
use crate::error::{Error, Result};
use crate::models::{Transaction, YearMonth};

/// One user's transactions for one month
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub user_id: String,
    pub year_month: YearMonth,
    pub transactions: Vec<Transaction>,
}

pub struct JsonHistoryStore {
    root: PathBuf,
}

impl JsonHistoryStore {
    /// Create a store rooted at `root`; the directory is created on first append
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn user_dir(&self, user_id: &str) -> Result<PathBuf> {
        validate_user_id(user_id)?;
        Ok(self.root.join(user_id))
    }
}

#[async_trait]
impl HistoricalStore for JsonHistoryStore {
    fn name(&self) -> &str {
        "json"
    }

    async fn fetch(&self, user_id: &str) -> Result<Vec<Transaction>> {
        let dir = self.user_dir(user_id)?;
        run_blocking(move || read_user_history(&dir)).await
    }

    async fn append(&self, user_id: &str, transactions: &[Transaction]) -> Result<usize> {
        let dir = self.user_dir(user_id)?;
        let user_id = user_id.to_string();
        let transactions = transactions.to_vec();
        run_blocking(move || append_user_history(&dir, &user_id, transactions)).await
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Store(format!("History task failed: {}", e)))?
}

/// Month files in `dir`, oldest first
fn list_periods(dir: &Path) -> Result<BTreeMap<YearMonth, PathBuf>> {
    let mut periods = BTreeMap::new();

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(periods),
        Err(e) => return Err(e.into()),
    };

    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        match stem.parse::<YearMonth>() {
            Ok(period) => {
                periods.insert(period, path);
            }
            Err(_) => warn!("Ignoring unexpected history file: {}", path.display()),
        }
    }

    Ok(periods)
}

fn read_record(path: &Path) -> Result<HistoryRecord> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Store(format!(
            "Corrupt history file {}: {}",
            path.display(),
            e
        ))
    })
}

fn write_record(dir: &Path, record: &HistoryRecord) -> Result<()> {
    let path = dir.join(format!("{}.json", record.year_month));
    let mut tmp = NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut tmp, record)?;
    tmp.write_all(b"\n")?;
    tmp.persist(&path).map_err(|e| {
        Error::Store(format!("Failed to write {}: {}", path.display(), e.error))
    })?;
    Ok(())
}

fn read_user_history(dir: &Path) -> Result<Vec<Transaction>> {
    let mut transactions = Vec::new();
    for path in list_periods(dir)?.values() {
        transactions.extend(read_record(path)?.transactions);
    }
    debug!(
        "Loaded {} historical transactions from {}",
        transactions.len(),
        dir.display()
    );
    Ok(transactions)
}

fn append_user_history(dir: &Path, user_id: &str, transactions: Vec<Transaction>) -> Result<usize> {
    let existing = list_periods(dir)?;

    let mut records: BTreeMap<YearMonth, HistoryRecord> = BTreeMap::new();
    for (period, path) in &existing {
        records.insert(*period, read_record(path)?);
    }

    let mut seen: HashSet<String> = records
        .values()
        .flat_map(|r| r.transactions.iter().map(|tx| tx.id.clone()))
        .collect();

    let mut touched: HashSet<YearMonth> = HashSet::new();
    let mut added = 0;
    for tx in transactions {
        if !seen.insert(tx.id.clone()) {
            continue;
        }
        let period = YearMonth::from_date(tx.date).map_err(|e| {
            Error::Store(format!("Cannot record transaction {}: {}", tx.id, e))
        })?;
        records
            .entry(period)
            .or_insert_with(|| HistoryRecord {
                user_id: user_id.to_string(),
                year_month: period,
                transactions: Vec::new(),
            })
            .transactions
            .push(tx);
        touched.insert(period);
        added += 1;
    }

    if added == 0 {
        return Ok(0);
    }

    fs::create_dir_all(dir)?;
    for record in records.values().filter(|r| touched.contains(&r.year_month)) {
        write_record(dir, record)?;
    }

    info!(
        "Appended {} transactions to {} ({} months)",
        added,
        dir.display(),
        touched.len()
    );
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn tx(id: &str, date: &str) -> Transaction {
        Transaction {
            id: id.to_string(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            vendor: "Vendor".into(),
            category: "Misc".into(),
            amount: dec!(12.50),
            currency: "USD".into(),
            recurring: false,
            transaction_type: "debit".into(),
            location: "US-WA-Seattle".into(),
            description: Some("note".into()),
        }
    }

    #[tokio::test]
    async fn test_missing_directory_is_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonHistoryStore::new(dir.path().join("does-not-exist"));
        assert!(store.fetch("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_then_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonHistoryStore::new(dir.path());

        let added = store
            .append(
                "u1",
                &[tx("c", "2024-03-02"), tx("a", "2024-01-10"), tx("b", "2024-01-11")],
            )
            .await
            .unwrap();
        assert_eq!(added, 3);
        assert!(dir.path().join("u1").join("202401.json").exists());
        assert!(dir.path().join("u1").join("202403.json").exists());

        let history = store.fetch("u1").await.unwrap();
        let ids: Vec<&str> = history.iter().map(|tx| tx.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(history[0], tx("a", "2024-01-10"));
    }

    #[tokio::test]
    async fn test_append_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonHistoryStore::new(dir.path());
        let batch = [tx("a", "2024-01-10"), tx("b", "2024-02-11")];

        assert_eq!(store.append("u1", &batch).await.unwrap(), 2);
        assert_eq!(store.append("u1", &batch).await.unwrap(), 0);
        assert_eq!(store.fetch("u1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonHistoryStore::new(dir.path());
        store.append("u1", &[tx("a", "2024-01-10")]).await.unwrap();

        assert!(store.fetch("u2").await.unwrap().is_empty());
        // Same id under another user is a different transaction
        assert_eq!(store.append("u2", &[tx("a", "2024-01-10")]).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_rejects_path_like_user_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonHistoryStore::new(dir.path());
        assert!(matches!(
            store.fetch("../escape").await,
            Err(Error::Store(_))
        ));
    }

    #[tokio::test]
    async fn test_append_rejects_years_beyond_four_digits() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonHistoryStore::new(dir.path());
        let mut far = tx("far", "2024-03-01");
        far.date = NaiveDate::from_ymd_opt(12345, 3, 1).unwrap();

        let result = store.append("u1", &[tx("a", "2024-01-10"), far]).await;
        assert!(matches!(result, Err(Error::Store(_))));
        // Nothing was written for the batch
        assert!(!dir.path().join("u1").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let user_dir = dir.path().join("u1");
        fs::create_dir_all(&user_dir).unwrap();
        fs::write(user_dir.join("202401.json"), "{not json").unwrap();
        fs::write(user_dir.join("notes.txt"), "ignored").unwrap();

        let store = JsonHistoryStore::new(dir.path());
        assert!(matches!(store.fetch("u1").await, Err(Error::Store(_))));
    }
}
