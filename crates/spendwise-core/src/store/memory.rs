//! In-memory history store

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{validate_user_id, HistoricalStore};
use crate::error::Result;
use crate::models::Transaction;

/// In-memory history, keyed by user id
#[derive(Default)]
pub struct MemoryHistoryStore {
    history: Mutex<HashMap<String, Vec<Transaction>>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user's history (builder style)
    pub fn with_history(self, user_id: impl Into<String>, transactions: Vec<Transaction>) -> Self {
        let mut history = self.history.into_inner();
        history.entry(user_id.into()).or_default().extend(transactions);
        Self {
            history: Mutex::new(history),
        }
    }
}

#[async_trait]
impl HistoricalStore for MemoryHistoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch(&self, user_id: &str) -> Result<Vec<Transaction>> {
        let history = self.history.lock().await;
        let mut transactions = history.get(user_id).cloned().unwrap_or_default();
        // Stable sort keeps append order within a period
        transactions.sort_by_key(|tx| tx.period());
        Ok(transactions)
    }

    async fn append(&self, user_id: &str, transactions: &[Transaction]) -> Result<usize> {
        validate_user_id(user_id)?;
        let mut history = self.history.lock().await;
        let existing = history.entry(user_id.to_string()).or_default();

        let mut seen: HashSet<String> = existing.iter().map(|tx| tx.id.clone()).collect();
        let mut added = 0;
        for tx in transactions {
            if seen.insert(tx.id.clone()) {
                existing.push(tx.clone());
                added += 1;
            }
        }
        Ok(added)
    }
}
