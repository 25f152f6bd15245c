//! Historical transaction stores
//!
//! # Architecture
//!
//! - `HistoricalStore` trait defines the interface for history backends
//! - `MemoryHistoryStore` keeps history in memory (tests, one-off runs)
//! - `JsonHistoryStore` keeps one JSON file per user per month on disk
//!
//! A user with no recorded history is an empty sequence, never an error.

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::Transaction;

mod json_file;
mod memory;

pub use json_file::{HistoryRecord, JsonHistoryStore};
pub use memory::MemoryHistoryStore;

/// Source of each user's previously recorded transactions
#[async_trait]
pub trait HistoricalStore: Send + Sync {
    /// Human-readable name for this store
    fn name(&self) -> &str;

    /// All recorded transactions for `user_id`, oldest period first
    ///
    /// Order within a period is the order the transactions were appended.
    async fn fetch(&self, user_id: &str) -> Result<Vec<Transaction>>;

    /// Record transactions for `user_id`
    ///
    /// Transactions whose id is already recorded for the user are skipped.
    /// Returns the number actually added.
    async fn append(&self, user_id: &str, transactions: &[Transaction]) -> Result<usize>;
}

/// Reject user ids that cannot safely be used as a storage key
pub(crate) fn validate_user_id(user_id: &str) -> Result<()> {
    let invalid = user_id.is_empty()
        || user_id == "."
        || user_id == ".."
        || user_id.chars().any(|c| matches!(c, '/' | '\\' | '\0'));
    if invalid {
        return Err(Error::Store(format!("Invalid user id: {:?}", user_id)));
    }
    Ok(())
}
