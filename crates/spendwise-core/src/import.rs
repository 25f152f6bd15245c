//! Statement CSV ingestion
//!
//! Expected header (column order is free, a leading UTF-8 BOM is tolerated):
//!
//! ```text
//! UserId,YearMonth,transactions.id,transactions.date,transactions.vendor,
//! transactions.category,transactions.amount,transactions.currency,
//! transactions.recurring,transactions.type,transactions.location,
//! transactions.description
//! ```
//!
//! Rows that cannot be normalized are skipped and reported back; they never
//! fail the whole batch. Transactions are grouped by user and by the month
//! of their own date.

use std::collections::HashMap;
use std::io::Read;
use std::str::FromStr;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::models::{GroupKey, Transaction, TransactionGroup, YearMonth};

/// A raw statement row, before normalization
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatementRow {
    #[serde(rename = "UserId", default)]
    pub user_id: String,
    #[serde(rename = "YearMonth", default)]
    pub year_month: String,
    #[serde(rename = "transactions.id", default)]
    pub id: String,
    #[serde(rename = "transactions.date", default)]
    pub date: String,
    #[serde(rename = "transactions.vendor", default)]
    pub vendor: String,
    #[serde(rename = "transactions.category", default)]
    pub category: String,
    #[serde(rename = "transactions.amount", default)]
    pub amount: String,
    #[serde(rename = "transactions.currency", default)]
    pub currency: String,
    #[serde(rename = "transactions.recurring", default)]
    pub recurring: String,
    #[serde(rename = "transactions.type", default)]
    pub transaction_type: String,
    #[serde(rename = "transactions.location", default)]
    pub location: String,
    #[serde(rename = "transactions.description", default)]
    pub description: String,
}

/// A row that was skipped during ingestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MalformedRow {
    /// 1-based line in the source file (the header is line 1)
    pub line: u64,
    pub reason: String,
}

/// Result of ingesting one statement
#[derive(Debug, Clone, Default)]
pub struct IngestBatch {
    /// Groups in order of first appearance
    pub groups: Vec<TransactionGroup>,
    pub skipped: Vec<MalformedRow>,
}

impl IngestBatch {
    pub fn transaction_count(&self) -> usize {
        self.groups.iter().map(|g| g.transactions().len()).sum()
    }
}

/// Parse a statement CSV into (user, period) groups
pub fn parse_statement<R: Read>(reader: R) -> Result<IngestBatch> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers: StringRecord = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}'))
        .collect();
    rdr.set_headers(headers.clone());

    let mut order: Vec<GroupKey> = Vec::new();
    let mut grouped: HashMap<GroupKey, Vec<Transaction>> = HashMap::new();
    let mut skipped = Vec::new();

    for (index, result) in rdr.records().enumerate() {
        // Header is line 1, so the first record is line 2
        let fallback_line = index as u64 + 2;

        let record = match result {
            Ok(record) => record,
            Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => return Err(e.into()),
            Err(e) => {
                debug!("Skipping unreadable row {}: {}", fallback_line, e);
                skipped.push(MalformedRow {
                    line: fallback_line,
                    reason: e.to_string(),
                });
                continue;
            }
        };
        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(fallback_line);

        let normalized = record
            .deserialize::<StatementRow>(Some(&headers))
            .map_err(|e| Error::MalformedTransaction {
                row: line as usize,
                reason: e.to_string(),
            })
            .and_then(|row| normalize_row(&row, line));

        match normalized {
            Ok((user_id, tx)) => {
                let key = GroupKey::new(user_id, tx.period());
                if !grouped.contains_key(&key) {
                    order.push(key.clone());
                }
                grouped.entry(key).or_default().push(tx);
            }
            Err(Error::MalformedTransaction { reason, .. }) => {
                debug!("Skipping malformed row {}: {}", line, reason);
                skipped.push(MalformedRow { line, reason });
            }
            Err(e) => return Err(e),
        }
    }

    let groups: Vec<TransactionGroup> = order
        .into_iter()
        .map(|key| {
            let transactions = grouped.remove(&key).unwrap_or_default();
            TransactionGroup::new(key, transactions)
        })
        .collect();

    info!(
        "Ingested {} groups, {} malformed rows skipped",
        groups.len(),
        skipped.len()
    );

    Ok(IngestBatch { groups, skipped })
}

/// Normalize a raw row into (user id, transaction)
pub fn normalize_row(row: &StatementRow, line: u64) -> Result<(String, Transaction)> {
    let malformed = |reason: String| Error::MalformedTransaction {
        row: line as usize,
        reason,
    };
    let required = |value: &str, field: &str| -> Result<String> {
        if value.is_empty() {
            Err(malformed(format!("missing {}", field)))
        } else {
            Ok(value.to_string())
        }
    };

    let user_id = required(&row.user_id, "UserId")?;
    let id = required(&row.id, "transactions.id")?;
    let date = parse_date(&required(&row.date, "transactions.date")?).map_err(malformed)?;
    let amount = parse_amount(&required(&row.amount, "transactions.amount")?).map_err(malformed)?;
    let vendor = required(&row.vendor, "transactions.vendor")?;
    let category = required(&row.category, "transactions.category")?;
    let currency = required(&row.currency, "transactions.currency")?;
    let transaction_type = required(&row.transaction_type, "transactions.type")?;
    let location = required(&row.location, "transactions.location")?;

    let period = YearMonth::from_date(date).map_err(|e| malformed(e.to_string()))?;
    if !row.year_month.is_empty() && row.year_month != period.to_string() {
        warn!(
            "Row {}: YearMonth column '{}' disagrees with date {}, grouping under {}",
            line, row.year_month, date, period
        );
    }

    let description = Some(row.description.clone()).filter(|d| !d.is_empty());

    Ok((
        user_id,
        Transaction {
            id,
            date,
            vendor,
            category,
            amount,
            currency,
            recurring: row.recurring.eq_ignore_ascii_case("true"),
            transaction_type,
            location,
            description,
        },
    ))
}

/// Parse a date string, ISO form first
fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    let s = s.trim();

    let formats = [
        "%Y-%m-%d", // 2024-01-15
        "%Y/%m/%d", // 2024/01/15
        "%m/%d/%Y", // 01/15/2024
    ];

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    Err(format!("Unable to parse date: {}", s))
}

/// Largest absolute amount accepted on a statement row
///
/// Keeps every sum and projection over a batch well inside `Decimal` range.
pub const MAX_ABS_AMOUNT: i64 = 1_000_000_000_000_000;

/// Parse an amount string into an exact decimal, handling currency symbols and commas
fn parse_amount(s: &str) -> std::result::Result<Decimal, String> {
    let cleaned: String = s.trim().replace(['$', ',', ' '], "");

    let amount =
        Decimal::from_str(&cleaned).map_err(|_| format!("Unable to parse amount: {}", s))?;
    if amount.abs() > Decimal::from(MAX_ABS_AMOUNT) {
        return Err(format!("Amount out of range: {}", s));
    }
    Ok(amount)
}
