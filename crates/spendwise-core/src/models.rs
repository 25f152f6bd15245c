//! Domain models for Spendwise

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ========== Periods ==========

/// A calendar month, written as a 6-digit `YYYYMM` key
///
/// Ordering is chronological, which matches the ordering of the key strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(0..=9999).contains(&year) {
            return Err(Error::InvalidPeriod(format!("year {} out of range", year)));
        }
        if !(1..=12).contains(&month) {
            return Err(Error::InvalidPeriod(format!(
                "month {} out of range in {:04}{:02}",
                month, year, month
            )));
        }
        Ok(Self { year, month })
    }

    /// Truncate a date to its year-month, rejecting years that do not fit in four digits
    pub fn from_date(date: NaiveDate) -> Result<Self> {
        Self::new(date.year(), date.month())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The month before this one (January wraps to December of the prior year)
    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl std::str::FromStr for YearMonth {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidPeriod(format!(
                "expected 6-digit YYYYMM, got '{}'",
                s
            )));
        }
        // Both slices are ASCII digits, so the parses cannot overflow
        let year: i32 = s[..4]
            .parse()
            .map_err(|_| Error::InvalidPeriod(s.to_string()))?;
        let month: u32 = s[4..]
            .parse()
            .map_err(|_| Error::InvalidPeriod(s.to_string()))?;
        Self::new(year, month)
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}{:02}", self.year, self.month)
    }
}

impl TryFrom<String> for YearMonth {
    type Error = Error;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

// ========== Transactions ==========

/// A normalized transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique within a user's history
    pub id: String,
    pub date: NaiveDate,
    pub vendor: String,
    pub category: String,
    pub amount: Decimal,
    pub currency: String,
    pub recurring: bool,
    #[serde(rename = "type")]
    pub transaction_type: String,
    /// Two-letter country prefix or a hyphen-delimited location (e.g. "US-NY-New York")
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Transaction {
    /// The period this transaction belongs to, derived from its date
    ///
    /// Does not range-check the year. Ingestion and the file store reject
    /// dates outside `0000..=9999` through [`YearMonth::from_date`].
    pub fn period(&self) -> YearMonth {
        YearMonth {
            year: self.date.year(),
            month: self.date.month(),
        }
    }
}

/// Identifies one (user, period) group
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    pub user_id: String,
    pub period: YearMonth,
}

impl GroupKey {
    pub fn new(user_id: impl Into<String>, period: YearMonth) -> Self {
        Self {
            user_id: user_id.into(),
            period,
        }
    }
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "user {} ({})", self.user_id, self.period)
    }
}

/// The current-period transactions of one user, as delivered by one ingestion batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionGroup {
    key: GroupKey,
    transactions: Vec<Transaction>,
}

impl TransactionGroup {
    pub fn new(key: GroupKey, transactions: Vec<Transaction>) -> Self {
        Self { key, transactions }
    }

    pub fn key(&self) -> &GroupKey {
        &self.key
    }

    pub fn user_id(&self) -> &str {
        &self.key.user_id
    }

    pub fn period(&self) -> YearMonth {
        self.key.period
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }
}

// ========== Risk ==========

/// Risk tier assigned to a transaction made outside the home country
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "High Risk")]
    High,
    #[serde(rename = "Moderate Risk")]
    Moderate,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "High Risk",
            Self::Moderate => "Moderate Risk",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A transaction flagged by the risk classifier
///
/// Carries everything a renderer needs, so geography never has to be resolved twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlaggedTransaction {
    pub transaction_id: String,
    pub amount: Decimal,
    /// Historical average the amount was compared against
    pub historical_average: Decimal,
    /// Resolved country of the transaction
    pub location: String,
    pub risk_level: RiskLevel,
    pub home_country: String,
    pub category: String,
    pub vendor: String,
    pub date: NaiveDate,
}

impl FlaggedTransaction {
    /// Human-readable reasons this transaction was flagged
    pub fn reasons(&self) -> Vec<String> {
        let mut reasons = Vec::new();
        if self.location != self.home_country {
            reasons.push(format!(
                "it was performed in {}, whereas most transactions are done in {}.",
                self.location, self.home_country
            ));
        }
        if self.amount > self.historical_average {
            reasons.push(format!(
                "the amount of ${} exceeds the historical average spending of ${}.",
                format_amount(self.amount),
                format_amount(self.historical_average)
            ));
        }
        reasons
    }
}

/// A transaction whose location could not be mapped to a country
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedLocation {
    pub transaction_id: String,
    pub location: String,
}

/// A current-period transaction above the historical average
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighValueTransaction {
    pub transaction_id: String,
    pub amount: Decimal,
    pub vendor: String,
    pub category: String,
    pub date: NaiveDate,
    pub location: String,
}

// ========== Trends ==========

/// Month-over-month direction of spending over the three most recent months
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendLabel {
    Up,
    Down,
    Stable,
    #[serde(rename = "Not enough data")]
    NotEnoughData,
}

impl TrendLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "Up",
            Self::Down => "Down",
            Self::Stable => "Stable",
            Self::NotEnoughData => "Not enough data",
        }
    }
}

impl std::fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-month totals plus the trend label derived from them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySpendingTrend {
    pub monthly_spending: BTreeMap<YearMonth, Decimal>,
    pub trend: TrendLabel,
}

/// Year-to-date spend with a recurring vendor and its full-year projection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringProjection {
    pub vendor: String,
    pub observed: Decimal,
    pub projected: Decimal,
}

// ========== Report ==========

/// The analysis of one user's spending for one period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub user_id: String,
    pub year_month: YearMonth,
    pub spending_by_category: BTreeMap<String, Decimal>,
    pub previous_month_spending_by_category: BTreeMap<String, Decimal>,
    pub historical_average: Decimal,
    pub home_country: Option<String>,
    pub flagged_transactions: Vec<FlaggedTransaction>,
    pub unresolved_locations: Vec<UnresolvedLocation>,
    pub high_value_transactions: Vec<HighValueTransaction>,
    pub top_high_value_transactions: Vec<HighValueTransaction>,
    pub recurring_transactions_year_to_date: BTreeMap<String, Decimal>,
    pub recurring_projection: Vec<RecurringProjection>,
    pub monthly_spending_trend: MonthlySpendingTrend,
}

impl AnalysisReport {
    pub fn key(&self) -> GroupKey {
        GroupKey::new(self.user_id.clone(), self.year_month)
    }

    /// Total spending in the report's own period
    pub fn total_spending(&self) -> Decimal {
        self.spending_by_category.values().copied().sum()
    }
}

/// Round an amount for report output (half away from zero)
pub fn round_amount(value: Decimal, decimal_places: u32) -> Decimal {
    value.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointAwayFromZero)
}

/// Format an amount as dollars and cents, rounding rather than truncating
pub fn format_amount(value: Decimal) -> String {
    format!("{:.2}", round_amount(value, 2))
}
