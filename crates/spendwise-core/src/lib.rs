//! Spendwise Core Library
//!
//! Monthly spending analysis over statement batches:
//! - CSV statement ingestion, grouped by user and month
//! - Exact-decimal spending aggregation
//! - Geography resolution and home-country detection
//! - Risk flagging of transactions made abroad
//! - Monthly trend classification and recurring-vendor projection
//! - Report assembly and publishing
//! - Pluggable historical stores
//! - Concurrent batch pipeline with per-group failure isolation

pub mod aggregate;
pub mod analysis;
pub mod config;
pub mod error;
pub mod geo;
pub mod import;
pub mod models;
pub mod pipeline;
pub mod publish;
pub mod report;
pub mod risk;
pub mod store;
pub mod trend;

pub use analysis::analyze_group;
pub use config::AnalysisConfig;
pub use error::{Error, Result};
pub use import::{parse_statement, IngestBatch, MalformedRow};
pub use models::{
    AnalysisReport, FlaggedTransaction, GroupKey, HighValueTransaction, MonthlySpendingTrend,
    RecurringProjection, RiskLevel, Transaction, TransactionGroup, TrendLabel,
    UnresolvedLocation, YearMonth,
};
pub use models::{format_amount, round_amount};
pub use pipeline::{FailureStage, GroupFailure, Pipeline, PipelineOutcome, PublishedReport};
pub use publish::{JsonFilePublisher, MemoryPublisher, ReportPublisher};
pub use report::ReportAssembler;
pub use store::{HistoricalStore, JsonHistoryStore, MemoryHistoryStore};
