//! Error types for Spendwise

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed transaction at row {row}: {reason}")]
    MalformedTransaction { row: usize, reason: String },

    #[error("Unknown location: {0}")]
    UnknownLocation(String),

    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("History store error: {0}")]
    Store(String),

    #[error("Publish error: {0}")]
    Publish(String),
}

pub type Result<T> = std::result::Result<T, Error>;
