//! Report publishing
//!
//! A publisher persists a finished [`AnalysisReport`] somewhere and returns
//! where it went. The analysis never depends on which publisher is used.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::{Error, Result};
use crate::models::{AnalysisReport, YearMonth};

#[async_trait]
pub trait ReportPublisher: Send + Sync {
    /// Human-readable name for this publisher
    fn name(&self) -> &str;

    /// Persist a report, returning its location (path, key, ...)
    async fn publish(&self, report: &AnalysisReport) -> Result<String>;
}

/// File name for a user's report: `user_{id}_report_{YYYYMM}.json`
pub fn report_file_name(user_id: &str, period: YearMonth) -> String {
    format!("user_{}_report_{}.json", user_id, period)
}

/// Writes each report as pretty JSON into a directory
pub struct JsonFilePublisher {
    out_dir: PathBuf,
}

impl JsonFilePublisher {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }
}

#[async_trait]
impl ReportPublisher for JsonFilePublisher {
    fn name(&self) -> &str {
        "json"
    }

    async fn publish(&self, report: &AnalysisReport) -> Result<String> {
        if report.user_id.contains(['/', '\\']) {
            return Err(Error::Publish(format!(
                "User id cannot be used in a file name: {:?}",
                report.user_id
            )));
        }

        let path = self
            .out_dir
            .join(report_file_name(&report.user_id, report.year_month));
        let mut body = serde_json::to_vec_pretty(report)?;
        body.push(b'\n');

        tokio::fs::create_dir_all(&self.out_dir).await.map_err(|e| {
            Error::Publish(format!(
                "Failed to create report directory {}: {}",
                self.out_dir.display(),
                e
            ))
        })?;
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| Error::Publish(format!("Failed to write {}: {}", path.display(), e)))?;

        info!("Published report: {}", path.display());
        Ok(path.display().to_string())
    }
}

/// Keeps published reports in memory
#[derive(Default)]
pub struct MemoryPublisher {
    reports: Mutex<Vec<AnalysisReport>>,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports published so far, in publish order
    pub async fn reports(&self) -> Vec<AnalysisReport> {
        self.reports.lock().await.clone()
    }
}

#[async_trait]
impl ReportPublisher for MemoryPublisher {
    fn name(&self) -> &str {
        "memory"
    }

    async fn publish(&self, report: &AnalysisReport) -> Result<String> {
        let mut reports = self.reports.lock().await;
        reports.push(report.clone());
        Ok(format!(
            "memory://{}",
            report_file_name(&report.user_id, report.year_month)
        ))
    }
}
