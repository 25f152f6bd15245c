//! Batch analysis pipeline
//!
//! For every (user, period) group in an ingestion batch:
//! 1. Fetch the user's history from the [`HistoricalStore`]
//! 2. Analyze the group against that history
//! 3. Publish the report through the [`ReportPublisher`]
//!
//! Groups run as independent tasks, bounded by `max_concurrent_groups`. A
//! failure in one group is recorded and never stops the others. Once every
//! group is done, successfully analyzed groups are appended to history in
//! batch order.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::analysis::analyze_group;
use crate::config::AnalysisConfig;
use crate::import::{IngestBatch, MalformedRow};
use crate::models::{AnalysisReport, GroupKey, TransactionGroup};
use crate::publish::ReportPublisher;
use crate::report::ReportAssembler;
use crate::store::HistoricalStore;

/// Where in the per-group flow a failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Fetch,
    Analyze,
    Publish,
    Append,
}

impl FailureStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Analyze => "analyze",
            Self::Publish => "publish",
            Self::Append => "append",
        }
    }
}

impl std::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupFailure {
    pub key: GroupKey,
    pub stage: FailureStage,
    pub reason: String,
}

impl GroupFailure {
    fn new(key: &GroupKey, stage: FailureStage, reason: impl ToString) -> Self {
        Self {
            key: key.clone(),
            stage,
            reason: reason.to_string(),
        }
    }
}

/// A report and where the publisher put it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedReport {
    pub report: AnalysisReport,
    pub location: String,
}

/// Everything one pipeline run produced
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineOutcome {
    /// Published reports, in batch order
    pub reports: Vec<PublishedReport>,
    pub failures: Vec<GroupFailure>,
    /// Rows dropped during ingestion
    pub skipped_rows: Vec<MalformedRow>,
    /// Transactions newly appended to history
    pub appended: usize,
}

impl PipelineOutcome {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct Pipeline {
    store: Arc<dyn HistoricalStore>,
    publisher: Arc<dyn ReportPublisher>,
    config: AnalysisConfig,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn HistoricalStore>,
        publisher: Arc<dyn ReportPublisher>,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            store,
            publisher,
            config,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze every group in `batch`
    pub async fn run(&self, batch: IngestBatch) -> PipelineOutcome {
        let IngestBatch { groups, skipped } = batch;
        let groups: Vec<Arc<TransactionGroup>> = groups.into_iter().map(Arc::new).collect();

        info!(
            "Analyzing {} groups with {} (history: {}, publisher: {})",
            groups.len(),
            if self.config.max_concurrent_groups == 1 {
                "1 worker".to_string()
            } else {
                format!("up to {} workers", self.config.max_concurrent_groups)
            },
            self.store.name(),
            self.publisher.name()
        );

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_groups.max(1)));
        let assembler = ReportAssembler::from_config(&self.config);

        let handles: Vec<(GroupKey, JoinHandle<Result<PublishedReport, GroupFailure>>)> = groups
            .iter()
            .map(|group| {
                let key = group.key().clone();
                let group = Arc::clone(group);
                let store = Arc::clone(&self.store);
                let publisher = Arc::clone(&self.publisher);
                let semaphore = Arc::clone(&semaphore);
                let handle = tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await.map_err(|e| {
                        GroupFailure::new(group.key(), FailureStage::Fetch, e)
                    })?;
                    process_group(&group, store.as_ref(), publisher.as_ref(), &assembler).await
                });
                (key, handle)
            })
            .collect();

        let mut outcome = PipelineOutcome {
            skipped_rows: skipped,
            ..Default::default()
        };
        let mut analyzed = Vec::new();

        // Awaiting in spawn order keeps results in batch order
        for ((key, handle), group) in handles.into_iter().zip(&groups) {
            match handle.await {
                Ok(Ok(published)) => {
                    outcome.reports.push(published);
                    analyzed.push(Arc::clone(group));
                }
                Ok(Err(failure)) => {
                    warn!(
                        "Failed to {} {}: {}",
                        failure.stage, failure.key, failure.reason
                    );
                    outcome.failures.push(failure);
                }
                Err(e) => {
                    warn!("Analysis task for {} did not complete: {}", key, e);
                    outcome
                        .failures
                        .push(GroupFailure::new(&key, FailureStage::Analyze, e));
                }
            }
        }

        if self.config.append_history {
            let (appended, failures) = self
                .append_history(analyzed.iter().map(|g| g.as_ref()))
                .await;
            outcome.appended = appended;
            outcome.failures.extend(failures);
        } else {
            debug!("History append disabled, leaving store untouched");
        }

        info!(
            "Pipeline finished: {} reports, {} failures, {} rows skipped, {} appended",
            outcome.reports.len(),
            outcome.failures.len(),
            outcome.skipped_rows.len(),
            outcome.appended
        );

        outcome
    }

    /// Append groups to the historical store, one at a time in the given order
    ///
    /// Returns the number of transactions added and any per-group failures.
    pub async fn append_history<'a>(
        &self,
        groups: impl IntoIterator<Item = &'a TransactionGroup>,
    ) -> (usize, Vec<GroupFailure>) {
        let mut appended = 0;
        let mut failures = Vec::new();

        for group in groups {
            match self
                .store
                .append(group.user_id(), group.transactions())
                .await
            {
                Ok(added) => {
                    debug!("Appended {} transactions for {}", added, group.key());
                    appended += added;
                }
                Err(e) => {
                    warn!("Failed to append history for {}: {}", group.key(), e);
                    failures.push(GroupFailure::new(group.key(), FailureStage::Append, e));
                }
            }
        }

        (appended, failures)
    }
}

async fn process_group(
    group: &TransactionGroup,
    store: &dyn HistoricalStore,
    publisher: &dyn ReportPublisher,
    assembler: &ReportAssembler,
) -> Result<PublishedReport, GroupFailure> {
    let key = group.key();

    let mut historical = store
        .fetch(group.user_id())
        .await
        .map_err(|e| GroupFailure::new(key, FailureStage::Fetch, e))?;

    // A re-run must not count the group's own transactions as history
    let current_ids: HashSet<&str> = group.transactions().iter().map(|tx| tx.id.as_str()).collect();
    historical.retain(|tx| !current_ids.contains(tx.id.as_str()));

    let report = analyze_group(group, &historical, assembler)
        .map_err(|e| GroupFailure::new(key, FailureStage::Analyze, e))?;

    let location = publisher
        .publish(&report)
        .await
        .map_err(|e| GroupFailure::new(key, FailureStage::Publish, e))?;

    debug!("Published {} to {}", key, location);
    Ok(PublishedReport { report, location })
}
