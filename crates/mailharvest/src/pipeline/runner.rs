use std::sync::Arc;
use std::time::Duration;

use tracing::{info, info_span, warn, Instrument};

use crate::config::{CategorySpec, HarvestConfig};
use crate::dataset::{dedupe, BatchSink, CheckpointStore};
use crate::email::{EmailError, ImapStore, MailStore};

use super::config::PipelineConfig;
use super::error::PipelineError;
use super::fetcher::{CategoryFetcher, FetchSummary};
use super::progress::{LogProgress, ProgressEvent, ProgressReporter};
use super::session::{SessionManager, SessionOutcome};

/// How a category pass ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryStatus {
    Completed(FetchSummary),
    Aborted(String),
    RetriesExhausted { attempts: u32, error: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryReport {
    pub spec: CategorySpec,
    pub status: CategoryStatus,
    /// Work done before the pass ended, also for aborted passes.
    pub summary: FetchSummary,
}

impl CategoryReport {
    pub fn is_completed(&self) -> bool {
        matches!(self.status, CategoryStatus::Completed(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HarvestReport {
    pub categories: Vec<CategoryReport>,
    /// Rows left after deduplication; `None` when no dataset was produced
    /// or the dedupe pass failed.
    pub final_rows: Option<usize>,
    /// Why the final dedupe pass failed. The appended rows are still on disk.
    pub dedupe_error: Option<String>,
}

impl HarvestReport {
    pub fn total_ingested(&self) -> usize {
        self.categories.iter().map(|c| c.summary.ingested).sum()
    }
}

/// Runs every configured category against one mail store, then deduplicates.
pub struct Harvester<M: MailStore> {
    store: M,
    config: PipelineConfig,
    checkpoints: CheckpointStore,
    sink: BatchSink,
    progress: Arc<dyn ProgressReporter>,
}

impl<M: MailStore> Harvester<M> {
    pub fn new(store: M, config: PipelineConfig) -> Self {
        let checkpoints = CheckpointStore::new(&config.checkpoint_path);
        let sink = BatchSink::new(&config.output_path);
        Self {
            store,
            config,
            checkpoints,
            sink,
            progress: Arc::new(LogProgress),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// One category pass. Failures end up in the report, never in a panic
    /// or an early return, so the caller can move on to the next category.
    pub async fn fetch_category(&self, spec: CategorySpec) -> CategoryReport {
        let span = info_span!("category_fetch", category = %spec.category, label = spec.label);
        self.fetch_category_inner(spec).instrument(span).await
    }

    async fn fetch_category_inner(&self, spec: CategorySpec) -> CategoryReport {
        let category = spec.category;
        let progress = self.progress.as_ref();

        let existing_rows = self.sink.row_count().unwrap_or_else(|e| {
            warn!("Could not count existing rows: {}", e);
            0
        });
        progress.report(ProgressEvent::CategoryStarted {
            category,
            existing_rows,
        });

        let mut fetcher = match CategoryFetcher::new(
            spec,
            &self.config,
            &self.checkpoints,
            &self.sink,
            progress,
        ) {
            Ok(fetcher) => fetcher,
            Err(e) => {
                progress.report(ProgressEvent::CategoryAborted {
                    category,
                    error: e.to_string(),
                });
                return CategoryReport {
                    spec,
                    status: CategoryStatus::Aborted(e.to_string()),
                    summary: FetchSummary::default(),
                };
            }
        };

        let manager = SessionManager::new(&self.store, self.config.retry_policy(), progress);
        let outcome = manager.run(&mut fetcher).await;

        let status = match outcome {
            SessionOutcome::Completed(summary) => CategoryStatus::Completed(summary),
            SessionOutcome::Aborted(e) => {
                progress.report(ProgressEvent::CategoryAborted {
                    category,
                    error: e.to_string(),
                });
                CategoryStatus::Aborted(e.to_string())
            }
            SessionOutcome::RetriesExhausted {
                attempts,
                last_error,
            } => {
                progress.report(ProgressEvent::CategoryAborted {
                    category,
                    error: last_error.to_string(),
                });
                CategoryStatus::RetriesExhausted {
                    attempts,
                    error: last_error.to_string(),
                }
            }
        };

        CategoryReport {
            spec,
            status,
            summary: fetcher.summary(),
        }
    }

    /// Harvests all configured categories in order, then deduplicates the
    /// dataset if one exists. Every failure lands in the report.
    pub async fn run(&self) -> HarvestReport {
        let mut categories = Vec::with_capacity(self.config.categories.len());
        for spec in &self.config.categories {
            categories.push(self.fetch_category(*spec).await);
        }

        let mut dedupe_error = None;
        let final_rows = if self.sink.exists() {
            match dedupe(self.sink.path()) {
                Ok(rows) => {
                    self.progress.report(ProgressEvent::Deduplicated { rows });
                    Some(rows)
                }
                Err(e) => {
                    let e = PipelineError::from(e);
                    self.progress.report(ProgressEvent::DedupeFailed {
                        error: e.to_string(),
                    });
                    dedupe_error = Some(e.to_string());
                    None
                }
            }
        } else {
            self.progress.report(ProgressEvent::NoDataset);
            None
        };

        let completed = categories.iter().filter(|c| c.is_completed()).count();
        info!(
            completed,
            aborted = categories.len() - completed,
            final_rows = final_rows.unwrap_or(0),
            "Harvest finished"
        );

        HarvestReport {
            categories,
            final_rows,
            dedupe_error,
        }
    }
}

impl Harvester<ImapStore> {
    /// Production constructor: resolves credentials and builds the IMAP store.
    pub fn from_config(config: &HarvestConfig) -> Result<Self, EmailError> {
        let store = ImapStore::from_config(
            &config.imap,
            Duration::from_secs(config.ingest.operation_timeout_secs),
        )?;
        Ok(Self::new(store, PipelineConfig::from_config(config)))
    }
}
