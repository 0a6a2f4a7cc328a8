use std::time::Duration;

use tracing::{error, info, warn};

use crate::config::Category;
use crate::email::Uid;

use super::fetcher::FetchSummary;

/// Human-facing status updates emitted while harvesting.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    CategoryStarted {
        category: Category,
        existing_rows: usize,
    },
    Listed {
        category: Category,
        total: usize,
        pending: usize,
    },
    BatchSaved {
        category: Category,
        ingested: usize,
    },
    MessageSkipped {
        category: Category,
        uid: Uid,
        error: String,
    },
    Reconnecting {
        unit: String,
        attempt: u32,
        delay: Duration,
        error: String,
    },
    CategoryFinished {
        category: Category,
        summary: FetchSummary,
    },
    CategoryAborted {
        category: Category,
        error: String,
    },
    Deduplicated {
        rows: usize,
    },
    DedupeFailed {
        error: String,
    },
    NoDataset,
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter for unit tests.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Writes every event to the log as a one-line status message.
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::CategoryStarted {
                category,
                existing_rows,
            } => info!("Category {}: starting, dataset has {} rows", category, existing_rows),
            ProgressEvent::Listed {
                category,
                total,
                pending,
            } => info!("Category {}: {} emails found, {} new", category, total, pending),
            ProgressEvent::BatchSaved { category, ingested } => {
                info!("Category {}: saved {} emails", category, ingested)
            }
            ProgressEvent::MessageSkipped {
                category,
                uid,
                error,
            } => warn!("Category {}: skipped UID {}: {}", category, uid, error),
            ProgressEvent::Reconnecting {
                unit,
                attempt,
                delay,
                error,
            } => warn!(
                "{}: connection dropped ({}), reconnecting in {:?} (attempt {})",
                unit,
                error,
                delay,
                attempt + 1
            ),
            ProgressEvent::CategoryFinished { category, summary } => info!(
                "Category {}: finished, {} ingested, {} too short, {} missing, {} failed",
                category,
                summary.ingested,
                summary.skipped_short,
                summary.skipped_missing,
                summary.failed
            ),
            ProgressEvent::CategoryAborted { category, error } => {
                warn!("Category {}: aborted: {}", category, error)
            }
            ProgressEvent::Deduplicated { rows } => {
                info!("Harvest complete, final dataset size: {} rows", rows)
            }
            ProgressEvent::DedupeFailed { error } => {
                error!("Deduplication failed, dataset left as appended: {}", error)
            }
            ProgressEvent::NoDataset => warn!("No dataset created"),
        }
    }
}
