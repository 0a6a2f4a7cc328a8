use std::path::PathBuf;
use std::time::Duration;

use crate::config::{CategorySpec, HarvestConfig, ProcessingOrder};

use super::session::RetryPolicy;

/// Runtime view of the harvest settings, with durations resolved.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub output_path: PathBuf,
    pub checkpoint_path: PathBuf,
    pub categories: Vec<CategorySpec>,
    pub batch_size: usize,
    pub fetch_delay: Duration,
    pub retry_backoff: Duration,
    pub max_connect_attempts: Option<u32>,
    pub min_body_length: usize,
    pub processing_order: ProcessingOrder,
}

impl PipelineConfig {
    pub fn from_config(config: &HarvestConfig) -> Self {
        Self {
            output_path: config.dataset.output_path.clone(),
            checkpoint_path: config.dataset.checkpoint_path.clone(),
            categories: config.categories.clone(),
            batch_size: config.ingest.batch_size.max(1),
            fetch_delay: Duration::from_millis(config.ingest.fetch_delay_ms),
            retry_backoff: Duration::from_secs(config.ingest.retry_backoff_secs),
            max_connect_attempts: config.ingest.max_connect_attempts,
            min_body_length: config.ingest.min_body_length,
            processing_order: config.ingest.processing_order,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            backoff: self.retry_backoff,
            max_attempts: self.max_connect_attempts,
        }
    }
}
