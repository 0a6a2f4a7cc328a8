//! Test harness for isolated harvest runs.
//!
//! Each `TestHarness` owns a temporary directory holding the dataset and
//! checkpoint files, and builds harvesters pointed at them.

#![allow(dead_code)]

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;

use mailharvest::pipeline::{Harvester, PipelineConfig, ProgressEvent, ProgressReporter};
use mailharvest::{CategorySpec, CheckpointStore, HarvestConfig, MessageRecord, Uid};

use super::mailbox::ScriptedStore;

/// Captures every progress event for later assertions.
#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Running totals reported at each batch flush.
    pub fn batch_totals(&self) -> Vec<usize> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::BatchSaved { ingested, .. } => Some(ingested),
                _ => None,
            })
            .collect()
    }

    pub fn reconnects(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Reconnecting { .. }))
            .count()
    }
}

impl ProgressReporter for RecordingProgress {
    fn report(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub struct TestHarness {
    temp_dir: TempDir,
    pub output_path: PathBuf,
    pub checkpoint_path: PathBuf,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let output_path = temp_dir.path().join("full_email_dataset.csv");
        let checkpoint_path = temp_dir.path().join("processed_uids.txt");
        Self {
            temp_dir,
            output_path,
            checkpoint_path,
        }
    }

    /// Default settings with the sleeps shortened and a bounded retry loop.
    pub fn config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::from_config(&HarvestConfig::default());
        config.output_path = self.output_path.clone();
        config.checkpoint_path = self.checkpoint_path.clone();
        config.fetch_delay = Duration::ZERO;
        config.retry_backoff = Duration::from_millis(1);
        config.max_connect_attempts = Some(5);
        config
    }

    pub fn config_with(&self, categories: Vec<CategorySpec>, batch_size: usize) -> PipelineConfig {
        let mut config = self.config();
        config.categories = categories;
        config.batch_size = batch_size;
        config
    }

    pub fn harvester(
        &self,
        store: &ScriptedStore,
        config: PipelineConfig,
    ) -> (Harvester<ScriptedStore>, Arc<RecordingProgress>) {
        let progress = Arc::new(RecordingProgress::default());
        let harvester = Harvester::new(store.clone(), config).with_progress(progress.clone());
        (harvester, progress)
    }

    pub fn rows(&self) -> Vec<MessageRecord> {
        if !self.output_path.exists() {
            return Vec::new();
        }
        let mut reader = csv::Reader::from_path(&self.output_path).expect("open dataset");
        reader
            .deserialize()
            .collect::<Result<Vec<MessageRecord>, _>>()
            .expect("parse dataset")
    }

    pub fn dataset_contents(&self) -> String {
        std::fs::read_to_string(&self.output_path).unwrap_or_default()
    }

    pub fn checkpointed(&self) -> HashSet<Uid> {
        CheckpointStore::new(&self.checkpoint_path)
            .load()
            .expect("load checkpoints")
    }

    pub fn write_checkpoints(&self, uids: &[u32]) {
        let store = CheckpointStore::new(&self.checkpoint_path);
        for uid in uids {
            store.record(Uid(*uid)).expect("record checkpoint");
        }
    }
}
