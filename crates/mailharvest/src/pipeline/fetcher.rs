use std::collections::HashSet;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use crate::config::CategorySpec;
use crate::dataset::{BatchSink, CheckpointStore, DatasetError, MessageRecord};
use crate::email::{FetchedMessage, MailSession, Uid};
use crate::normalize::normalize;

use super::config::PipelineConfig;
use super::error::PipelineError;
use super::progress::{ProgressEvent, ProgressReporter};
use super::session::SessionTask;

/// Counters for one category pass.
///
/// `listed` and `already_done` describe the latest listing; the others
/// accumulate across reconnects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FetchSummary {
    pub listed: usize,
    pub already_done: usize,
    pub ingested: usize,
    pub skipped_short: usize,
    pub skipped_missing: usize,
    pub failed: usize,
}

/// Ingests every not-yet-checkpointed message of one category.
///
/// The checkpoint set is loaded once at construction and grown in memory as
/// UIDs are recorded, so a rerun after a reconnect resumes where the
/// previous session stopped.
pub struct CategoryFetcher<'a> {
    spec: CategorySpec,
    config: &'a PipelineConfig,
    checkpoints: &'a CheckpointStore,
    sink: &'a BatchSink,
    progress: &'a dyn ProgressReporter,
    done: HashSet<Uid>,
    summary: FetchSummary,
}

impl<'a> CategoryFetcher<'a> {
    pub fn new(
        spec: CategorySpec,
        config: &'a PipelineConfig,
        checkpoints: &'a CheckpointStore,
        sink: &'a BatchSink,
        progress: &'a dyn ProgressReporter,
    ) -> Result<Self, DatasetError> {
        let done = checkpoints.load()?;
        Ok(Self {
            spec,
            config,
            checkpoints,
            sink,
            progress,
            done,
            summary: FetchSummary::default(),
        })
    }

    pub fn summary(&self) -> FetchSummary {
        self.summary
    }

    fn describe(&self) -> String {
        format!("category {}", self.spec.category)
    }

    async fn ingest_pending<S: MailSession>(
        &mut self,
        session: &mut S,
        pending: Vec<Uid>,
        batch: &mut Vec<MessageRecord>,
    ) -> Result<(), PipelineError> {
        for uid in pending {
            self.ingest_one(session, uid, batch).await?;
            if batch.len() >= self.config.batch_size {
                self.flush_batch(batch)?;
            }
        }
        Ok(())
    }

    async fn ingest_one<S: MailSession>(
        &mut self,
        session: &mut S,
        uid: Uid,
        batch: &mut Vec<MessageRecord>,
    ) -> Result<(), PipelineError> {
        let category = self.spec.category;

        let message = match session.fetch_message(uid).await {
            Ok(Some(message)) => message,
            Ok(None) => {
                debug!(%uid, "Message no longer exists");
                self.summary.skipped_missing += 1;
                return self.mark_done(uid);
            }
            Err(e) if e.is_transient() => return Err(e.into()),
            Err(e) => {
                warn!(%uid, "Failed to fetch message: {}", e);
                self.summary.failed += 1;
                self.progress.report(ProgressEvent::MessageSkipped {
                    category,
                    uid,
                    error: e.to_string(),
                });
                return Ok(());
            }
        };

        match self.build_record(&message) {
            Some(record) => {
                batch.push(record);
                self.summary.ingested += 1;
                self.mark_done(uid)?;
                tokio::time::sleep(self.config.fetch_delay).await;
            }
            None => {
                debug!(%uid, "Body below minimum length");
                self.summary.skipped_short += 1;
                self.mark_done(uid)?;
            }
        }
        Ok(())
    }

    /// `None` when the normalized body is too short to be useful.
    fn build_record(&self, message: &FetchedMessage) -> Option<MessageRecord> {
        let body = normalize(message.body());
        if body.chars().count() < self.config.min_body_length {
            return None;
        }

        let subject = message.subject.trim();
        let text = if subject.is_empty() {
            body
        } else {
            format!("{} {}", subject, body)
        };

        Some(MessageRecord {
            text,
            label: self.spec.label,
            category: self.spec.category.as_str().to_string(),
            sender: message.sender.clone(),
            date: message.date.clone().unwrap_or_default(),
        })
    }

    fn mark_done(&mut self, uid: Uid) -> Result<(), PipelineError> {
        self.checkpoints.record(uid)?;
        self.done.insert(uid);
        Ok(())
    }

    fn flush_batch(&mut self, batch: &mut Vec<MessageRecord>) -> Result<(), PipelineError> {
        if batch.is_empty() {
            return Ok(());
        }
        self.sink.flush(batch)?;
        batch.clear();
        self.progress.report(ProgressEvent::BatchSaved {
            category: self.spec.category,
            ingested: self.summary.ingested,
        });
        Ok(())
    }
}

#[async_trait]
impl<'a, S: MailSession> SessionTask<S> for CategoryFetcher<'a> {
    type Output = FetchSummary;

    fn unit_name(&self) -> String {
        self.describe()
    }

    async fn run(&mut self, session: &mut S) -> Result<FetchSummary, PipelineError> {
        let category = self.spec.category;

        let listed = session.list_uids(category).await?;
        let ordered = self.config.processing_order.apply(listed);
        let total = ordered.len();
        let pending: Vec<Uid> = ordered
            .into_iter()
            .filter(|uid| !self.done.contains(uid))
            .collect();

        self.summary.listed = total;
        self.summary.already_done = total - pending.len();
        self.progress.report(ProgressEvent::Listed {
            category,
            total,
            pending: pending.len(),
        });

        let mut batch = Vec::with_capacity(self.config.batch_size);
        let ingested = self.ingest_pending(session, pending, &mut batch).await;

        // Records are checkpointed as they are buffered; write them out
        // before any error leaves this pass.
        match (ingested, self.flush_batch(&mut batch)) {
            (Ok(()), Ok(())) => {}
            (Err(e), Ok(())) => return Err(e),
            (Ok(()), Err(flush_err)) => return Err(flush_err),
            (Err(e), Err(flush_err)) => {
                error!("{} failed: {}", self.describe(), e);
                return Err(flush_err);
            }
        }

        self.progress.report(ProgressEvent::CategoryFinished {
            category,
            summary: self.summary,
        });
        Ok(self.summary)
    }
}
