//! Session lifecycle and reconnect policy.
//!
//! [`SessionManager::run`] drives a small state machine:
//!
//! ```text
//! Connecting ──ok──> Active ──ok──> done
//!     │                │
//!     │ transient      │ transient
//!     └──> Backoff <───┘
//!            │  (sleep, attempt += 1)
//!            └──> Connecting
//!
//! any fatal error ──> Aborted
//! ```
//!
//! Every session that reaches `Active` is logged out before the next state,
//! whatever the task returned.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use crate::email::{MailSession, MailStore};

use super::error::PipelineError;
use super::progress::{ProgressEvent, ProgressReporter};

/// Fixed-delay reconnect policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub backoff: Duration,
    /// Total session attempts allowed. `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            backoff: Duration::from_secs(10),
            max_attempts: None,
        }
    }
}

/// Work executed against a live session. `run` may be invoked again on a
/// fresh session after a transient failure, so it must be resumable.
#[async_trait]
pub trait SessionTask<S: MailSession>: Send {
    type Output: Send;

    /// Short name used in reconnect notices.
    fn unit_name(&self) -> String;

    async fn run(&mut self, session: &mut S) -> Result<Self::Output, PipelineError>;
}

/// Result of [`SessionManager::run`].
#[derive(Debug)]
pub enum SessionOutcome<T> {
    Completed(T),
    /// A fatal error stopped the task; it was not retried.
    Aborted(PipelineError),
    /// The attempt limit was reached while failures were still transient.
    RetriesExhausted {
        attempts: u32,
        last_error: PipelineError,
    },
}

enum SessionState<S> {
    Connecting { attempt: u32 },
    Active { attempt: u32, session: S },
    Backoff { attempt: u32, error: PipelineError },
    Aborted(PipelineError),
}

impl<S> SessionState<S> {
    fn after_failure(attempt: u32, error: PipelineError) -> Self {
        if error.is_transient() {
            SessionState::Backoff { attempt, error }
        } else {
            SessionState::Aborted(error)
        }
    }
}

/// Opens sessions on a store and runs tasks with reconnect-on-transient-failure.
pub struct SessionManager<'a, M: MailStore> {
    store: &'a M,
    policy: RetryPolicy,
    progress: &'a dyn ProgressReporter,
}

impl<'a, M: MailStore> SessionManager<'a, M> {
    pub fn new(store: &'a M, policy: RetryPolicy, progress: &'a dyn ProgressReporter) -> Self {
        Self {
            store,
            policy,
            progress,
        }
    }

    pub async fn run<T>(&self, task: &mut T) -> SessionOutcome<T::Output>
    where
        T: SessionTask<M::Session>,
    {
        let mut state = SessionState::Connecting { attempt: 1 };

        loop {
            state = match state {
                SessionState::Connecting { attempt } => {
                    debug!(attempt, "Opening mail store session");
                    match self.store.connect().await {
                        Ok(session) => SessionState::Active { attempt, session },
                        Err(e) => SessionState::after_failure(attempt, e.into()),
                    }
                }
                SessionState::Active {
                    attempt,
                    mut session,
                } => {
                    let result = task.run(&mut session).await;
                    if let Err(e) = session.logout().await {
                        debug!("Logout after {} failed: {}", task.unit_name(), e);
                    }
                    match result {
                        Ok(output) => return SessionOutcome::Completed(output),
                        Err(e) => SessionState::after_failure(attempt, e),
                    }
                }
                SessionState::Backoff { attempt, error } => {
                    if self.policy.max_attempts.is_some_and(|max| attempt >= max) {
                        error!(
                            "{}: giving up after {} attempts: {}",
                            task.unit_name(),
                            attempt,
                            error
                        );
                        return SessionOutcome::RetriesExhausted {
                            attempts: attempt,
                            last_error: error,
                        };
                    }

                    warn!("{}: connection dropped: {}", task.unit_name(), error);
                    self.progress.report(ProgressEvent::Reconnecting {
                        unit: task.unit_name(),
                        attempt,
                        delay: self.policy.backoff,
                        error: error.to_string(),
                    });
                    tokio::time::sleep(self.policy.backoff).await;
                    SessionState::Connecting {
                        attempt: attempt + 1,
                    }
                }
                SessionState::Aborted(error) => {
                    error!("{}: fatal error: {}", task.unit_name(), error);
                    return SessionOutcome::Aborted(error);
                }
            };
        }
    }
}
