//! Incremental harvest of categorized mail into the dataset.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod progress;
pub mod runner;
pub mod session;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use fetcher::{CategoryFetcher, FetchSummary};
pub use progress::{LogProgress, NoopProgress, ProgressEvent, ProgressReporter};
pub use runner::{CategoryReport, CategoryStatus, HarvestReport, Harvester};
pub use session::{RetryPolicy, SessionManager, SessionOutcome, SessionTask};
