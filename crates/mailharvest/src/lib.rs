pub mod config;
pub mod dataset;
pub mod email;
pub mod error;
pub mod logging;
pub mod normalize;
pub mod pipeline;
pub mod secrets;

pub use config::{load_config, Category, CategorySpec, HarvestConfig, ProcessingOrder};
pub use dataset::{BatchSink, CheckpointStore, DatasetError, MessageRecord};
pub use email::{EmailError, ErrorKind, FetchedMessage, ImapStore, MailSession, MailStore, Uid};
pub use error::{ConfigError, HarvestError, Result};
pub use logging::LogFormat;
pub use pipeline::{
    CategoryReport, CategoryStatus, FetchSummary, HarvestReport, Harvester, PipelineConfig,
    PipelineError, ProgressEvent, ProgressReporter,
};
pub use secrets::{resolve_secret, SecretError};
