use std::path::PathBuf;
use thiserror::Error;

use crate::dataset::DatasetError;
use crate::email::EmailError;
use crate::logging::LoggingError;
use crate::pipeline::PipelineError;
use crate::secrets::SecretError;

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Mail store error: {0}")]
    Email(#[from] EmailError),

    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Secret error: {0}")]
    Secret(#[from] SecretError),

    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Invalid category list: {reason}")]
    InvalidCategories { reason: String },
}

pub type Result<T> = std::result::Result<T, HarvestError>;
