use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Dataset '{path}' has no '{column}' column")]
    MissingColumn { path: PathBuf, column: &'static str },
}

pub type Result<T> = std::result::Result<T, DatasetError>;
