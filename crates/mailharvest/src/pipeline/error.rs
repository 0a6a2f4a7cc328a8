use thiserror::Error;

use crate::dataset::DatasetError;
use crate::email::{EmailError, ErrorKind};

/// Failure of one unit of harvest work.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Mail store error: {0}")]
    Store(#[from] EmailError),

    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),
}

impl PipelineError {
    /// Dataset failures are always fatal; store failures carry their own kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Store(e) => e.kind(),
            PipelineError::Dataset(_) => ErrorKind::Fatal,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}
