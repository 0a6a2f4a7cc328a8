//! Appends record batches to the CSV dataset.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::error::{DatasetError, Result};
use super::record::{MessageRecord, DATASET_HEADER};

/// Append-only writer for the dataset file.
///
/// The header is written by whichever flush finds the file missing or empty;
/// existing content is never rewritten.
#[derive(Debug, Clone)]
pub struct BatchSink {
    path: PathBuf,
}

impl BatchSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Appends `records` in order. Empty input leaves the file untouched.
    pub fn flush(&self, records: &[MessageRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let write_err = |source| DatasetError::Write {
            path: self.path.clone(),
            source,
        };
        let csv_err = |source| DatasetError::Csv {
            path: self.path.clone(),
            source,
        };

        let write_header = match fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent).map_err(write_err)?;
                }
                true
            }
            Err(e) => {
                return Err(DatasetError::Read {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(write_err)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if write_header {
            writer.write_record(DATASET_HEADER).map_err(csv_err)?;
        }
        for record in records {
            writer.serialize(record).map_err(csv_err)?;
        }
        writer.flush().map_err(write_err)?;

        debug!(
            "Appended {} rows to {}",
            records.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Number of data rows currently in the dataset (0 when missing).
    pub fn row_count(&self) -> Result<usize> {
        if !self.path.exists() {
            return Ok(0);
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)
            .map_err(|source| DatasetError::Csv {
                path: self.path.clone(),
                source,
            })?;

        let mut rows = 0;
        for record in reader.records() {
            record.map_err(|source| DatasetError::Csv {
                path: self.path.clone(),
                source,
            })?;
            rows += 1;
        }
        Ok(rows)
    }
}
