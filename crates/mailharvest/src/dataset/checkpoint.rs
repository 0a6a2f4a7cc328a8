//! Durable record of message UIDs that need no further work.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::email::Uid;

use super::error::{DatasetError, Result};

/// Append-only checkpoint file with one UID per line.
///
/// Duplicate lines are harmless; [`CheckpointStore::load`] folds them into a set.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every recorded UID. A missing file is an empty set.
    pub fn load(&self) -> Result<HashSet<Uid>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashSet::new()),
            Err(e) => {
                return Err(DatasetError::Read {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };

        let mut uids = HashSet::new();
        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match line.parse::<Uid>() {
                Ok(uid) => {
                    uids.insert(uid);
                }
                Err(_) => warn!(
                    "Ignoring unreadable checkpoint line {} in {}: {:?}",
                    index + 1,
                    self.path.display(),
                    line
                ),
            }
        }

        debug!("Loaded {} checkpointed UIDs", uids.len());
        Ok(uids)
    }

    /// Appends `uid` and syncs it to disk before returning.
    pub fn record(&self, uid: Uid) -> Result<()> {
        let write_err = |source| DatasetError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(write_err)?;
        writeln!(file, "{}", uid).map_err(write_err)?;
        file.flush().map_err(write_err)?;
        file.sync_data().map_err(write_err)?;
        Ok(())
    }
}
