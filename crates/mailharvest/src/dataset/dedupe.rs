//! Post-harvest removal of rows with repeated text.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::info;

use super::error::{DatasetError, Result};

/// Rewrites the dataset keeping only the first row for each `text` value.
///
/// Row order and the header are preserved. Returns the number of rows left;
/// a missing or empty dataset is left alone and reported as 0.
pub fn dedupe(path: &Path) -> Result<usize> {
    match fs::metadata(path) {
        Ok(meta) if meta.len() == 0 => return Ok(0),
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => {
            return Err(DatasetError::Read {
                path: path.to_path_buf(),
                source: e,
            })
        }
    }

    let csv_err = |source| DatasetError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;
    let headers = reader.headers().map_err(csv_err)?.clone();
    let text_column = headers
        .iter()
        .position(|h| h == "text")
        .ok_or_else(|| DatasetError::MissingColumn {
            path: path.to_path_buf(),
            column: "text",
        })?;

    let mut seen = HashSet::new();
    let mut kept = Vec::new();
    let mut total = 0usize;
    for row in reader.records() {
        let row = row.map_err(csv_err)?;
        total += 1;
        if seen.insert(row.get(text_column).unwrap_or_default().to_string()) {
            kept.push(row);
        }
    }

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let tmp = NamedTempFile::new_in(dir).map_err(|source| DatasetError::Write {
        path: dir.to_path_buf(),
        source,
    })?;
    let tmp_csv_err = |source| DatasetError::Csv {
        path: tmp.path().to_path_buf(),
        source,
    };
    {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(tmp.as_file());
        writer.write_record(&headers).map_err(tmp_csv_err)?;
        for row in &kept {
            writer.write_record(row).map_err(tmp_csv_err)?;
        }
        writer.flush().map_err(|source| DatasetError::Write {
            path: tmp.path().to_path_buf(),
            source,
        })?;
    }
    tmp.persist(path).map_err(|e| DatasetError::Write {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    info!(
        rows = kept.len(),
        removed = total - kept.len(),
        "Deduplicated {}",
        path.display()
    );
    Ok(kept.len())
}
