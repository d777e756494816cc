// BillExact - app/history.rs
//
// Export history: a JSON array of ExportHistory records in the platform
// data directory, newest last.
//
// Loading never fails hard. A missing file is an empty history; a corrupt
// one is reported as a warning and treated as empty so exports keep working.
// Before the next append replaces it, the damaged file is moved to
// `export_history.json.bak`.

use crate::core::model::ExportHistory;
use crate::platform::fs;
use crate::util::constants;
use crate::util::error::StoreError;
use std::path::Path;

/// Load the export history at `path`.
///
/// Returns the records (oldest first) and an optional warning describing
/// why the file was ignored.
pub fn load_history(path: &Path) -> (Vec<ExportHistory>, Option<String>) {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No export history yet");
        return (Vec::new(), None);
    }

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            let msg = format!(
                "Could not read export history '{}': {e}. Starting with an empty history.",
                path.display()
            );
            tracing::warn!("{}", msg);
            return (Vec::new(), Some(msg));
        }
    };

    match serde_json::from_str::<Vec<ExportHistory>>(&content) {
        Ok(records) => {
            tracing::debug!(path = %path.display(), records = records.len(), "Export history loaded");
            (records, None)
        }
        Err(e) => {
            let msg = format!(
                "Export history '{}' is corrupt ({e}). Starting with an empty history.",
                path.display()
            );
            tracing::warn!("{}", msg);
            (Vec::new(), Some(msg))
        }
    }
}

/// Append `record` to the history at `path` and write it back atomically.
///
/// Only the newest `MAX_HISTORY_RECORDS` records are kept. Returns the
/// number of records now on disk, plus a warning when an unreadable or
/// corrupt history was moved aside to its `.bak` path first. If it cannot
/// be moved, nothing is written.
pub fn append_history(
    path: &Path,
    record: ExportHistory,
) -> Result<(usize, Option<String>), StoreError> {
    let (mut records, warning) = load_history(path);

    let warning = match warning {
        Some(msg) => {
            let backup = fs::backup_path_for(path);
            std::fs::rename(path, &backup).map_err(|e| StoreError::Io {
                path: backup.clone(),
                source: e,
            })?;
            tracing::warn!(backup = %backup.display(), "Damaged export history moved aside");
            Some(format!("{msg} The previous file was saved as '{}'.", backup.display()))
        }
        None => None,
    };

    records.push(record);

    if records.len() > constants::MAX_HISTORY_RECORDS {
        let excess = records.len() - constants::MAX_HISTORY_RECORDS;
        records.drain(..excess);
        tracing::debug!(dropped = excess, "Oldest export history records dropped");
    }

    let json = serde_json::to_vec_pretty(&records).map_err(|e| StoreError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    fs::write_atomic(path, &json).map_err(|e| StoreError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    tracing::info!(path = %path.display(), records = records.len(), "Export history updated");
    Ok((records.len(), warning))
}
