// BillExact - app/store.rs
//
// File-backed billing book: every entity collection in one JSON document.
//
// - All collections are optional on load; a book with only `entries` is valid.
// - Oversized files are rejected before they are read into memory.
// - IDs must be unique within a collection; there are no cross-collection
//   checks (a matter may name a client that does not exist).
// - Saving is atomic via platform::fs::write_atomic.

use crate::core::model::{
    Activity, BillingEntry, Category, Client, EntryStatus, Matter, Project, TimeEntry,
};
use crate::platform::fs;
use crate::util::constants;
use crate::util::error::StoreError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// In-memory copy of a billing book file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BillingBook {
    pub entries: Vec<BillingEntry>,
    pub matters: Vec<Matter>,
    pub clients: Vec<Client>,
    pub categories: Vec<Category>,
    pub activities: Vec<Activity>,
    pub projects: Vec<Project>,
    pub time_entries: Vec<TimeEntry>,
}

impl BillingBook {
    pub fn entry(&self, id: &str) -> Option<&BillingEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Set `status = exported` on every entry whose ID is in `ids`.
    ///
    /// Returns the number of entries updated.
    pub fn mark_exported<S: AsRef<str>>(&mut self, ids: &[S]) -> usize {
        let ids: HashSet<&str> = ids.iter().map(|id| id.as_ref()).collect();
        let mut updated = 0;
        for entry in &mut self.entries {
            if ids.contains(entry.id.as_str()) && entry.status != EntryStatus::Exported {
                entry.status = EntryStatus::Exported;
                updated += 1;
            }
        }
        updated
    }

    /// Reject books where a collection holds the same ID twice.
    pub fn check_unique_ids(&self) -> Result<(), StoreError> {
        unique("entries", self.entries.iter().map(|e| e.id.as_str()))?;
        unique("matters", self.matters.iter().map(|m| m.id.as_str()))?;
        unique("clients", self.clients.iter().map(|c| c.id.as_str()))?;
        unique("categories", self.categories.iter().map(|c| c.id.as_str()))?;
        unique("activities", self.activities.iter().map(|a| a.id.as_str()))?;
        unique("projects", self.projects.iter().map(|p| p.id.as_str()))?;
        unique("timeEntries", self.time_entries.iter().map(|t| t.id.as_str()))?;
        Ok(())
    }
}

fn unique<'a>(
    collection: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), StoreError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(StoreError::DuplicateId {
                collection,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

/// Load a billing book from `path`.
pub fn load_book(path: &Path) -> Result<BillingBook, StoreError> {
    let io_err = |e| StoreError::Io {
        path: path.to_path_buf(),
        source: e,
    };

    let size = fs::file_size(path).map_err(io_err)?;
    if size > constants::MAX_BOOK_FILE_SIZE {
        return Err(StoreError::FileTooLarge {
            path: path.to_path_buf(),
            size,
            max_size: constants::MAX_BOOK_FILE_SIZE,
        });
    }

    let content = std::fs::read_to_string(path).map_err(io_err)?;
    let book: BillingBook = serde_json::from_str(&content).map_err(|e| StoreError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    book.check_unique_ids()?;

    tracing::info!(
        path = %path.display(),
        entries = book.entries.len(),
        matters = book.matters.len(),
        clients = book.clients.len(),
        time_entries = book.time_entries.len(),
        activities = book.activities.len(),
        "Billing book loaded"
    );
    Ok(book)
}

/// Save a billing book to `path` atomically.
pub fn save_book(book: &BillingBook, path: &Path) -> Result<(), StoreError> {
    book.check_unique_ids()?;
    let json = serde_json::to_vec_pretty(book).map_err(|e| StoreError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    fs::write_atomic(path, &json).map_err(|e| StoreError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    tracing::info!(path = %path.display(), entries = book.entries.len(), "Billing book saved");
    Ok(())
}
