// BillExact - core/filter.rs
//
// Composable filter for selecting billing entries to check or export.
// All active filters are AND-combined.
// Core layer: pure logic, no I/O.

use crate::core::model::{flexible_date, BillingEntry, ComplianceStatus, EntryStatus};
use crate::util::error::FilterError;
use chrono::NaiveDate;
use std::collections::HashSet;

/// Complete filter state. All fields are AND-combined when applied.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    /// Workflow statuses to include (empty = all).
    pub statuses: HashSet<EntryStatus>,

    /// Compliance statuses to include (empty = all).
    pub compliance: HashSet<ComplianceStatus>,

    /// Matter IDs to include (empty = all).
    pub matter_ids: HashSet<String>,

    /// Timekeeper name, case-insensitive exact match. Empty = no filter.
    pub timekeeper: String,

    /// Start of date range (inclusive). None = no lower bound.
    pub date_start: Option<NaiveDate>,

    /// End of date range (inclusive). None = no upper bound.
    pub date_end: Option<NaiveDate>,
}

impl EntryFilter {
    /// Returns true if no filters are active.
    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
            && self.compliance.is_empty()
            && self.matter_ids.is_empty()
            && self.timekeeper.is_empty()
            && self.date_start.is_none()
            && self.date_end.is_none()
    }

    /// Add workflow statuses by label ("draft", "Ready", ...).
    pub fn with_status_labels<S: AsRef<str>>(mut self, labels: &[S]) -> Result<Self, FilterError> {
        for label in labels {
            let status = EntryStatus::from_label(label.as_ref()).ok_or_else(|| {
                FilterError::UnknownStatus {
                    input: label.as_ref().to_string(),
                }
            })?;
            self.statuses.insert(status);
        }
        Ok(self)
    }

    /// Add compliance statuses by label ("warning", "Error", ...).
    pub fn with_compliance_labels<S: AsRef<str>>(
        mut self,
        labels: &[S],
    ) -> Result<Self, FilterError> {
        for label in labels {
            let status = ComplianceStatus::from_label(label.as_ref()).ok_or_else(|| {
                FilterError::UnknownComplianceStatus {
                    input: label.as_ref().to_string(),
                }
            })?;
            self.compliance.insert(status);
        }
        Ok(self)
    }

    /// Set the date range from `YYYY-MM-DD` strings.
    ///
    /// Either bound may be omitted. Returns an error if a date is malformed
    /// or the start is after the end.
    pub fn with_date_range(
        mut self,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Self, FilterError> {
        let parse = |raw: &str| {
            flexible_date::parse(raw).map_err(|e| FilterError::InvalidDate {
                input: raw.to_string(),
                source: e,
            })
        };
        self.date_start = start.map(parse).transpose()?;
        self.date_end = end.map(parse).transpose()?;

        if let (Some(s), Some(e)) = (self.date_start, self.date_end) {
            if s > e {
                return Err(FilterError::InvertedRange {
                    start: s.to_string(),
                    end: e.to_string(),
                });
            }
        }
        Ok(self)
    }

    /// Quick filter: entries ready to bill.
    pub fn ready_only() -> Self {
        let mut statuses = HashSet::new();
        statuses.insert(EntryStatus::Ready);
        Self {
            statuses,
            ..Default::default()
        }
    }
}

/// Apply filters to a slice of entries, returning indices of matching entries.
pub fn apply_filters(entries: &[BillingEntry], filter: &EntryFilter) -> Vec<usize> {
    if filter.is_empty() {
        return (0..entries.len()).collect();
    }

    let timekeeper = filter.timekeeper.trim().to_lowercase();

    entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| matches_all(entry, filter, &timekeeper))
        .map(|(idx, _)| idx)
        .collect()
}

/// Clone the entries that match the filter, preserving order.
pub fn select(entries: &[BillingEntry], filter: &EntryFilter) -> Vec<BillingEntry> {
    apply_filters(entries, filter)
        .into_iter()
        .map(|idx| entries[idx].clone())
        .collect()
}

fn matches_all(entry: &BillingEntry, filter: &EntryFilter, timekeeper_lower: &str) -> bool {
    if !filter.statuses.is_empty() && !filter.statuses.contains(&entry.status) {
        return false;
    }

    if !filter.compliance.is_empty() && !filter.compliance.contains(&entry.compliance_status) {
        return false;
    }

    if !filter.matter_ids.is_empty() && !filter.matter_ids.contains(&entry.matter_id) {
        return false;
    }

    if !timekeeper_lower.is_empty() && entry.timekeeper.trim().to_lowercase() != timekeeper_lower
    {
        return false;
    }

    if let Some(start) = filter.date_start {
        if entry.date < start {
            return false;
        }
    }
    if let Some(end) = filter.date_end {
        if entry.date > end {
            return false;
        }
    }

    true
}
