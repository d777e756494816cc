// BillExact - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no
// platform dependencies.
//
// JSON field names follow the camelCase shape used by the REST backend
// and browser storage, so books exported from either load unchanged.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Billing Entry
// =============================================================================

/// A single billable line item for a legal matter.
///
/// This is the unit that flows through compliance checking, filtering,
/// and LEDES/CSV export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingEntry {
    pub id: String,

    /// Work date.
    #[serde(with = "flexible_date")]
    pub date: NaiveDate,

    /// Timekeeper display name (e.g. "John Smith").
    pub timekeeper: String,

    /// ID of the matter this entry bills against (`Matter::id`).
    pub matter_id: String,

    /// UTBMS task code (e.g. "L110").
    #[serde(default)]
    pub task_code: String,

    /// UTBMS activity code (e.g. "A101").
    #[serde(default)]
    pub activity_code: String,

    pub hours: f64,

    /// Hourly rate.
    pub rate: f64,

    /// Billed amount. Normally `hours * rate`.
    pub amount: f64,

    #[serde(default)]
    pub narrative: String,

    #[serde(default)]
    pub status: EntryStatus,

    /// Result of the last compliance check.
    #[serde(default)]
    pub compliance_status: ComplianceStatus,

    /// Human-readable issue messages from the last compliance check.
    #[serde(default)]
    pub compliance_issues: Vec<String>,
}

/// Workflow state of a billing entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub enum EntryStatus {
    #[default]
    Draft,
    Ready,
    Exported,
}

impl EntryStatus {
    pub fn all() -> &'static [EntryStatus] {
        &[EntryStatus::Draft, EntryStatus::Ready, EntryStatus::Exported]
    }

    pub fn label(&self) -> &'static str {
        match self {
            EntryStatus::Draft => "Draft",
            EntryStatus::Ready => "Ready",
            EntryStatus::Exported => "Exported",
        }
    }

    /// Case-insensitive lookup by label.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|s| s.label().eq_ignore_ascii_case(label.trim()))
    }
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Compliance verdict for an entry, ordered from best to worst.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum ComplianceStatus {
    #[default]
    Compliant,
    Warning,
    Error,
}

impl ComplianceStatus {
    pub fn all() -> &'static [ComplianceStatus] {
        &[
            ComplianceStatus::Compliant,
            ComplianceStatus::Warning,
            ComplianceStatus::Error,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            ComplianceStatus::Compliant => "compliant",
            ComplianceStatus::Warning => "warning",
            ComplianceStatus::Error => "error",
        }
    }

    /// Case-insensitive lookup by label.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|s| s.label().eq_ignore_ascii_case(label.trim()))
    }
}

impl std::fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Export
// =============================================================================

/// Supported export file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExportFormat {
    #[serde(rename = "LEDES")]
    Ledes,
    #[serde(rename = "CSV")]
    Csv,
}

impl ExportFormat {
    /// Label used in file names and history records.
    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::Ledes => "LEDES",
            ExportFormat::Csv => "CSV",
        }
    }

    /// File extension (without the dot).
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Ledes => "txt",
            ExportFormat::Csv => "csv",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One completed export, as recorded in the export history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportHistory {
    pub id: String,
    pub export_date: DateTime<Utc>,
    /// Distinct matter IDs covered by the export, sorted.
    pub matter_ids: Vec<String>,
    pub total_hours: f64,
    pub total_amount: f64,
    pub filename: String,
    pub format: ExportFormat,
}

// =============================================================================
// Clients and matters
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub name: String,
    /// Firm's internal client ID (used as LEDES CLIENT_ID).
    pub client_id: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub billing_contact: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_guidelines: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Matter {
    pub id: String,
    /// Firm's internal matter ID (used as LEDES LAW_FIRM_MATTER_ID).
    pub matter_id: String,
    pub matter_name: String,
    /// Owning client (`Client::id`). Not enforced.
    pub client_id: String,
    #[serde(default)]
    pub case_type: CaseType,
    #[serde(default)]
    pub status: MatterStatus,
    #[serde(default)]
    pub billing_rules: String,
    #[serde(default)]
    pub assigned_attorneys: Vec<String>,
    #[serde(default)]
    pub notes: String,
    /// Hours logged against the matter.
    #[serde(default)]
    pub total_time_logged: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CaseType {
    Litigation,
    Transactional,
    Corporate,
    #[serde(rename = "Real Estate")]
    RealEstate,
    #[serde(rename = "IP")]
    Ip,
    Employment,
    #[default]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MatterStatus {
    #[default]
    Active,
    Closed,
    #[serde(rename = "On Hold")]
    OnHold,
}

// =============================================================================
// Time tracking
// =============================================================================

/// A tracked application activity (one focused window over a span of time).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub app_name: String,
    #[serde(default)]
    pub app_icon: String,
    #[serde(default)]
    pub window_title: String,
    /// Duration in minutes.
    pub duration: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matter_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
}

/// A keyword-driven activity category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub icon: String,
    /// Matched case-insensitively against activity app names and window titles.
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub total_time_this_week: f64,
    #[serde(default)]
    pub entry_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub total_hours: f64,
    #[serde(default)]
    pub billable_rate: f64,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Active,
    Archived,
}

/// A timesheet entry (non-legal mode).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default)]
    pub description: String,
    /// Duration in minutes.
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(with = "flexible_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub billable: bool,
}

// =============================================================================
// Date (de)serialisation
// =============================================================================

/// Serialises dates as `YYYY-MM-DD`; accepts either that or a full RFC 3339
/// timestamp (browser `Date` values are stored as `2024-03-15T00:00:00.000Z`),
/// in which case the UTC calendar date is kept.
pub mod flexible_date {
    use chrono::{DateTime, NaiveDate};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    /// Parse a date-only or RFC 3339 string.
    pub fn parse(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
        let raw = raw.trim();
        match NaiveDate::parse_from_str(raw, FORMAT) {
            Ok(d) => Ok(d),
            Err(date_err) => DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.naive_utc().date())
                .map_err(|_| date_err),
        }
    }
}
