// BillExact - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "BillExact";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "BillExact";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Compliance rules
// =============================================================================

/// Default carrier limit on the hours a single entry may bill.
pub const DEFAULT_MAX_BLOCK_HOURS: f64 = 0.3;

/// Smallest configurable block-time limit (hours).
pub const MIN_MAX_BLOCK_HOURS: f64 = 0.1;

/// Largest configurable block-time limit (hours). A full day.
pub const ABSOLUTE_MAX_BLOCK_HOURS: f64 = 24.0;

/// Narratives shorter than this (after trimming) lack detail.
pub const DEFAULT_MIN_NARRATIVE_CHARS: usize = 30;

/// Upper bound on the configurable minimum narrative length.
pub const ABSOLUTE_MAX_MIN_NARRATIVE_CHARS: usize = 500;

/// Terms that make a narrative too vague for carrier review.
///
/// Matched case-insensitively on word boundaries, so "review" flags
/// "Review documents." but not "Reviewed the agreement".
pub const DEFAULT_VAGUE_TERMS: &[&str] = &[
    "review",
    "research",
    "various tasks",
    "worked on",
    "stuff",
    "things",
    "did some",
];

/// Default auto-fix replacements for vague narrative terms: (term, replacement).
pub const DEFAULT_AUTO_FIX_REPLACEMENTS: &[(&str, &str)] = &[
    ("review", "Reviewed and analyzed specific"),
    ("research", "Conducted detailed research regarding"),
];

/// Maximum number of vague terms accepted from configuration.
pub const MAX_VAGUE_TERMS: usize = 200;

/// Maximum length of a single vague term.
pub const MAX_VAGUE_TERM_LENGTH: usize = 100;

/// Tolerance when comparing `hours * rate` against the billed amount.
pub const AMOUNT_TOLERANCE: f64 = 0.01;

/// UTBMS task codes: one uppercase letter and three digits (L110, B120, ...).
pub const UTBMS_TASK_CODE_PATTERN: &str = r"^[A-Z]\d{3}$";

/// UTBMS activity codes: "A" and three digits (A101, ...).
pub const UTBMS_ACTIVITY_CODE_PATTERN: &str = r"^A\d{3}$";

// =============================================================================
// Narrative quality scoring
// =============================================================================

/// Phrases penalised by the narrative quality score.
pub const QUALITY_VAGUE_PHRASES: &[&str] =
    &["worked on", "various tasks", "stuff", "things", "did some"];

/// Action verbs a well-formed narrative should contain.
pub const QUALITY_ACTION_VERBS: &[&str] = &[
    "developed",
    "created",
    "implemented",
    "fixed",
    "optimized",
    "designed",
    "reviewed",
];

/// Penalty per vague phrase.
pub const QUALITY_VAGUE_PENALTY: u32 = 15;

/// Penalty for a narrative shorter than `QUALITY_MIN_CHARS`.
pub const QUALITY_SHORT_PENALTY: u32 = 20;

/// Penalty for a narrative without any action verb.
pub const QUALITY_NO_VERB_PENALTY: u32 = 10;

/// Narratives shorter than this lose `QUALITY_SHORT_PENALTY`.
pub const QUALITY_MIN_CHARS: usize = 50;

/// Score at or above which a narrative is graded "Good".
pub const QUALITY_GOOD_THRESHOLD: u32 = 80;

/// Score at or above which a narrative is graded "Fair".
pub const QUALITY_FAIR_THRESHOLD: u32 = 60;

// =============================================================================
// LEDES defaults
// =============================================================================

/// Placeholder identifiers used when neither config nor the matter
/// catalogue provides a value.
pub const DEFAULT_INVOICE_NUMBER: &str = "INV001";
pub const DEFAULT_CLIENT_ID: &str = "CLIENT001";
pub const DEFAULT_LAW_FIRM_MATTER_ID: &str = "MATTER001";
pub const DEFAULT_TIMEKEEPER_ID: &str = "TK001";
pub const DEFAULT_LAW_FIRM_ID: &str = "FIRM001";
pub const DEFAULT_CLIENT_MATTER_ID: &str = "CLIENTMATTER001";

/// Maximum length of a configured LEDES identifier.
pub const MAX_LEDES_ID_LENGTH: usize = 64;

// =============================================================================
// Export
// =============================================================================

/// Maximum number of entries that can be exported in a single operation.
pub const MAX_EXPORT_ENTRIES: usize = 1_000_000;

/// Maximum number of export history records retained on disk.
pub const MAX_HISTORY_RECORDS: usize = 1_000;

// =============================================================================
// Data store
// =============================================================================

/// Maximum size of a billing book JSON file in bytes.
pub const MAX_BOOK_FILE_SIZE: u64 = 64 * 1024 * 1024; // 64 MB

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Maximum number of narrative characters included in debug output.
/// Narratives can carry privileged client detail.
pub const DEBUG_MAX_NARRATIVE_PREVIEW: usize = 40;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Export history file name (stored in the platform data directory).
pub const HISTORY_FILE_NAME: &str = "export_history.json";
