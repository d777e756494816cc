// BillExact - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// No string-based error propagation.
// All errors preserve the causal chain for diagnostic logging.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all BillExact operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum BillExactError {
    /// Billing book loading or saving failed.
    Store(StoreError),

    /// Compliance rule construction failed.
    Compliance(ComplianceError),

    /// Export operation failed.
    Export(ExportError),

    /// Filter construction failed.
    Filter(FilterError),

    /// Configuration loading or validation failed.
    Config(ConfigError),

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for BillExactError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "Data store error: {e}"),
            Self::Compliance(e) => write!(f, "Compliance error: {e}"),
            Self::Export(e) => write!(f, "Export error: {e}"),
            Self::Filter(e) => write!(f, "Filter error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for BillExactError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            Self::Compliance(e) => Some(e),
            Self::Export(e) => Some(e),
            Self::Filter(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Io { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

/// Errors related to reading and writing billing book and history files.
#[derive(Debug)]
pub enum StoreError {
    /// File could not be read or written.
    Io { path: PathBuf, source: io::Error },

    /// JSON could not be parsed or produced.
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// File exceeds the maximum allowed size.
    FileTooLarge {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },

    /// Two records in the same collection share an ID.
    DuplicateId {
        collection: &'static str,
        id: String,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "I/O error on '{}': {source}", path.display())
            }
            Self::Json { path, source } => {
                write!(f, "Invalid JSON in '{}': {source}", path.display())
            }
            Self::FileTooLarge {
                path,
                size,
                max_size,
            } => write!(
                f,
                "'{}' is {size} bytes, exceeds maximum of {max_size} bytes",
                path.display()
            ),
            Self::DuplicateId { collection, id } => {
                write!(f, "Duplicate ID '{id}' in {collection}")
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<StoreError> for BillExactError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

// ---------------------------------------------------------------------------
// Compliance errors
// ---------------------------------------------------------------------------

/// Errors building a compliance rule set from configuration.
#[derive(Debug)]
pub enum ComplianceError {
    /// A vague term is empty or whitespace only.
    EmptyTerm,

    /// A vague term exceeds the maximum length.
    TermTooLong {
        term: String,
        length: usize,
        max_length: usize,
    },

    /// Too many vague terms configured.
    TooManyTerms { count: usize, max: usize },

    /// The compiled term matcher was rejected by the regex engine.
    InvalidRegex {
        pattern: String,
        source: regex::Error,
    },
}

impl fmt::Display for ComplianceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTerm => write!(f, "Vague term list contains an empty term"),
            Self::TermTooLong {
                term,
                length,
                max_length,
            } => write!(
                f,
                "Vague term '{term}' is {length} chars, exceeds maximum of {max_length}"
            ),
            Self::TooManyTerms { count, max } => {
                write!(f, "Too many vague terms ({count}), maximum is {max}")
            }
            Self::InvalidRegex { pattern, source } => {
                write!(f, "Invalid term pattern '{pattern}': {source}")
            }
        }
    }
}

impl std::error::Error for ComplianceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidRegex { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ComplianceError> for BillExactError {
    fn from(e: ComplianceError) -> Self {
        Self::Compliance(e)
    }
}

// ---------------------------------------------------------------------------
// Filter errors
// ---------------------------------------------------------------------------

/// Errors related to filter construction.
#[derive(Debug)]
pub enum FilterError {
    /// A date argument could not be parsed.
    InvalidDate {
        input: String,
        source: chrono::ParseError,
    },

    /// The start of a date range is after its end.
    InvertedRange { start: String, end: String },

    /// A status name is not recognised.
    UnknownStatus { input: String },

    /// A compliance status name is not recognised.
    UnknownComplianceStatus { input: String },
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDate { input, source } => {
                write!(f, "Invalid date '{input}' (expected YYYY-MM-DD): {source}")
            }
            Self::InvertedRange { start, end } => {
                write!(f, "Date range start {start} is after end {end}")
            }
            Self::UnknownStatus { input } => write!(
                f,
                "Unknown status '{input}'. Expected one of: draft, ready, exported"
            ),
            Self::UnknownComplianceStatus { input } => write!(
                f,
                "Unknown compliance status '{input}'. Expected one of: compliant, warning, error"
            ),
        }
    }
}

impl std::error::Error for FilterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidDate { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<FilterError> for BillExactError {
    fn from(e: FilterError) -> Self {
        Self::Filter(e)
    }
}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

/// Errors related to export operations.
#[derive(Debug)]
pub enum ExportError {
    /// I/O error writing the export file.
    Io { path: PathBuf, source: io::Error },

    /// CSV serialisation error.
    Csv { path: PathBuf, source: csv::Error },

    /// Nothing was selected for export.
    NoEntries,

    /// Export would exceed maximum entry count.
    TooManyEntries { count: usize, max: usize },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Export I/O error '{}': {source}", path.display())
            }
            Self::Csv { path, source } => {
                write!(f, "CSV export error '{}': {source}", path.display())
            }
            Self::NoEntries => write!(
                f,
                "No entries selected for export. Relax the filters or add entries."
            ),
            Self::TooManyEntries { count, max } => write!(
                f,
                "Export of {count} entries exceeds maximum of {max}. \
                 Apply filters to reduce the result set."
            ),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ExportError> for BillExactError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for BillExactError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience type alias for BillExact results.
pub type Result<T> = std::result::Result<T, BillExactError>;
