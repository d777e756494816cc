// BillExact - platform/config.rs
//
// Platform directory resolution and config.toml loading with startup
// validation. Every value is checked against the named constants in
// util::constants; bad values are reported and replaced by defaults.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Resolved platform paths for BillExact configuration and data.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/billexact/ or %APPDATA%\BillExact\config\)
    pub config_dir: PathBuf,

    /// Data directory for export history.
    pub data_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to the current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            let data_dir = proj_dirs.data_dir().to_path_buf();

            tracing::debug!(
                config = %config_dir.display(),
                data = %data_dir.display(),
                "Platform paths resolved"
            );

            Self {
                config_dir,
                data_dir,
            }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            Self {
                config_dir: PathBuf::from("."),
                data_dir: PathBuf::from("."),
            }
        }
    }

    /// Default location of config.toml.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }

    /// Location of the export history file.
    pub fn history_file(&self) -> PathBuf {
        self.data_dir.join(constants::HISTORY_FILE_NAME)
    }
}

// =============================================================================
// Raw config.toml shape
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are ignored so a newer config file still loads in an
/// older binary.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub compliance: ComplianceSection,
    pub export: ExportSection,
    pub logging: LoggingSection,
}

/// `[compliance]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ComplianceSection {
    /// Carrier limit for a single entry, in hours.
    pub max_block_hours: Option<f64>,
    /// Minimum narrative length in characters.
    pub min_narrative_chars: Option<usize>,
    /// Replaces the built-in vague term list when present.
    pub vague_terms: Option<Vec<String>>,
    /// `[[compliance.auto_fix]]` entries, applied in file order.
    pub auto_fix: Option<Vec<RawAutoFix>>,
}

/// One `[[compliance.auto_fix]]` table.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct RawAutoFix {
    pub term: String,
    pub replacement: String,
}

/// `[export]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ExportSection {
    pub invoice_number: Option<String>,
    pub law_firm_id: Option<String>,
    pub client_id: Option<String>,
    pub law_firm_matter_id: Option<String>,
    pub client_matter_id: Option<String>,
    pub timekeeper_id: Option<String>,
    /// `[export.timekeeper_ids]`: timekeeper name to LEDES ID.
    pub timekeeper_ids: Option<HashMap<String, String>>,
    /// Append a record to the export history after each export.
    pub record_history: Option<bool>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

// =============================================================================
// Validated config
// =============================================================================

/// Validated application configuration derived from `config.toml`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // -- Compliance --
    pub max_block_hours: f64,
    pub min_narrative_chars: usize,
    pub vague_terms: Vec<String>,
    /// `(term, replacement)` pairs for auto-fix.
    pub auto_fix_replacements: Vec<(String, String)>,

    // -- Export --
    pub invoice_number: String,
    pub law_firm_id: String,
    pub client_id: String,
    pub law_firm_matter_id: String,
    pub client_matter_id: String,
    pub timekeeper_id: String,
    pub timekeeper_ids: HashMap<String, String>,
    pub record_history: bool,

    // -- Logging --
    /// Logging level string (read before tracing is initialised).
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_block_hours: constants::DEFAULT_MAX_BLOCK_HOURS,
            min_narrative_chars: constants::DEFAULT_MIN_NARRATIVE_CHARS,
            vague_terms: constants::DEFAULT_VAGUE_TERMS
                .iter()
                .map(|t| (*t).to_string())
                .collect(),
            auto_fix_replacements: constants::DEFAULT_AUTO_FIX_REPLACEMENTS
                .iter()
                .map(|(t, r)| ((*t).to_string(), (*r).to_string()))
                .collect(),
            invoice_number: constants::DEFAULT_INVOICE_NUMBER.to_string(),
            law_firm_id: constants::DEFAULT_LAW_FIRM_ID.to_string(),
            client_id: constants::DEFAULT_CLIENT_ID.to_string(),
            law_firm_matter_id: constants::DEFAULT_LAW_FIRM_MATTER_ID.to_string(),
            client_matter_id: constants::DEFAULT_CLIENT_MATTER_ID.to_string(),
            timekeeper_id: constants::DEFAULT_TIMEKEEPER_ID.to_string(),
            timekeeper_ids: HashMap::new(),
            record_history: true,
            log_level: None,
        }
    }
}

/// Read and parse a config file without validating values.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn read_raw_config(path: &Path) -> Result<Option<RawConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let raw = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(Some(raw))
}

/// Load and validate `config.toml`.
///
/// Returns the validated config and a list of non-fatal warnings. A missing
/// file yields defaults with no warnings (first run). An unreadable or
/// unparseable file yields defaults with one warning so the tool still runs.
pub fn load_config(path: &Path) -> (AppConfig, Vec<String>) {
    match read_raw_config(path) {
        Ok(Some(raw)) => {
            tracing::info!(path = %path.display(), "Loaded config.toml");
            validate(raw)
        }
        Ok(None) => {
            tracing::debug!(path = %path.display(), "No config.toml found; using defaults");
            (AppConfig::default(), Vec::new())
        }
        Err(e) => {
            let msg = format!("{e}. Using defaults.");
            tracing::warn!("{}", msg);
            (AppConfig::default(), vec![msg])
        }
    }
}

/// Load a config file the user named explicitly.
///
/// Unlike `load_config`, a missing or unparseable file is an error.
pub fn load_config_strict(path: &Path) -> Result<(AppConfig, Vec<String>), ConfigError> {
    match read_raw_config(path)? {
        Some(raw) => Ok(validate(raw)),
        None => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "config file not found"),
        }),
    }
}

fn out_of_range(field: &str, value: impl ToString, expected: String, default: impl ToString) -> String {
    format!(
        "{}. Using default ({}).",
        ConfigError::ValueOutOfRange {
            field: field.to_string(),
            value: value.to_string(),
            expected,
        },
        default.to_string()
    )
}

/// Validate a parsed config against named constants, accumulating warnings.
pub fn validate(raw: RawConfig) -> (AppConfig, Vec<String>) {
    let mut config = AppConfig::default();
    let mut warnings: Vec<String> = Vec::new();

    // -- Compliance: max_block_hours --
    if let Some(hours) = raw.compliance.max_block_hours {
        if hours.is_finite()
            && (constants::MIN_MAX_BLOCK_HOURS..=constants::ABSOLUTE_MAX_BLOCK_HOURS).contains(&hours)
        {
            config.max_block_hours = hours;
        } else {
            warnings.push(out_of_range(
                "compliance.max_block_hours",
                hours,
                format!(
                    "{}-{}",
                    constants::MIN_MAX_BLOCK_HOURS,
                    constants::ABSOLUTE_MAX_BLOCK_HOURS
                ),
                constants::DEFAULT_MAX_BLOCK_HOURS,
            ));
        }
    }

    // -- Compliance: min_narrative_chars --
    if let Some(chars) = raw.compliance.min_narrative_chars {
        if chars <= constants::ABSOLUTE_MAX_MIN_NARRATIVE_CHARS {
            config.min_narrative_chars = chars;
        } else {
            warnings.push(out_of_range(
                "compliance.min_narrative_chars",
                chars,
                format!("0-{}", constants::ABSOLUTE_MAX_MIN_NARRATIVE_CHARS),
                constants::DEFAULT_MIN_NARRATIVE_CHARS,
            ));
        }
    }

    // -- Compliance: vague_terms --
    if let Some(terms) = raw.compliance.vague_terms {
        if terms.len() > constants::MAX_VAGUE_TERMS {
            warnings.push(out_of_range(
                "compliance.vague_terms",
                format!("{} terms", terms.len()),
                format!("at most {}", constants::MAX_VAGUE_TERMS),
                "built-in list",
            ));
        } else {
            let mut accepted = Vec::with_capacity(terms.len());
            for term in terms {
                match check_term(&term) {
                    Some(problem) => warnings.push(format!(
                        "[compliance] vague term \"{term}\" ignored: {problem}."
                    )),
                    None => accepted.push(term.trim().to_string()),
                }
            }
            config.vague_terms = accepted;
        }
    }

    // -- Compliance: auto_fix --
    if let Some(fixes) = raw.compliance.auto_fix {
        let mut accepted = Vec::with_capacity(fixes.len());
        for fix in fixes {
            if let Some(problem) = check_term(&fix.term) {
                warnings.push(format!(
                    "[compliance] auto_fix term \"{}\" ignored: {problem}.",
                    fix.term
                ));
            } else if fix.replacement.trim().is_empty() {
                warnings.push(format!(
                    "[compliance] auto_fix term \"{}\" ignored: replacement is empty.",
                    fix.term
                ));
            } else {
                accepted.push((fix.term.trim().to_string(), fix.replacement));
            }
        }
        config.auto_fix_replacements = accepted;
    }

    // -- Export: LEDES identifiers --
    let export = raw.export;
    let id_fields: [(&str, Option<String>, &mut String); 6] = [
        ("invoice_number", export.invoice_number, &mut config.invoice_number),
        ("law_firm_id", export.law_firm_id, &mut config.law_firm_id),
        ("client_id", export.client_id, &mut config.client_id),
        (
            "law_firm_matter_id",
            export.law_firm_matter_id,
            &mut config.law_firm_matter_id,
        ),
        (
            "client_matter_id",
            export.client_matter_id,
            &mut config.client_matter_id,
        ),
        ("timekeeper_id", export.timekeeper_id, &mut config.timekeeper_id),
    ];
    for (field, value, target) in id_fields {
        let Some(value) = value else { continue };
        match check_ledes_id(&value) {
            None => *target = value.trim().to_string(),
            Some(problem) => warnings.push(format!(
                "[export] {field} = \"{value}\" is invalid: {problem}. Using default ({target})."
            )),
        }
    }

    // -- Export: timekeeper_ids --
    if let Some(map) = export.timekeeper_ids {
        for (name, id) in map {
            match check_ledes_id(&id) {
                None => {
                    config
                        .timekeeper_ids
                        .insert(name.trim().to_string(), id.trim().to_string());
                }
                Some(problem) => warnings.push(format!(
                    "[export.timekeeper_ids] \"{name}\" = \"{id}\" ignored: {problem}."
                )),
            }
        }
    }

    if let Some(record) = export.record_history {
        config.record_history = record;
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.to_lowercase());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default ({}).",
                constants::DEFAULT_LOG_LEVEL
            ));
        }
    }

    if !warnings.is_empty() {
        tracing::warn!(count = warnings.len(), "Config validation produced warnings");
    }

    (config, warnings)
}

fn check_term(term: &str) -> Option<String> {
    let trimmed = term.trim();
    if trimmed.is_empty() {
        Some("term is empty".to_string())
    } else if trimmed.chars().count() > constants::MAX_VAGUE_TERM_LENGTH {
        Some(format!(
            "longer than {} characters",
            constants::MAX_VAGUE_TERM_LENGTH
        ))
    } else {
        None
    }
}

fn check_ledes_id(id: &str) -> Option<String> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Some("value is empty".to_string())
    } else if trimmed.chars().count() > constants::MAX_LEDES_ID_LENGTH {
        Some(format!(
            "longer than {} characters",
            constants::MAX_LEDES_ID_LENGTH
        ))
    } else if trimmed.contains(['|', '[', ']']) {
        Some("contains a LEDES delimiter ('|', '[' or ']')".to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(toml_text: &str) -> (AppConfig, Vec<String>) {
        validate(toml::from_str(toml_text).unwrap())
    }

    #[test]
    fn test_missing_file_gives_defaults_without_warnings() {
        let dir = TempDir::new().unwrap();
        let (config, warnings) = load_config(&dir.path().join("config.toml"));
        assert!(warnings.is_empty());
        assert_eq!(config.max_block_hours, constants::DEFAULT_MAX_BLOCK_HOURS);
        assert_eq!(config.vague_terms.len(), constants::DEFAULT_VAGUE_TERMS.len());
        assert!(config.record_history);
    }

    #[test]
    fn test_unparseable_file_warns_and_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[compliance\nmax_block_hours = ").unwrap();

        let (config, warnings) = load_config(&path);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Config parse error"));
        assert_eq!(config.invoice_number, constants::DEFAULT_INVOICE_NUMBER);

        assert!(matches!(
            load_config_strict(&path),
            Err(ConfigError::TomlParse { .. })
        ));
        assert!(matches!(
            load_config_strict(&dir.path().join("absent.toml")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_valid_values_are_applied() {
        let (config, warnings) = parse(
            r#"
            [compliance]
            max_block_hours = 0.5
            min_narrative_chars = 40
            vague_terms = ["review", " misc "]

            [[compliance.auto_fix]]
            term = "misc"
            replacement = "Miscellaneous correspondence regarding"

            [export]
            invoice_number = "INV-2024-03"
            law_firm_id = "12-3456789"
            record_history = false

            [export.timekeeper_ids]
            "John Smith" = "JS01"

            [logging]
            level = "DEBUG"
            "#,
        );
        assert!(warnings.is_empty(), "{warnings:?}");
        assert_eq!(config.max_block_hours, 0.5);
        assert_eq!(config.min_narrative_chars, 40);
        assert_eq!(config.vague_terms, vec!["review", "misc"]);
        assert_eq!(
            config.auto_fix_replacements,
            vec![(
                "misc".to_string(),
                "Miscellaneous correspondence regarding".to_string()
            )]
        );
        assert_eq!(config.invoice_number, "INV-2024-03");
        assert_eq!(config.law_firm_id, "12-3456789");
        assert_eq!(config.client_id, constants::DEFAULT_CLIENT_ID);
        assert_eq!(config.timekeeper_ids.get("John Smith").map(String::as_str), Some("JS01"));
        assert!(!config.record_history);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_out_of_range_values_fall_back_with_warnings() {
        let (config, warnings) = parse(
            r#"
            [compliance]
            max_block_hours = 48.0
            min_narrative_chars = 10000
            vague_terms = ["", "stuff"]

            [export]
            invoice_number = "INV|001"

            [logging]
            level = "loud"
            "#,
        );
        assert_eq!(warnings.len(), 5, "{warnings:?}");
        assert_eq!(config.max_block_hours, constants::DEFAULT_MAX_BLOCK_HOURS);
        assert_eq!(
            config.min_narrative_chars,
            constants::DEFAULT_MIN_NARRATIVE_CHARS
        );
        assert_eq!(config.vague_terms, vec!["stuff"]);
        assert_eq!(config.invoice_number, constants::DEFAULT_INVOICE_NUMBER);
        assert!(config.log_level.is_none());
        assert!(warnings[0].contains("compliance.max_block_hours"));
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let (_, warnings) = parse(
            r#"
            [ui]
            theme = "dark"

            [compliance]
            strictness = "high"
            "#,
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_empty_vague_term_list_disables_rule() {
        let (config, warnings) = parse("[compliance]\nvague_terms = []\n");
        assert!(warnings.is_empty());
        assert!(config.vague_terms.is_empty());
    }
}
