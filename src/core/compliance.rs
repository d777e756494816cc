// BillExact - core/compliance.rs
//
// Carrier compliance checks for billing entries, plus auto-fix.
// Core layer: pure logic on in-memory entries, no I/O.
//
// Every rule yields zero or more `ComplianceIssue`s; an entry's status is
// the worst issue severity found. Auto-fix rewrites narratives and clamps
// block time, then re-checks so the stored status always reflects the
// entry's current content.

use crate::core::model::{BillingEntry, ComplianceStatus};
use crate::util::constants;
use crate::util::error::ComplianceError;
use crate::util::logging::narrative_preview;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::Range;

// =============================================================================
// Issues
// =============================================================================

/// Issue categories, in the order reports list them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum IssueKind {
    BlockTime,
    VagueNarrative,
    MissingInformation,
    InvalidCode,
    InvalidHours,
    AmountMismatch,
}

impl IssueKind {
    /// Category heading shown in reports.
    pub fn category_label(&self) -> &'static str {
        match self {
            IssueKind::BlockTime => "Block Time Violations",
            IssueKind::VagueNarrative => "Vague Narratives",
            IssueKind::MissingInformation => "Missing Information",
            IssueKind::InvalidCode => "Invalid UTBMS Codes",
            IssueKind::InvalidHours => "Invalid Hours",
            IssueKind::AmountMismatch => "Amount Mismatches",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Warning,
    Error,
}

impl IssueSeverity {
    fn status(self) -> ComplianceStatus {
        match self {
            IssueSeverity::Warning => ComplianceStatus::Warning,
            IssueSeverity::Error => ComplianceStatus::Error,
        }
    }
}

/// A single rule violation found on an entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceIssue {
    pub kind: IssueKind,
    pub severity: IssueSeverity,
    pub message: String,
}

impl ComplianceIssue {
    fn warning(kind: IssueKind, message: String) -> Self {
        Self {
            kind,
            severity: IssueSeverity::Warning,
            message,
        }
    }

    fn error(kind: IssueKind, message: String) -> Self {
        Self {
            kind,
            severity: IssueSeverity::Error,
            message,
        }
    }
}

// =============================================================================
// Rules
// =============================================================================

/// A narrative rewrite applied by auto-fix.
#[derive(Debug, Clone)]
struct NarrativeFix {
    term: String,
    pattern: Regex,
    replacement: String,
}

/// Compiled compliance rule set.
///
/// Built once from configuration; all regexes are compiled up front so
/// checking is allocation-light per entry.
#[derive(Debug, Clone)]
pub struct ComplianceRules {
    /// Maximum hours a single entry may bill before it is block time.
    pub max_block_hours: f64,

    /// Minimum trimmed narrative length (characters).
    pub min_narrative_chars: usize,

    vague_terms: Vec<String>,
    vague_matcher: Option<Regex>,
    fixes: Vec<NarrativeFix>,
    /// Matches auto-fix replacement text; terms inside it are not vague.
    rewritten: Option<Regex>,
    task_code: Regex,
    activity_code: Regex,
}

impl ComplianceRules {
    /// Build a rule set.
    ///
    /// `vague_terms` may be empty (disables the vague-narrative rule).
    /// `replacements` are `(term, replacement)` pairs used by auto-fix.
    pub fn new(
        max_block_hours: f64,
        min_narrative_chars: usize,
        vague_terms: &[String],
        replacements: &[(String, String)],
    ) -> Result<Self, ComplianceError> {
        if vague_terms.len() > constants::MAX_VAGUE_TERMS {
            return Err(ComplianceError::TooManyTerms {
                count: vague_terms.len(),
                max: constants::MAX_VAGUE_TERMS,
            });
        }

        let mut normalised: Vec<String> = Vec::with_capacity(vague_terms.len());
        for term in vague_terms {
            let term = validate_term(term)?;
            if !normalised.contains(&term) {
                normalised.push(term);
            }
        }

        let vague_matcher = if normalised.is_empty() {
            None
        } else {
            let alternation = normalised
                .iter()
                .map(|t| whole_term(t))
                .collect::<Vec<_>>()
                .join("|");
            Some(compile(&format!("(?i)(?:{alternation})"))?)
        };

        let mut fixes = Vec::with_capacity(replacements.len());
        for (term, replacement) in replacements {
            let term = validate_term(term)?;
            let pattern = compile(&format!("(?i){}", whole_term(&term)))?;
            fixes.push(NarrativeFix {
                term,
                pattern,
                replacement: replacement.clone(),
            });
        }

        let rewritten_phrases: Vec<String> = fixes
            .iter()
            .map(|f| f.replacement.trim())
            .filter(|r| !r.is_empty())
            .map(regex::escape)
            .collect();
        let rewritten = if rewritten_phrases.is_empty() {
            None
        } else {
            Some(compile(&format!("(?i)(?:{})", rewritten_phrases.join("|")))?)
        };

        Ok(Self {
            max_block_hours,
            min_narrative_chars,
            vague_terms: normalised,
            vague_matcher,
            fixes,
            rewritten,
            task_code: compile(constants::UTBMS_TASK_CODE_PATTERN)?,
            activity_code: compile(constants::UTBMS_ACTIVITY_CODE_PATTERN)?,
        })
    }

    /// The built-in rule set: default thresholds, vague terms, and fixes.
    pub fn standard() -> Result<Self, ComplianceError> {
        let terms: Vec<String> = constants::DEFAULT_VAGUE_TERMS
            .iter()
            .map(|t| (*t).to_string())
            .collect();
        let fixes: Vec<(String, String)> = constants::DEFAULT_AUTO_FIX_REPLACEMENTS
            .iter()
            .map(|(t, r)| ((*t).to_string(), (*r).to_string()))
            .collect();
        Self::new(
            constants::DEFAULT_MAX_BLOCK_HOURS,
            constants::DEFAULT_MIN_NARRATIVE_CHARS,
            &terms,
            &fixes,
        )
    }

    /// The normalised (lowercase, trimmed, de-duplicated) vague terms.
    pub fn vague_terms(&self) -> &[String] {
        &self.vague_terms
    }

    /// Distinct vague terms found in `narrative`, lowercase, in order of
    /// first appearance.
    ///
    /// Occurrences inside auto-fix replacement text do not count.
    pub fn find_vague_terms(&self, narrative: &str) -> Vec<String> {
        let Some(ref matcher) = self.vague_matcher else {
            return Vec::new();
        };
        let rewritten = self.rewritten_spans(narrative);
        let mut found: Vec<String> = Vec::new();
        for m in matcher.find_iter(narrative) {
            if within(&rewritten, m.range()) {
                continue;
            }
            let term = m.as_str().to_lowercase();
            if !found.contains(&term) {
                found.push(term);
            }
        }
        found
    }

    fn rewritten_spans(&self, text: &str) -> Vec<Range<usize>> {
        match self.rewritten {
            Some(ref re) => re.find_iter(text).map(|m| m.range()).collect(),
            None => Vec::new(),
        }
    }
}

fn within(spans: &[Range<usize>], range: Range<usize>) -> bool {
    spans
        .iter()
        .any(|s| s.start <= range.start && range.end <= s.end)
}

/// Escaped term with `\b` on each side that starts or ends with a word
/// character. `\b` next to punctuation would demand a word character there.
fn whole_term(term: &str) -> String {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let mut pattern = String::new();
    if term.chars().next().is_some_and(is_word) {
        pattern.push_str(r"\b");
    }
    pattern.push_str(&regex::escape(term));
    if term.chars().next_back().is_some_and(is_word) {
        pattern.push_str(r"\b");
    }
    pattern
}

fn validate_term(term: &str) -> Result<String, ComplianceError> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return Err(ComplianceError::EmptyTerm);
    }
    let length = term.chars().count();
    if length > constants::MAX_VAGUE_TERM_LENGTH {
        return Err(ComplianceError::TermTooLong {
            term,
            length,
            max_length: constants::MAX_VAGUE_TERM_LENGTH,
        });
    }
    Ok(term)
}

fn compile(pattern: &str) -> Result<Regex, ComplianceError> {
    Regex::new(pattern).map_err(|e| ComplianceError::InvalidRegex {
        pattern: pattern.to_string(),
        source: e,
    })
}

// =============================================================================
// Checking
// =============================================================================

/// Result of checking one entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryCheck {
    pub entry_id: String,
    pub status: ComplianceStatus,
    pub issues: Vec<ComplianceIssue>,
}

impl EntryCheck {
    pub fn has_kind(&self, kind: IssueKind) -> bool {
        self.issues.iter().any(|i| i.kind == kind)
    }

    pub fn messages(&self) -> Vec<String> {
        self.issues.iter().map(|i| i.message.clone()).collect()
    }
}

/// Check a single entry against every rule.
pub fn check_entry(entry: &BillingEntry, rules: &ComplianceRules) -> EntryCheck {
    let mut issues = Vec::new();

    // Hours
    let hours_valid = entry.hours.is_finite() && entry.hours > 0.0;
    if !hours_valid {
        issues.push(ComplianceIssue::error(
            IssueKind::InvalidHours,
            format!("Hours must be positive (got {})", entry.hours),
        ));
    } else if entry.hours > rules.max_block_hours {
        issues.push(ComplianceIssue::error(
            IssueKind::BlockTime,
            format!(
                "Exceeds max block time ({}h for carrier)",
                rules.max_block_hours
            ),
        ));
    }

    // Narrative
    let narrative = entry.narrative.trim();
    if narrative.is_empty() {
        issues.push(ComplianceIssue::error(
            IssueKind::MissingInformation,
            "Missing narrative".to_string(),
        ));
    } else {
        let vague = rules.find_vague_terms(narrative);
        if !vague.is_empty() {
            let quoted = vague
                .iter()
                .map(|t| format!("\"{t}\""))
                .collect::<Vec<_>>()
                .join(", ");
            issues.push(ComplianceIssue::warning(
                IssueKind::VagueNarrative,
                format!("Vague narrative - contains {quoted}"),
            ));
        }
        if narrative.chars().count() < rules.min_narrative_chars {
            issues.push(ComplianceIssue::warning(
                IssueKind::MissingInformation,
                format!(
                    "Missing detail - narrative shorter than {} characters",
                    rules.min_narrative_chars
                ),
            ));
        }
    }

    // UTBMS codes
    let task_code = entry.task_code.trim();
    if task_code.is_empty() {
        issues.push(ComplianceIssue::error(
            IssueKind::MissingInformation,
            "Missing UTBMS task code".to_string(),
        ));
    } else if !rules.task_code.is_match(task_code) {
        issues.push(ComplianceIssue::warning(
            IssueKind::InvalidCode,
            format!("Invalid UTBMS task code '{task_code}'"),
        ));
    }

    let activity_code = entry.activity_code.trim();
    if activity_code.is_empty() {
        issues.push(ComplianceIssue::error(
            IssueKind::MissingInformation,
            "Missing UTBMS activity code".to_string(),
        ));
    } else if !rules.activity_code.is_match(activity_code) {
        issues.push(ComplianceIssue::warning(
            IssueKind::InvalidCode,
            format!("Invalid UTBMS activity code '{activity_code}'"),
        ));
    }

    // Amount
    if hours_valid && entry.rate.is_finite() {
        let expected = round_cents(entry.hours * entry.rate);
        if (expected - entry.amount).abs() > constants::AMOUNT_TOLERANCE {
            issues.push(ComplianceIssue::warning(
                IssueKind::AmountMismatch,
                format!(
                    "Amount {:.2} does not match hours x rate ({expected:.2})",
                    entry.amount
                ),
            ));
        }
    }

    let status = issues
        .iter()
        .map(|i| i.severity.status())
        .max()
        .unwrap_or(ComplianceStatus::Compliant);

    tracing::debug!(
        entry_id = %entry.id,
        status = %status,
        issues = issues.len(),
        narrative = %narrative_preview(narrative),
        "Entry checked"
    );

    EntryCheck {
        entry_id: entry.id.clone(),
        status,
        issues,
    }
}

/// Aggregate result of checking a batch of entries.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceReport {
    pub total_entries: usize,
    pub compliant_count: usize,
    pub warning_count: usize,
    pub error_count: usize,

    /// One check per input entry, in input order.
    pub checks: Vec<EntryCheck>,

    /// Number of entries with at least one issue of each kind.
    pub entries_by_kind: BTreeMap<IssueKind, usize>,
}

impl ComplianceReport {
    /// Checks for entries that have at least one issue.
    pub fn entries_with_issues(&self) -> impl Iterator<Item = &EntryCheck> {
        self.checks.iter().filter(|c| !c.issues.is_empty())
    }

    /// Convert to the `/compliance/check` response shape.
    pub fn to_response(&self) -> ComplianceCheckResponse {
        ComplianceCheckResponse {
            total_entries: self.total_entries,
            compliant_count: self.compliant_count,
            warning_count: self.warning_count,
            error_count: self.error_count,
            issues: self
                .entries_with_issues()
                .map(|c| ResponseIssue {
                    entry_id: c.entry_id.clone(),
                    severity: match c.status {
                        ComplianceStatus::Error => IssueSeverity::Error,
                        _ => IssueSeverity::Warning,
                    },
                    issues: c.messages(),
                })
                .collect(),
        }
    }
}

/// Wire shape of a compliance check result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceCheckResponse {
    pub total_entries: usize,
    pub compliant_count: usize,
    pub warning_count: usize,
    pub error_count: usize,
    pub issues: Vec<ResponseIssue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseIssue {
    pub entry_id: String,
    pub severity: IssueSeverity,
    pub issues: Vec<String>,
}

/// Check every entry and summarise.
pub fn check_entries(entries: &[BillingEntry], rules: &ComplianceRules) -> ComplianceReport {
    let mut report = ComplianceReport {
        total_entries: entries.len(),
        ..Default::default()
    };

    for entry in entries {
        let check = check_entry(entry, rules);
        match check.status {
            ComplianceStatus::Compliant => report.compliant_count += 1,
            ComplianceStatus::Warning => report.warning_count += 1,
            ComplianceStatus::Error => report.error_count += 1,
        }

        let mut kinds: Vec<IssueKind> = check.issues.iter().map(|i| i.kind).collect();
        kinds.sort();
        kinds.dedup();
        for kind in kinds {
            *report.entries_by_kind.entry(kind).or_insert(0) += 1;
        }

        report.checks.push(check);
    }

    tracing::info!(
        total = report.total_entries,
        compliant = report.compliant_count,
        warnings = report.warning_count,
        errors = report.error_count,
        "Compliance check complete"
    );

    report
}

/// Store a check's verdict on its entry.
pub fn apply_check(entry: &mut BillingEntry, check: &EntryCheck) {
    entry.compliance_status = check.status;
    entry.compliance_issues = check.messages();
}

/// Check every entry and write each verdict back onto it.
pub fn check_and_apply(entries: &mut [BillingEntry], rules: &ComplianceRules) -> ComplianceReport {
    let report = check_entries(entries, rules);
    for (entry, check) in entries.iter_mut().zip(&report.checks) {
        apply_check(entry, check);
    }
    report
}

// =============================================================================
// Auto-fix
// =============================================================================

/// Outcome of an auto-fix pass.
#[derive(Debug, Clone)]
pub struct AutoFixOutcome {
    /// IDs of entries whose narrative or hours changed.
    pub changed_ids: Vec<String>,

    /// Compliance report after fixing (already applied to the entries).
    pub report: ComplianceReport,
}

/// Fix every auto-correctable issue, then re-check all entries.
///
/// - Vague narratives: the first whole-word occurrence of each configured fix
///   term is replaced (case-insensitive). Occurrences already inside
///   replacement text are left alone, so a second pass changes nothing.
/// - Block time: hours are clamped to the limit and the amount recomputed.
///
/// Issues with no automatic remedy remain on the entry after the re-check.
pub fn auto_fix(entries: &mut [BillingEntry], rules: &ComplianceRules) -> AutoFixOutcome {
    let mut changed_ids = Vec::new();

    for entry in entries.iter_mut() {
        let check = check_entry(entry, rules);
        if check.issues.is_empty() {
            continue;
        }

        let mut changed = false;

        if check.has_kind(IssueKind::VagueNarrative) {
            for fix in &rules.fixes {
                let rewritten_spans = rules.rewritten_spans(&entry.narrative);
                let target = fix
                    .pattern
                    .find_iter(&entry.narrative)
                    .map(|m| m.range())
                    .find(|r| !within(&rewritten_spans, r.clone()));
                if let Some(range) = target {
                    let mut rewritten = String::with_capacity(
                        entry.narrative.len() + fix.replacement.len(),
                    );
                    rewritten.push_str(&entry.narrative[..range.start]);
                    rewritten.push_str(&fix.replacement);
                    rewritten.push_str(&entry.narrative[range.end..]);
                    tracing::debug!(
                        entry_id = %entry.id,
                        term = %fix.term,
                        "Rewrote vague narrative term"
                    );
                    entry.narrative = rewritten;
                    changed = true;
                }
            }
        }

        if check.has_kind(IssueKind::BlockTime) {
            tracing::debug!(
                entry_id = %entry.id,
                from = entry.hours,
                to = rules.max_block_hours,
                "Clamped block time"
            );
            entry.hours = rules.max_block_hours;
            entry.amount = round_cents(entry.hours * entry.rate);
            changed = true;
        }

        if changed {
            changed_ids.push(entry.id.clone());
        }
    }

    tracing::info!(changed = changed_ids.len(), "Auto-fix pass complete");

    let report = check_and_apply(entries, rules);
    AutoFixOutcome {
        changed_ids,
        report,
    }
}

/// Round a currency value to whole cents.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
