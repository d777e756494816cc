// BillExact - tests/e2e_export.rs
//
// End-to-end tests for the check, fix, and export pipeline.
//
// These tests load the real fixture book from disk, run the real compliance
// rules, and write real export files into temp directories. No mocks.

use billexact::app::{history, options, store};
use billexact::core::compliance::{self, IssueKind};
use billexact::core::export::{self, ExportSummary, MatterCatalogue};
use billexact::core::filter::{self, EntryFilter};
use billexact::core::model::{ComplianceStatus, EntryStatus, ExportFormat};
use billexact::core::timesheet;
use billexact::platform::config::AppConfig;
use chrono::{NaiveDate, TimeZone, Utc};
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

// =============================================================================
// Helpers
// =============================================================================

/// Absolute path to an on-disk fixture file.
fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load_fixture_book() -> store::BillingBook {
    store::load_book(&fixture("billing_book.json")).expect("fixture book should load")
}

fn invoice_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()
}

/// A config file that keeps CLI runs away from the user's real data dir.
fn write_test_config(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[export]\nrecord_history = false\n").unwrap();
    path
}

// =============================================================================
// Compliance E2E
// =============================================================================

#[test]
fn e2e_fixture_compliance_counts() {
    let mut book = load_fixture_book();
    let rules = options::compliance_rules(&AppConfig::default()).unwrap();
    let report = compliance::check_and_apply(&mut book.entries, &rules);

    assert_eq!(report.total_entries, 7);
    assert_eq!(report.compliant_count, 3);
    assert_eq!(report.warning_count, 3);
    assert_eq!(report.error_count, 1);

    assert_eq!(report.entries_by_kind.get(&IssueKind::BlockTime), Some(&1));
    assert_eq!(report.entries_by_kind.get(&IssueKind::VagueNarrative), Some(&4));
    assert_eq!(report.entries_by_kind.get(&IssueKind::MissingInformation), Some(&3));

    let entry4 = book.entry("4").unwrap();
    assert_eq!(entry4.compliance_status, ComplianceStatus::Error);
    assert!(entry4
        .compliance_issues
        .contains(&"Exceeds max block time (0.3h for carrier)".to_string()));

    // "Reviewed" does not trip the "review" rule.
    assert_eq!(book.entry("1").unwrap().compliance_status, ComplianceStatus::Compliant);
    assert_eq!(book.entry("5").unwrap().compliance_status, ComplianceStatus::Warning);
}

#[test]
fn e2e_response_shape_lists_only_entries_with_issues() {
    let book = load_fixture_book();
    let rules = options::compliance_rules(&AppConfig::default()).unwrap();
    let response = compliance::check_entries(&book.entries, &rules).to_response();

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["totalEntries"], 7);
    assert_eq!(json["errorCount"], 1);

    let ids: Vec<&str> = response.issues.iter().map(|i| i.entry_id.as_str()).collect();
    assert_eq!(ids, vec!["2", "4", "5", "6"]);
    assert_eq!(json["issues"][1]["entryId"], "4");
    assert_eq!(json["issues"][1]["severity"], "error");
}

#[test]
fn e2e_auto_fix_saves_and_rechecks() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("book.json");
    store::save_book(&load_fixture_book(), &path).unwrap();

    let mut book = store::load_book(&path).unwrap();
    let rules = options::compliance_rules(&AppConfig::default()).unwrap();
    let outcome = compliance::auto_fix(&mut book.entries, &rules);
    store::save_book(&book, &path).unwrap();

    // 4: block time + "review"; 5: "review"; 6: "research". 2 has no fix term.
    assert_eq!(outcome.changed_ids, vec!["4", "5", "6"]);

    let reloaded = store::load_book(&path).unwrap();
    let entry4 = reloaded.entry("4").unwrap();
    assert_eq!(entry4.hours, 0.3);
    assert_eq!(entry4.amount, 112.5);
    assert_eq!(entry4.narrative, "Reviewed and analyzed specific documents.");
    assert_eq!(entry4.compliance_status, ComplianceStatus::Compliant);

    // "research" inside the replacement text is not vague.
    let entry6 = reloaded.entry("6").unwrap();
    assert_eq!(
        entry6.narrative,
        "Legal Conducted detailed research regarding."
    );
    assert_eq!(entry6.compliance_status, ComplianceStatus::Compliant);
    assert_eq!(outcome.report.error_count, 0);

    // A second run over the saved book changes nothing.
    let mut again = reloaded.clone();
    let second = compliance::auto_fix(&mut again.entries, &rules);
    assert!(second.changed_ids.is_empty());
    assert_eq!(again.entries, reloaded.entries);
}

// =============================================================================
// Export E2E
// =============================================================================

#[test]
fn e2e_ledes_export_of_ready_entries() {
    let dir = TempDir::new().unwrap();
    let book = load_fixture_book();
    let entries = filter::select(&book.entries, &EntryFilter::ready_only());
    assert_eq!(entries.len(), 4);

    let ledes = options::ledes_options(&AppConfig::default(), &book, invoice_date());
    let path = dir.path().join("LEDES_Export.txt");
    let file = std::fs::File::create(&path).unwrap();
    let count = export::export_ledes(&entries, &ledes, file, &path).unwrap();
    assert_eq!(count, 4);

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(!content.ends_with('\n'));

    let lines: Vec<&str> = content.split('\n').collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with("INVOICE_DATE|INVOICE_NUMBER|CLIENT_ID|"));
    assert!(lines.iter().all(|l| l.split('|').count() == 18));

    let first: Vec<&str> = lines[1].split('|').collect();
    assert_eq!(first[0], "20240401");
    assert_eq!(first[2], "TC-2024-001");
    assert_eq!(first[3], "2024-TC-001");
    assert_eq!(first[4], "1");
    assert_eq!(first[5], "F");
    assert_eq!(first[6], "0.30");
    assert_eq!(first[8], "105.00");
    assert_eq!(first[9], "20240315");
    assert_eq!(first[13], "TK001");
    assert_eq!(first[16], "350.00");

    // The pipe inside entry 3's narrative is neutralised.
    assert!(lines[2].contains("usage restrictions   termination clauses"));

    // Matter 5 names an unknown client, so the default client ID is used.
    let last: Vec<&str> = lines[4].split('|').collect();
    assert_eq!(last[2], "CLIENT001");
    assert_eq!(last[3], "2024-RM-001");
}

#[test]
fn e2e_csv_export_round_trips_through_csv_reader() {
    let dir = TempDir::new().unwrap();
    let book = load_fixture_book();
    let filter = EntryFilter::default()
        .with_date_range(Some("2024-03-14"), Some("2024-03-15"))
        .unwrap();
    let entries = filter::select(&book.entries, &filter);
    assert_eq!(entries.len(), 4);

    let path = dir.path().join("CSV_Export.csv");
    let file = std::fs::File::create(&path).unwrap();
    let catalogue = MatterCatalogue::new(&book.matters, &book.clients);
    export::export_csv(&entries, &catalogue, file, &path).unwrap();

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(&headers[0], "Date");
    assert_eq!(&headers[8], "Narrative");

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 4);
    assert_eq!(&rows[0][0], "03/15/2024");
    assert_eq!(&rows[0][2], "2024-TC-001");
    assert_eq!(&rows[3][1], "Robert Taylor");
    assert_eq!(&rows[3][5], "0.80");
    assert_eq!(&rows[3][7], "300.00");
}

#[test]
fn e2e_export_history_records_summary() {
    let dir = TempDir::new().unwrap();
    let book = load_fixture_book();
    let entries = filter::select(&book.entries, &EntryFilter::ready_only());
    let summary = ExportSummary::from_entries(&entries);
    assert_eq!(summary.matter_ids, vec!["1", "2", "3", "5"]);

    let now = Utc.with_ymd_and_hms(2024, 4, 1, 9, 5, 0).unwrap();
    let filename = export::export_filename(ExportFormat::Ledes, &now);
    assert_eq!(filename, "LEDES_Export_2024-04-01-0905.txt");

    let history_path = dir.path().join("export_history.json");
    let record = summary.to_history("1".to_string(), ExportFormat::Ledes, filename, now);
    history::append_history(&history_path, record).unwrap();

    let (records, warning) = history::load_history(&history_path);
    assert!(warning.is_none());
    assert_eq!(records.len(), 1);
    assert!((records[0].total_hours - 1.2).abs() < 1e-9);
    assert!((records[0].total_amount - 393.0).abs() < 1e-9);
}

#[test]
fn e2e_timesheet_views_from_fixture() {
    let book = load_fixture_book();

    let totals = timesheet::TimesheetTotals::from_entries(&book.time_entries);
    assert_eq!(totals.total_hours, 5.5);
    assert_eq!(totals.billable_hours, 5.0);

    let by_category = timesheet::time_by_category(&book.activities, &book.categories);
    let names: Vec<&str> = by_category.iter().map(|c| c.category.as_str()).collect();
    assert_eq!(names, vec!["Work", timesheet::UNCATEGORISED, "Learning"]);
    assert_eq!(by_category[0].minutes, 107.0);
}

#[test]
fn e2e_mark_exported_persists() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("book.json");
    let mut book = load_fixture_book();
    let ready: Vec<String> = filter::select(&book.entries, &EntryFilter::ready_only())
        .into_iter()
        .map(|e| e.id)
        .collect();

    assert_eq!(book.mark_exported(&ready), 4);
    store::save_book(&book, &path).unwrap();

    let reloaded = store::load_book(&path).unwrap();
    let exported = reloaded
        .entries
        .iter()
        .filter(|e| e.status == EntryStatus::Exported)
        .count();
    assert_eq!(exported, 4);
}

// =============================================================================
// CLI E2E
// =============================================================================

#[test]
fn e2e_cli_check_exits_2_on_errors() {
    let dir = TempDir::new().unwrap();
    let config = write_test_config(&dir);

    let output = Command::new(env!("CARGO_BIN_EXE_billexact"))
        .arg("--config")
        .arg(&config)
        .arg("check")
        .arg(fixture("billing_book.json"))
        .arg("--json")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["compliantCount"], 3);
    assert_eq!(json["issues"].as_array().map(Vec::len), Some(4));
}

#[test]
fn e2e_cli_csv_export_writes_file() {
    let dir = TempDir::new().unwrap();
    let config = write_test_config(&dir);
    let out = dir.path().join("out.csv");

    let status = Command::new(env!("CARGO_BIN_EXE_billexact"))
        .arg("--config")
        .arg(&config)
        .arg("export")
        .arg(fixture("billing_book.json"))
        .args(["--format", "csv", "--status", "ready", "--matter", "1,2"])
        .arg("--output")
        .arg(&out)
        .status()
        .unwrap();

    assert!(status.success());
    let content = std::fs::read_to_string(&out).unwrap();
    assert_eq!(content.lines().count(), 3);
    assert!(content.starts_with("Date,Timekeeper,Matter,"));
}

#[test]
fn e2e_cli_ledes_to_stdout_has_no_trailing_newline() {
    let dir = TempDir::new().unwrap();
    let config = write_test_config(&dir);

    let output = Command::new(env!("CARGO_BIN_EXE_billexact"))
        .arg("--config")
        .arg(&config)
        .arg("export")
        .arg(fixture("billing_book.json"))
        .args(["--status", "ready", "--invoice-date", "2024-04-01", "--stdout"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(!stdout.ends_with('\n'));
    assert_eq!(stdout.split('\n').count(), 5);
}

#[test]
fn e2e_cli_compliance_filter_selects_flagged_entries() {
    let dir = TempDir::new().unwrap();
    let config = write_test_config(&dir);

    let output = Command::new(env!("CARGO_BIN_EXE_billexact"))
        .arg("--config")
        .arg(&config)
        .arg("export")
        .arg(fixture("billing_book.json"))
        .args(["--format", "csv", "--compliance", "warning,error", "--stdout"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let narratives: Vec<&str> = stdout
        .lines()
        .skip(1)
        .filter_map(|line| line.rsplit(',').next())
        .collect();
    assert_eq!(
        narratives,
        vec!["Worked on strategy.", "Review documents.", "Legal research."]
    );
}

#[test]
fn e2e_cli_rejects_missing_config_file() {
    let dir = TempDir::new().unwrap();
    let status = Command::new(env!("CARGO_BIN_EXE_billexact"))
        .arg("--config")
        .arg(dir.path().join("absent.toml"))
        .arg("history")
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(1));
}
