// BillExact - core/export.rs
//
// LEDES 1998B and CSV export of billing entries.
// Core layer: writes to any Write trait object.

use crate::core::model::{BillingEntry, Client, ExportFormat, ExportHistory, Matter};
use crate::util::constants;
use crate::util::error::ExportError;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeSet, HashMap};
use std::io::Write;
use std::path::Path;

/// The fixed LEDES 1998B column header, in order.
pub const LEDES_COLUMNS: [&str; 18] = [
    "INVOICE_DATE",
    "INVOICE_NUMBER",
    "CLIENT_ID",
    "LAW_FIRM_MATTER_ID",
    "LINE_ITEM_NUMBER",
    "EXP/FEE/INV_ADJ_TYPE",
    "LINE_ITEM_NUMBER_OF_UNITS",
    "LINE_ITEM_ADJUSTMENT_AMOUNT",
    "LINE_ITEM_TOTAL",
    "LINE_ITEM_DATE",
    "LINE_ITEM_TASK_CODE",
    "LINE_ITEM_EXPENSE_CODE",
    "LINE_ITEM_ACTIVITY_CODE",
    "TIMEKEEPER_ID",
    "LINE_ITEM_DESCRIPTION",
    "LAW_FIRM_ID",
    "LINE_ITEM_UNIT_COST",
    "CLIENT_MATTER_ID",
];

/// CSV column header, in order.
pub const CSV_COLUMNS: [&str; 9] = [
    "Date",
    "Timekeeper",
    "Matter",
    "Task Code",
    "Activity Code",
    "Hours",
    "Rate",
    "Amount",
    "Narrative",
];

/// Fee line item type.
const LEDES_FEE_TYPE: &str = "F";

const LEDES_DATE_FORMAT: &str = "%Y%m%d";
const CSV_DATE_FORMAT: &str = "%m/%d/%Y";

// =============================================================================
// Matter catalogue
// =============================================================================

/// Firm identifiers resolved for one matter.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MatterRef {
    law_firm_matter_id: String,
    client_id: Option<String>,
}

/// Lookup from entry `matter_id` to the firm's matter and client IDs.
#[derive(Debug, Clone, Default)]
pub struct MatterCatalogue {
    matters: HashMap<String, MatterRef>,
}

impl MatterCatalogue {
    /// Index matters and resolve each one's owning client.
    ///
    /// Matters whose client is unknown keep `client_id = None`; no
    /// cross-entity consistency is enforced.
    pub fn new(matters: &[Matter], clients: &[Client]) -> Self {
        let client_ids: HashMap<&str, &str> = clients
            .iter()
            .map(|c| (c.id.as_str(), c.client_id.as_str()))
            .collect();

        let matters = matters
            .iter()
            .map(|m| {
                (
                    m.id.clone(),
                    MatterRef {
                        law_firm_matter_id: m.matter_id.clone(),
                        client_id: client_ids
                            .get(m.client_id.as_str())
                            .map(|id| (*id).to_string()),
                    },
                )
            })
            .collect();

        Self { matters }
    }

    pub fn law_firm_matter_id(&self, matter_id: &str) -> Option<&str> {
        self.matters
            .get(matter_id)
            .map(|m| m.law_firm_matter_id.as_str())
    }

    pub fn client_id(&self, matter_id: &str) -> Option<&str> {
        self.matters
            .get(matter_id)
            .and_then(|m| m.client_id.as_deref())
    }
}

// =============================================================================
// LEDES options
// =============================================================================

/// Invoice-level identifiers for a LEDES export.
#[derive(Debug, Clone)]
pub struct LedesOptions {
    pub invoice_date: NaiveDate,
    pub invoice_number: String,
    pub law_firm_id: String,

    /// Used when the entry's matter is not in the catalogue.
    pub default_client_id: String,
    pub default_law_firm_matter_id: String,

    pub client_matter_id: String,

    /// Timekeeper name to LEDES timekeeper ID.
    pub timekeeper_ids: HashMap<String, String>,
    pub default_timekeeper_id: String,

    pub catalogue: MatterCatalogue,
}

impl LedesOptions {
    /// Options with the placeholder identifiers and an empty catalogue.
    pub fn new(invoice_date: NaiveDate) -> Self {
        Self {
            invoice_date,
            invoice_number: constants::DEFAULT_INVOICE_NUMBER.to_string(),
            law_firm_id: constants::DEFAULT_LAW_FIRM_ID.to_string(),
            default_client_id: constants::DEFAULT_CLIENT_ID.to_string(),
            default_law_firm_matter_id: constants::DEFAULT_LAW_FIRM_MATTER_ID.to_string(),
            client_matter_id: constants::DEFAULT_CLIENT_MATTER_ID.to_string(),
            timekeeper_ids: HashMap::new(),
            default_timekeeper_id: constants::DEFAULT_TIMEKEEPER_ID.to_string(),
            catalogue: MatterCatalogue::default(),
        }
    }

    fn client_id(&self, entry: &BillingEntry) -> &str {
        self.catalogue
            .client_id(&entry.matter_id)
            .unwrap_or(&self.default_client_id)
    }

    fn law_firm_matter_id(&self, entry: &BillingEntry) -> &str {
        self.catalogue
            .law_firm_matter_id(&entry.matter_id)
            .unwrap_or(&self.default_law_firm_matter_id)
    }

    fn timekeeper_id(&self, entry: &BillingEntry) -> &str {
        self.timekeeper_ids
            .get(entry.timekeeper.trim())
            .map(String::as_str)
            .unwrap_or(&self.default_timekeeper_id)
    }
}

// =============================================================================
// Exporters
// =============================================================================

/// Reject empty or oversized exports before anything is written.
pub fn check_export_size(count: usize) -> Result<(), ExportError> {
    if count == 0 {
        return Err(ExportError::NoEntries);
    }
    if count > constants::MAX_EXPORT_ENTRIES {
        return Err(ExportError::TooManyEntries {
            count,
            max: constants::MAX_EXPORT_ENTRIES,
        });
    }
    Ok(())
}

/// Export entries as a pipe-delimited LEDES 1998B document.
///
/// Writes the header line followed by one line per entry, joined with `\n`
/// and without a trailing newline. Line item numbers are 1-based positions
/// in `entries`.
pub fn export_ledes<W: Write>(
    entries: &[BillingEntry],
    options: &LedesOptions,
    mut writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    check_export_size(entries.len())?;

    let io_err = |e| ExportError::Io {
        path: export_path.to_path_buf(),
        source: e,
    };

    writer
        .write_all(LEDES_COLUMNS.join("|").as_bytes())
        .map_err(io_err)?;

    let invoice_date = options.invoice_date.format(LEDES_DATE_FORMAT).to_string();

    for (idx, entry) in entries.iter().enumerate() {
        let line_number = (idx + 1).to_string();
        let line_date = entry.date.format(LEDES_DATE_FORMAT).to_string();
        let units = fixed2(entry.hours);
        let total = fixed2(entry.amount);
        let unit_cost = fixed2(entry.rate);

        let fields: [&str; 18] = [
            &invoice_date,
            &options.invoice_number,
            options.client_id(entry),
            options.law_firm_matter_id(entry),
            &line_number,
            LEDES_FEE_TYPE,
            &units,
            "",
            &total,
            &line_date,
            &entry.task_code,
            "",
            &entry.activity_code,
            options.timekeeper_id(entry),
            &entry.narrative,
            &options.law_firm_id,
            &unit_cost,
            &options.client_matter_id,
        ];

        let row = fields
            .iter()
            .map(|f| sanitize_ledes_field(f))
            .collect::<Vec<_>>()
            .join("|");

        writer.write_all(b"\n").map_err(io_err)?;
        writer.write_all(row.as_bytes()).map_err(io_err)?;
    }

    writer.flush().map_err(io_err)?;

    tracing::info!(
        entries = entries.len(),
        path = %export_path.display(),
        "LEDES export written"
    );

    Ok(entries.len())
}

/// Format with two decimals, rounding exact ties away from zero.
///
/// `{:.2}` rounds ties to even (0.125 -> "0.12"); invoices expect "0.13".
/// A double is an exact hundredths tie only when it is an odd number of
/// eighths, so only those values are pre-rounded.
pub fn fixed2(value: f64) -> String {
    let eighths = value * 8.0;
    let is_tie = eighths.is_finite() && eighths.fract() == 0.0 && eighths % 2.0 != 0.0;
    if is_tie {
        format!("{:.2}", (value * 100.0).round() / 100.0)
    } else {
        format!("{value:.2}")
    }
}

/// Replace characters that would break the LEDES line or column layout.
///
/// `|` separates columns, `[]` is the LEDES record terminator, and line
/// breaks separate records; each becomes a single space. Surrounding
/// whitespace is trimmed.
pub fn sanitize_ledes_field(value: &str) -> String {
    value
        .trim()
        .chars()
        .map(|c| match c {
            '|' | '[' | ']' | '\r' | '\n' => ' ',
            other => other,
        })
        .collect()
}

/// Export entries as CSV.
///
/// Writes: Date, Timekeeper, Matter, Task Code, Activity Code, Hours, Rate,
/// Amount, Narrative. The Matter column is the firm's matter ID when the
/// catalogue knows the matter, otherwise the entry's own `matter_id`.
pub fn export_csv<W: Write>(
    entries: &[BillingEntry],
    catalogue: &MatterCatalogue,
    writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    check_export_size(entries.len())?;

    let csv_err = |e| ExportError::Csv {
        path: export_path.to_path_buf(),
        source: e,
    };

    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(CSV_COLUMNS).map_err(csv_err)?;

    for entry in entries {
        let matter = catalogue
            .law_firm_matter_id(&entry.matter_id)
            .unwrap_or(&entry.matter_id);

        let record: [&str; 9] = [
            &entry.date.format(CSV_DATE_FORMAT).to_string(),
            &entry.timekeeper,
            matter,
            &entry.task_code,
            &entry.activity_code,
            &fixed2(entry.hours),
            &fixed2(entry.rate),
            &fixed2(entry.amount),
            &entry.narrative,
        ];
        csv_writer.write_record(record).map_err(csv_err)?;
    }

    csv_writer.flush().map_err(|e| ExportError::Io {
        path: export_path.to_path_buf(),
        source: e,
    })?;

    tracing::info!(
        entries = entries.len(),
        path = %export_path.display(),
        "CSV export written"
    );

    Ok(entries.len())
}

/// Default export file name: `{FORMAT}_Export_{yyyy-MM-dd-HHmm}.{ext}`.
pub fn export_filename<Tz: chrono::TimeZone>(format: ExportFormat, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{}_Export_{}.{}",
        format.label(),
        now.format("%Y-%m-%d-%H%M"),
        format.extension()
    )
}

// =============================================================================
// Summary
// =============================================================================

/// Totals for a set of exported entries.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub entry_count: usize,
    pub total_hours: f64,
    pub total_amount: f64,
    /// Distinct matter IDs, sorted.
    pub matter_ids: Vec<String>,
}

impl ExportSummary {
    pub fn from_entries(entries: &[BillingEntry]) -> Self {
        let matter_ids: BTreeSet<&str> = entries.iter().map(|e| e.matter_id.as_str()).collect();
        Self {
            entry_count: entries.len(),
            total_hours: entries.iter().map(|e| e.hours).sum(),
            total_amount: entries.iter().map(|e| e.amount).sum(),
            matter_ids: matter_ids.into_iter().map(str::to_string).collect(),
        }
    }

    /// Build the history record for this export.
    pub fn to_history(
        &self,
        id: String,
        format: ExportFormat,
        filename: String,
        export_date: DateTime<Utc>,
    ) -> ExportHistory {
        ExportHistory {
            id,
            export_date,
            matter_ids: self.matter_ids.clone(),
            total_hours: self.total_hours,
            total_amount: self.total_amount,
            filename,
            format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{ComplianceStatus, EntryStatus};
    use chrono::TimeZone;
    use std::path::PathBuf;

    fn make_entry(id: &str, matter: &str, narrative: &str) -> BillingEntry {
        BillingEntry {
            id: id.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            timekeeper: "John Smith".to_string(),
            matter_id: matter.to_string(),
            task_code: "L110".to_string(),
            activity_code: "A101".to_string(),
            hours: 2.5,
            rate: 350.0,
            amount: 875.0,
            narrative: narrative.to_string(),
            status: EntryStatus::Ready,
            compliance_status: ComplianceStatus::Compliant,
            compliance_issues: Vec::new(),
        }
    }

    fn invoice_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()
    }

    #[test]
    fn test_ledes_header_and_row_layout() {
        let entries = vec![make_entry("1", "1", "Reviewed patent application.")];
        let mut buf = Vec::new();
        let count = export_ledes(
            &entries,
            &LedesOptions::new(invoice_date()),
            &mut buf,
            &PathBuf::from("out.txt"),
        )
        .unwrap();
        assert_eq!(count, 1);

        let output = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = output.split('\n').collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].split('|').count(), 18);
        assert!(lines[0].starts_with("INVOICE_DATE|INVOICE_NUMBER|CLIENT_ID"));
        assert_eq!(
            lines[1],
            "20240401|INV001|CLIENT001|MATTER001|1|F|2.50||875.00|20240315|L110||A101|TK001|\
             Reviewed patent application.|FIRM001|350.00|CLIENTMATTER001"
        );
        assert!(!output.ends_with('\n'));
    }

    #[test]
    fn test_fixed2_rounds_ties_up() {
        assert_eq!(fixed2(0.125), "0.13");
        assert_eq!(fixed2(0.625), "0.63");
        assert_eq!(fixed2(2.375), "2.38");
        assert_eq!(fixed2(-0.125), "-0.13");
        assert_eq!(fixed2(0.3), "0.30");
        assert_eq!(fixed2(112.5), "112.50");
        // 1.005 is stored just below the tie.
        assert_eq!(fixed2(1.005), "1.00");
    }

    #[test]
    fn test_ledes_and_csv_units_round_ties_up() {
        let mut entry = make_entry("1", "1", "Reviewed settlement correspondence.");
        entry.hours = 0.125;
        entry.rate = 300.0;
        entry.amount = 37.5;
        let entries = vec![entry];

        let mut buf = Vec::new();
        export_ledes(
            &entries,
            &LedesOptions::new(invoice_date()),
            &mut buf,
            &PathBuf::from("out.txt"),
        )
        .unwrap();
        let output = String::from_utf8(buf).unwrap();
        let row: Vec<&str> = output.split('\n').nth(1).unwrap().split('|').collect();
        assert_eq!(row[6], "0.13");
        assert_eq!(row[8], "37.50");

        let mut buf = Vec::new();
        let catalogue = MatterCatalogue::new(&[], &[]);
        export_csv(&entries, &catalogue, &mut buf, &PathBuf::from("out.csv")).unwrap();
        let output = String::from_utf8(buf).unwrap();
        assert!(output.contains(",0.13,300.00,37.50,"));
    }

    #[test]
    fn test_ledes_line_numbers_and_catalogue_lookup() {
        let matters: Vec<Matter> = serde_json::from_str(
            r#"[{"id": "1", "matterId": "2024-TC-001", "matterName": "Patent Defense", "clientId": "1"}]"#,
        )
        .unwrap();
        let clients: Vec<Client> = serde_json::from_str(
            r#"[{"id": "1", "name": "TechCorp Industries", "clientId": "TC-2024-001"}]"#,
        )
        .unwrap();

        let mut options = LedesOptions::new(invoice_date());
        options.catalogue = MatterCatalogue::new(&matters, &clients);
        options
            .timekeeper_ids
            .insert("John Smith".to_string(), "JS01".to_string());

        let entries = vec![
            make_entry("1", "1", "First."),
            make_entry("2", "99", "Second."),
        ];
        let mut buf = Vec::new();
        export_ledes(&entries, &options, &mut buf, &PathBuf::from("out.txt")).unwrap();
        let output = String::from_utf8(buf).unwrap();
        let rows: Vec<Vec<&str>> = output
            .lines()
            .skip(1)
            .map(|l| l.split('|').collect())
            .collect();

        assert_eq!(rows[0][2], "TC-2024-001");
        assert_eq!(rows[0][3], "2024-TC-001");
        assert_eq!(rows[0][4], "1");
        assert_eq!(rows[0][13], "JS01");
        // Unknown matter falls back to defaults.
        assert_eq!(rows[1][2], "CLIENT001");
        assert_eq!(rows[1][3], "MATTER001");
        assert_eq!(rows[1][4], "2");
    }

    #[test]
    fn test_ledes_description_cannot_break_layout() {
        let entries = vec![make_entry("1", "1", "Call re: A|B [draft]\nsecond line")];
        let mut buf = Vec::new();
        export_ledes(
            &entries,
            &LedesOptions::new(invoice_date()),
            &mut buf,
            &PathBuf::from("out.txt"),
        )
        .unwrap();
        let output = String::from_utf8(buf).unwrap();
        assert_eq!(output.lines().count(), 2);
        let row: Vec<&str> = output.lines().nth(1).unwrap().split('|').collect();
        assert_eq!(row.len(), 18);
        assert_eq!(row[14], "Call re: A B  draft  second line");
    }

    #[test]
    fn test_csv_export_quotes_narrative() {
        let entries = vec![make_entry("1", "1", "Drafted \"Schedule A\", revised terms")];
        let mut buf = Vec::new();
        let count = export_csv(
            &entries,
            &MatterCatalogue::default(),
            &mut buf,
            &PathBuf::from("out.csv"),
        )
        .unwrap();
        assert_eq!(count, 1);

        let output = String::from_utf8(buf).unwrap();
        let mut lines = output.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Date,Timekeeper,Matter,Task Code,Activity Code,Hours,Rate,Amount,Narrative"
        );
        assert_eq!(
            lines.next().unwrap(),
            "03/15/2024,John Smith,1,L110,A101,2.50,350.00,875.00,\"Drafted \"\"Schedule A\"\", revised terms\""
        );
    }

    #[test]
    fn test_empty_export_rejected() {
        let mut buf = Vec::new();
        let result = export_csv(
            &[],
            &MatterCatalogue::default(),
            &mut buf,
            &PathBuf::from("out.csv"),
        );
        assert!(matches!(result, Err(ExportError::NoEntries)));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_oversized_export_rejected() {
        let result = check_export_size(constants::MAX_EXPORT_ENTRIES + 1);
        assert!(matches!(result, Err(ExportError::TooManyEntries { .. })));
    }

    #[test]
    fn test_export_filename() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 9, 5, 0).unwrap();
        assert_eq!(
            export_filename(ExportFormat::Ledes, &now),
            "LEDES_Export_2024-03-10-0905.txt"
        );
        assert_eq!(
            export_filename(ExportFormat::Csv, &now),
            "CSV_Export_2024-03-10-0905.csv"
        );
    }

    #[test]
    fn test_summary_totals_and_distinct_matters() {
        let mut second = make_entry("2", "1", "x");
        second.hours = 1.5;
        second.amount = 525.0;
        let entries = vec![
            make_entry("1", "3", "x"),
            second,
            make_entry("3", "1", "x"),
        ];
        let summary = ExportSummary::from_entries(&entries);
        assert_eq!(summary.entry_count, 3);
        assert_eq!(summary.total_hours, 6.5);
        assert_eq!(summary.total_amount, 2275.0);
        assert_eq!(summary.matter_ids, vec!["1".to_string(), "3".to_string()]);

        let at = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        let record = summary.to_history(
            "42".to_string(),
            ExportFormat::Csv,
            "CSV_Export_2024-03-10-0000.csv".to_string(),
            at,
        );
        assert_eq!(record.matter_ids.len(), 2);
        assert_eq!(record.format, ExportFormat::Csv);
    }
}
