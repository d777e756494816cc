// BillExact - main.rs
//
// Command-line entry point. Handles:
// 1. CLI argument parsing
// 2. Config loading and logging initialisation (debug mode support)
// 3. Dispatch to compliance, export, quality, and timesheet commands
//
// Exit codes: 0 success, 1 failure, 2 `check` found entries in error.

use billexact::app::{history, options, store};
use billexact::core::compliance::{self, ComplianceReport};
use billexact::core::export::{self, ExportSummary};
use billexact::core::filter::{self, EntryFilter};
use billexact::core::model::{ComplianceStatus, EntryStatus, ExportFormat};
use billexact::core::{narrative, timesheet};
use billexact::platform::config::{self, AppConfig, PlatformPaths};
use billexact::platform::fs;
use billexact::util::error::{BillExactError, FilterError, Result};
use billexact::util::{constants, logging};
use chrono::{Local, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// BillExact - legal billing compliance checks and LEDES/CSV export.
///
/// Works on a JSON billing book holding entries, matters, clients, and
/// timesheet data.
#[derive(Parser, Debug)]
#[command(name = "billexact", version, about)]
struct Cli {
    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug", global = true)]
    debug: bool,

    /// Use this config file instead of the platform default.
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run compliance checks on every entry in a billing book.
    Check {
        /// Billing book JSON file.
        book: PathBuf,

        /// Print the result as JSON instead of a report.
        #[arg(long)]
        json: bool,

        /// Store each entry's compliance status back into the book.
        #[arg(long)]
        write: bool,
    },

    /// Auto-fix vague narratives and block time, then re-check.
    Fix {
        /// Billing book JSON file.
        book: PathBuf,

        /// Report what would change without saving the book.
        #[arg(long)]
        dry_run: bool,
    },

    /// Export entries as LEDES 1998B or CSV.
    Export {
        /// Billing book JSON file.
        book: PathBuf,

        /// Output format.
        #[arg(short = 'f', long, value_enum, default_value_t = FormatArg::Ledes)]
        format: FormatArg,

        /// Output file (default: {FORMAT}_Export_{date}.{ext} in the current directory).
        #[arg(short = 'o', long, conflicts_with = "stdout")]
        output: Option<PathBuf>,

        /// Write the export to stdout.
        #[arg(long)]
        stdout: bool,

        /// LEDES invoice date (default: today).
        #[arg(long)]
        invoice_date: Option<NaiveDate>,

        /// Set exported entries to status "exported" and save the book.
        #[arg(long)]
        mark_exported: bool,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Score narrative quality.
    Quality {
        /// Billing book JSON file.
        #[arg(required_unless_present = "text")]
        book: Option<PathBuf>,

        /// Score this narrative instead of the book's entries.
        #[arg(long)]
        text: Option<String>,
    },

    /// Billing totals by status and matter.
    Summary {
        /// Billing book JSON file.
        book: PathBuf,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Timesheet totals and activity time by category.
    Timesheet {
        /// Billing book JSON file.
        book: PathBuf,
    },

    /// List previous exports.
    History {
        /// Print the history as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Entry statuses to include (draft, ready, exported).
    #[arg(long, value_delimiter = ',')]
    status: Vec<String>,

    /// Compliance statuses to include (compliant, warning, error).
    #[arg(long, value_delimiter = ',')]
    compliance: Vec<String>,

    /// Matter IDs to include.
    #[arg(long, value_delimiter = ',')]
    matter: Vec<String>,

    /// Timekeeper name (case-insensitive).
    #[arg(long)]
    timekeeper: Option<String>,

    /// First date to include (YYYY-MM-DD).
    #[arg(long)]
    from: Option<String>,

    /// Last date to include (YYYY-MM-DD).
    #[arg(long)]
    to: Option<String>,
}

impl FilterArgs {
    fn to_filter(&self) -> std::result::Result<EntryFilter, FilterError> {
        let mut filter = EntryFilter::default()
            .with_status_labels(self.status.as_slice())?
            .with_compliance_labels(self.compliance.as_slice())?
            .with_date_range(self.from.as_deref(), self.to.as_deref())?;
        filter.matter_ids.extend(self.matter.iter().cloned());
        filter.timekeeper = self.timekeeper.clone().unwrap_or_default();
        Ok(filter)
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Ledes,
    Csv,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Ledes => ExportFormat::Ledes,
            FormatArg::Csv => ExportFormat::Csv,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let paths = PlatformPaths::resolve();

    // Config is read before logging so its level can take part in the filter.
    let (config, config_warnings) = match cli.config {
        Some(ref path) => match config::load_config_strict(path) {
            Ok(loaded) => loaded,
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => config::load_config(&paths.config_file()),
    };

    logging::init(cli.debug, config.log_level.as_deref());

    tracing::info!(
        version = constants::APP_VERSION,
        debug = cli.debug,
        "BillExact starting"
    );

    for warning in &config_warnings {
        tracing::warn!(warning = %warning, "Config warning");
        eprintln!("Warning: {warning}");
    }

    match run(cli.command, &config, &paths) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, config: &AppConfig, paths: &PlatformPaths) -> Result<ExitCode> {
    match command {
        Command::Check { book, json, write } => cmd_check(&book, json, write, config),
        Command::Fix { book, dry_run } => cmd_fix(&book, dry_run, config),
        Command::Export {
            book,
            format,
            output,
            stdout,
            invoice_date,
            mark_exported,
            filter,
        } => cmd_export(
            &book,
            ExportRequest {
                format: format.into(),
                output,
                stdout,
                invoice_date: invoice_date.unwrap_or_else(|| Local::now().date_naive()),
                mark_exported,
                filter: filter.to_filter()?,
            },
            config,
            paths,
        ),
        Command::Quality { book, text } => cmd_quality(book.as_deref(), text.as_deref()),
        Command::Summary { book, filter } => cmd_summary(&book, &filter.to_filter()?),
        Command::Timesheet { book } => cmd_timesheet(&book),
        Command::History { json } => cmd_history(&paths.history_file(), json),
    }
}

// =============================================================================
// check / fix
// =============================================================================

fn cmd_check(book_path: &Path, json: bool, write: bool, config: &AppConfig) -> Result<ExitCode> {
    let mut book = store::load_book(book_path)?;
    let rules = options::compliance_rules(config)?;
    let report = compliance::check_and_apply(&mut book.entries, &rules);

    if json {
        write_json(&report.to_response())?;
    } else {
        print_report(&report);
    }

    if write {
        store::save_book(&book, book_path)?;
    }

    Ok(if report.error_count > 0 {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    })
}

fn cmd_fix(book_path: &Path, dry_run: bool, config: &AppConfig) -> Result<ExitCode> {
    let mut book = store::load_book(book_path)?;
    let rules = options::compliance_rules(config)?;
    let outcome = compliance::auto_fix(&mut book.entries, &rules);

    println!("Auto-fixed {} entr{}", outcome.changed_ids.len(), plural_y(outcome.changed_ids.len()));
    for id in &outcome.changed_ids {
        if let Some(entry) = book.entry(id) {
            println!(
                "  {id}: {:.2}h, {:.2} - {}",
                entry.hours, entry.amount, entry.narrative
            );
        }
    }
    println!();
    print_report(&outcome.report);

    if dry_run {
        println!("\nDry run: book not saved.");
    } else if !outcome.changed_ids.is_empty() {
        store::save_book(&book, book_path)?;
    }
    Ok(ExitCode::SUCCESS)
}

fn print_report(report: &ComplianceReport) {
    println!(
        "{} entries: {} compliant, {} warning, {} error",
        report.total_entries, report.compliant_count, report.warning_count, report.error_count
    );
    for (kind, count) in &report.entries_by_kind {
        println!("  {:<24} {count}", kind.category_label());
    }
    for check in report.entries_with_issues() {
        println!("[{}] entry {}", check.status, check.entry_id);
        for message in check.messages() {
            println!("    - {message}");
        }
    }
}

// =============================================================================
// export
// =============================================================================

struct ExportRequest {
    format: ExportFormat,
    output: Option<PathBuf>,
    stdout: bool,
    invoice_date: NaiveDate,
    mark_exported: bool,
    filter: EntryFilter,
}

fn cmd_export(
    book_path: &Path,
    request: ExportRequest,
    config: &AppConfig,
    paths: &PlatformPaths,
) -> Result<ExitCode> {
    let mut book = store::load_book(book_path)?;
    let entries = filter::select(&book.entries, &request.filter);

    let in_error = entries
        .iter()
        .filter(|e| e.compliance_status == ComplianceStatus::Error)
        .count();
    if in_error > 0 {
        tracing::warn!(entries = in_error, "Exporting entries that failed the last compliance check");
    }

    let now = Local::now();
    let target = if request.stdout {
        PathBuf::from("<stdout>")
    } else {
        request
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(export::export_filename(request.format, &now)))
    };

    let mut buffer: Vec<u8> = Vec::new();
    let count = match request.format {
        ExportFormat::Ledes => {
            let ledes = options::ledes_options(config, &book, request.invoice_date);
            export::export_ledes(&entries, &ledes, &mut buffer, &target)?
        }
        ExportFormat::Csv => {
            let catalogue = export::MatterCatalogue::new(&book.matters, &book.clients);
            export::export_csv(&entries, &catalogue, &mut buffer, &target)?
        }
    };

    if request.stdout {
        let mut out = std::io::stdout().lock();
        out.write_all(&buffer)
            .and_then(|_| out.flush())
            .map_err(|e| BillExactError::Io {
                path: target.clone(),
                operation: "write export",
                source: e,
            })?;
    } else {
        fs::write_atomic(&target, &buffer).map_err(|e| BillExactError::Io {
            path: target.clone(),
            operation: "write export",
            source: e,
        })?;
        eprintln!("Exported {count} entries to {}", target.display());
    }

    let summary = ExportSummary::from_entries(&entries);
    eprintln!(
        "Total: {:.2}h, {:.2} across {} matter(s)",
        summary.total_hours,
        summary.total_amount,
        summary.matter_ids.len()
    );

    if config.record_history && !request.stdout {
        let filename = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| target.display().to_string());
        let exported_at = now.with_timezone(&Utc);
        let record = summary.to_history(
            exported_at.timestamp_millis().to_string(),
            request.format,
            filename,
            exported_at,
        );
        let (_, warning) = history::append_history(&paths.history_file(), record)?;
        if let Some(warning) = warning {
            eprintln!("Warning: {warning}");
        }
    }

    if request.mark_exported {
        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        let updated = book.mark_exported(&ids);
        store::save_book(&book, book_path)?;
        tracing::info!(updated, "Entries marked as exported");
    }

    Ok(ExitCode::SUCCESS)
}

// =============================================================================
// quality / summary / timesheet / history
// =============================================================================

fn cmd_quality(book_path: Option<&Path>, text: Option<&str>) -> Result<ExitCode> {
    if let Some(text) = text {
        print_quality("text", &narrative::analyze(text));
        return Ok(ExitCode::SUCCESS);
    }

    let Some(book_path) = book_path else {
        return Ok(ExitCode::SUCCESS);
    };
    let book = store::load_book(book_path)?;
    for entry in &book.entries {
        let analysis = narrative::analyze(&entry.narrative);
        tracing::debug!(
            entry_id = %entry.id,
            narrative = %logging::narrative_preview(&entry.narrative),
            score = analysis.score,
            "Narrative scored"
        );
        print_quality(&entry.id, &analysis);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_quality(label: &str, analysis: &narrative::QualityAnalysis) {
    let stars = analysis.stars() as usize;
    println!(
        "{label}: {:>3}/100 {}{} {}",
        analysis.score,
        "*".repeat(stars),
        ".".repeat(5usize.saturating_sub(stars)),
        analysis.grade.label()
    );
    for (issue, suggestion) in analysis.issues.iter().zip(&analysis.suggestions) {
        println!("    - {issue}: {suggestion}");
    }
}

fn cmd_summary(book_path: &Path, filter: &EntryFilter) -> Result<ExitCode> {
    let book = store::load_book(book_path)?;
    let entries = filter::select(&book.entries, filter);
    let summary = ExportSummary::from_entries(&entries);

    println!(
        "{} entries, {:.2}h, {:.2}",
        summary.entry_count, summary.total_hours, summary.total_amount
    );
    for status in EntryStatus::all() {
        let count = entries.iter().filter(|e| e.status == *status).count();
        println!("  {:<10} {count}", status.label());
    }

    println!("By matter:");
    for (matter_id, (hours, amount)) in timesheet::billing_by_matter(&entries) {
        let name = book
            .matters
            .iter()
            .find(|m| m.id == matter_id)
            .map(|m| m.matter_name.as_str())
            .unwrap_or("(unknown matter)");
        println!("  {matter_id:<6} {name:<40} {hours:>7.2}h {amount:>10.2}");
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_timesheet(book_path: &Path) -> Result<ExitCode> {
    let book = store::load_book(book_path)?;
    let totals = timesheet::TimesheetTotals::from_entries(&book.time_entries);

    println!(
        "{} entries, {:.2}h total, {:.2}h billable, {:.2}h non-billable ({:.0}% billable)",
        totals.entry_count,
        totals.total_hours,
        totals.billable_hours,
        totals.non_billable_hours,
        totals.billable_ratio() * 100.0
    );

    println!("By day:");
    for day in timesheet::daily_totals(&book.time_entries) {
        println!("  {} {:>6.2}h ({:.2}h billable)", day.date, day.hours, day.billable);
    }

    println!("By project:");
    for project in timesheet::project_totals(&book.time_entries, &book.projects) {
        println!(
            "  {:<32} {:>6.2}h {:>10.2}",
            project.name, project.hours, project.billable_value
        );
    }

    println!("Activity by category:");
    for category in timesheet::time_by_category(&book.activities, &book.categories) {
        println!(
            "  {:<20} {:>6.2}h ({} activit{})",
            category.category,
            category.hours(),
            category.activity_count,
            plural_y(category.activity_count)
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_history(history_path: &Path, json: bool) -> Result<ExitCode> {
    let (records, warning) = history::load_history(history_path);
    if let Some(warning) = warning {
        eprintln!("Warning: {warning}");
    }

    if json {
        write_json(&records)?;
        return Ok(ExitCode::SUCCESS);
    }

    if records.is_empty() {
        println!("No exports recorded.");
    }
    for record in records.iter().rev() {
        println!(
            "{}  {:<5} {:>7.2}h {:>10.2}  {}  matters: {}",
            record.export_date.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            record.format.label(),
            record.total_hours,
            record.total_amount,
            record.filename,
            record.matter_ids.join(", ")
        );
    }
    Ok(ExitCode::SUCCESS)
}

// =============================================================================
// helpers
// =============================================================================

fn write_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)
        .map_err(std::io::Error::from)
        .and_then(|_| out.write_all(b"\n"))
        .map_err(|e| BillExactError::Io {
            path: PathBuf::from("<stdout>"),
            operation: "write JSON",
            source: e,
        })
}

fn plural_y(count: usize) -> &'static str {
    if count == 1 {
        "y"
    } else {
        "ies"
    }
}
