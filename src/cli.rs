//! Command-line interface for docsort.
//!
//! This module handles all CLI-related functionality including:
//! - Command parsing and validation
//! - The organize pipeline (scan, match, classify, move, log)
//! - Undo operation handling

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{CompanyEntry, OrganizerConfig};
use crate::decision::DecisionRecord;
use crate::matcher::CompanyMatcher;
use crate::organizer::{FileOrganizer, Operation, OperationLog, scan_files};
use crate::output::{OutputFormatter, SummaryRow};
use crate::undo::UndoManager;

/// Default name of the operation log inside the output root.
const DEFAULT_LOG_NAME: &str = ".docsort_log.csv";

/// Sort files into Company/Category/Year directories by fuzzy-matching
/// company names in paths.
#[derive(Debug, Parser)]
#[command(name = "docsort", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan a directory and move files into the organized structure.
    Organize {
        /// Directory to scan.
        root: PathBuf,

        /// Output root for the organized tree (defaults to the scan root).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration file (defaults to ./.docsort.toml, then
        /// ~/.config/docsort/config.toml).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Add an ad-hoc company profile for this run.
        #[arg(long)]
        company: Option<String>,

        /// Aliases for the ad-hoc company (repeatable).
        #[arg(long, requires = "company")]
        aliases: Vec<String>,

        /// Override the default match threshold (0-100).
        #[arg(short, long)]
        threshold: Option<u8>,

        /// Only organize files with a filing date on or after this date
        /// (YYYY-MM-DD).
        #[arg(long)]
        since: Option<NaiveDate>,

        /// Only organize files with a filing date on or before this date
        /// (YYYY-MM-DD).
        #[arg(long)]
        until: Option<NaiveDate>,

        /// Only scan these extensions (repeatable).
        #[arg(long)]
        include_extensions: Vec<String>,

        /// Skip these extensions (repeatable).
        #[arg(long)]
        exclude_extensions: Vec<String>,

        /// Skip these directory names (repeatable).
        #[arg(long)]
        exclude_folders: Vec<String>,

        /// Skip files larger than this many megabytes.
        #[arg(long)]
        max_size_mb: Option<f64>,

        /// Operation log path (defaults to <output>/.docsort_log.csv).
        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Show what would happen without moving anything.
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Revert the moves recorded in an operation log.
    Undo {
        /// The operation log written by a previous organize run.
        log_file: PathBuf,

        /// Show what would be restored without moving anything.
        #[arg(short = 'n', long)]
        dry_run: bool,
    },
}

/// Runs the parsed command to completion.
///
/// Errors are returned as display strings; the binary maps them to a
/// nonzero exit code.
pub fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Organize {
            root,
            output,
            config,
            company,
            aliases,
            threshold,
            since,
            until,
            include_extensions,
            exclude_extensions,
            exclude_folders,
            max_size_mb,
            log_file,
            dry_run,
        } => {
            let options = OrganizeOptions {
                root,
                output,
                config,
                company,
                aliases,
                threshold,
                since,
                until,
                include_extensions,
                exclude_extensions,
                exclude_folders,
                max_size_mb,
                log_file,
                dry_run,
            };
            organize(options)
        }
        Command::Undo { log_file, dry_run } => undo(&log_file, dry_run),
    }
}

/// Resolved options for one organize run.
struct OrganizeOptions {
    root: PathBuf,
    output: Option<PathBuf>,
    config: Option<PathBuf>,
    company: Option<String>,
    aliases: Vec<String>,
    threshold: Option<u8>,
    since: Option<NaiveDate>,
    until: Option<NaiveDate>,
    include_extensions: Vec<String>,
    exclude_extensions: Vec<String>,
    exclude_folders: Vec<String>,
    max_size_mb: Option<f64>,
    log_file: Option<PathBuf>,
    dry_run: bool,
}

/// The organize pipeline:
/// 1. Load the configuration and fold in command-line overrides
/// 2. Scan the source tree applying the compiled filters
/// 3. Match each file against the company profiles
/// 4. Classify it into a category and year bucket
/// 5. Move it (or report the plan in dry-run mode)
/// 6. Append the moves to the CSV operation log
fn organize(options: OrganizeOptions) -> Result<(), String> {
    let mut config = OrganizerConfig::load(options.config.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?;

    // Command-line overrides layer on top of the file.
    if let Some(name) = &options.company {
        config.companies.push(CompanyEntry {
            name: name.clone(),
            aliases: options.aliases.clone(),
            ..Default::default()
        });
    }
    if let Some(threshold) = options.threshold {
        if threshold > 100 {
            return Err(format!("Threshold {} is outside 0..=100", threshold));
        }
        config.settings.default_threshold = threshold;
    }
    config
        .scan
        .include_extensions
        .extend(options.include_extensions.iter().cloned());
    config
        .scan
        .exclude_extensions
        .extend(options.exclude_extensions.iter().cloned());
    config
        .scan
        .exclude_folders
        .extend(options.exclude_folders.iter().cloned());
    if options.max_size_mb.is_some() {
        config.scan.max_size_mb = options.max_size_mb;
    }

    let compiled = config
        .compile()
        .map_err(|e| format!("Error compiling configuration: {}", e))?;

    if compiled.store.is_empty() {
        OutputFormatter::warning(
            "No company profiles configured; every file will land in Unrecognized.",
        );
    }

    let output_root = options
        .output
        .clone()
        .unwrap_or_else(|| options.root.clone());
    let log_path = options
        .log_file
        .clone()
        .unwrap_or_else(|| output_root.join(DEFAULT_LOG_NAME));

    OutputFormatter::info(&format!("Organizing contents of: {}", options.root.display()));
    if options.dry_run {
        OutputFormatter::dry_run_notice("No files will be moved.");
    }

    // The output tree must not be re-scanned when it lives strictly inside
    // the root. When it IS the root (the in-place default) the organized
    // files are instead recognized per file below, by destination equality.
    let skip = (output_root != options.root && output_root.starts_with(&options.root))
        .then_some(output_root.as_path());
    let files = scan_files(&options.root, &compiled.scan, skip)
        .map_err(|e| format!("Error scanning {}: {}", options.root.display(), e))?;

    if files.is_empty() {
        OutputFormatter::plain("No files found to organize.");
        return Ok(());
    }

    let matcher = CompanyMatcher::new(&compiled.store);
    let organizer = FileOrganizer::new(output_root.clone(), options.dry_run);

    let progress = OutputFormatter::create_progress_bar(files.len() as u64);
    let mut operations: Vec<Operation> = Vec::new();
    let mut company_stats: HashMap<String, (usize, u64)> = HashMap::new();
    let mut skipped_by_date = 0usize;
    let mut already_in_place = 0usize;
    let mut failures: Vec<(PathBuf, String)> = Vec::new();

    for file in &files {
        progress.inc(1);

        let decision = matcher.match_path(file);
        let filename = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = file.extension().map(|e| e.to_string_lossy().to_string());
        let classification =
            compiled
                .classifier
                .classify(&filename, extension.as_deref(), modified_date(file));

        let record = DecisionRecord::assemble(file, &decision, &classification);

        // A file already sitting at its destination is left alone, so
        // re-running over an organized tree never renames anything.
        if record.source_path == output_root.join(&record.destination) {
            already_in_place += 1;
            continue;
        }

        if !within_date_range(record.date, options.since, options.until) {
            skipped_by_date += 1;
            continue;
        }

        match organizer.apply(&record) {
            Ok(operation) => {
                let entry = company_stats.entry(record.company.clone()).or_insert((0, 0));
                entry.0 += 1;
                entry.1 += u64::from(record.confidence);
                operations.push(operation);
            }
            Err(e) => failures.push((file.clone(), e.to_string())),
        }
    }
    progress.finish_and_clear();

    if !options.dry_run && !operations.is_empty() {
        let log = OperationLog::new(log_path.clone());
        match log.append(&operations) {
            Ok(()) => OutputFormatter::success(&format!(
                "Moved {} files. Undo with 'docsort undo {}'.",
                operations.len(),
                log_path.display()
            )),
            Err(e) => {
                OutputFormatter::error(&format!("Could not write operation log: {}", e));
                OutputFormatter::warning("Undo will not be available for this run.");
            }
        }
    }

    let rows: Vec<SummaryRow> = company_stats
        .into_iter()
        .map(|(company, (files, score_sum))| SummaryRow {
            company,
            files,
            mean_confidence: (score_sum / files as u64) as u8,
        })
        .collect();
    OutputFormatter::summary_table(&rows, operations.len());
    if skipped_by_date > 0 {
        OutputFormatter::plain(&format!(
            "{} files skipped by the date filter.",
            skipped_by_date
        ));
    }
    if already_in_place > 0 {
        OutputFormatter::plain(&format!(
            "{} files were already organized.",
            already_in_place
        ));
    }
    if options.dry_run {
        OutputFormatter::dry_run_notice("Dry run complete. No files were modified.");
    }

    if !failures.is_empty() {
        for (path, reason) in &failures {
            OutputFormatter::error(&format!("{}: {}", path.display(), reason));
        }
        return Err(format!("{} files could not be organized.", failures.len()));
    }

    Ok(())
}

fn undo(log_file: &Path, dry_run: bool) -> Result<(), String> {
    OutputFormatter::info("Undoing previous organization...");
    if dry_run {
        OutputFormatter::dry_run_notice("No files will be moved.");
    }

    let report = UndoManager::undo(log_file, dry_run).map_err(|e| format!("Error: {}", e))?;

    OutputFormatter::success(&format!("Restored: {}", report.restored_files));

    if !report.skipped_files.is_empty() {
        OutputFormatter::warning(&format!("Skipped: {}", report.skipped_files.len()));
        for (path, reason) in &report.skipped_files {
            OutputFormatter::plain(&format!("  - {}: {}", path.display(), reason));
        }
    }

    if !report.failed_restores.is_empty() {
        OutputFormatter::error(&format!("Failed: {}", report.failed_restores.len()));
        for (path, reason) in &report.failed_restores {
            OutputFormatter::error(&format!("  - {}: {}", path.display(), reason));
        }
        OutputFormatter::warning("The operation log was kept so the undo can be retried.");
        return Err("Some files could not be restored.".to_string());
    }

    Ok(())
}

/// Filesystem modified date of a file, when readable.
fn modified_date(path: &Path) -> Option<NaiveDate> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .map(|t| DateTime::<Utc>::from(t).date_naive())
}

fn within_date_range(date: NaiveDate, since: Option<NaiveDate>, until: Option<NaiveDate>) -> bool {
    if let Some(since) = since
        && date < since
    {
        return false;
    }
    if let Some(until) = until
        && date > until
    {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_organize_with_overrides() {
        let cli = Cli::try_parse_from([
            "docsort",
            "organize",
            "/docs",
            "--output",
            "/sorted",
            "--company",
            "Acme",
            "--aliases",
            "acme",
            "--threshold",
            "85",
            "--since",
            "2023-01-01",
            "-n",
        ])
        .expect("args should parse");

        match cli.command {
            Command::Organize {
                root,
                output,
                company,
                aliases,
                threshold,
                since,
                dry_run,
                ..
            } => {
                assert_eq!(root, PathBuf::from("/docs"));
                assert_eq!(output, Some(PathBuf::from("/sorted")));
                assert_eq!(company.as_deref(), Some("Acme"));
                assert_eq!(aliases, vec!["acme".to_string()]);
                assert_eq!(threshold, Some(85));
                assert_eq!(since, NaiveDate::from_ymd_opt(2023, 1, 1));
                assert!(dry_run);
            }
            _ => panic!("expected organize command"),
        }
    }

    #[test]
    fn test_cli_aliases_require_company() {
        let result = Cli::try_parse_from(["docsort", "organize", "/docs", "--aliases", "acme"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parses_undo() {
        let cli = Cli::try_parse_from(["docsort", "undo", "/sorted/.docsort_log.csv"])
            .expect("args should parse");
        match cli.command {
            Command::Undo { log_file, dry_run } => {
                assert_eq!(log_file, PathBuf::from("/sorted/.docsort_log.csv"));
                assert!(!dry_run);
            }
            _ => panic!("expected undo command"),
        }
    }

    #[test]
    fn test_date_range_filter() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        assert!(within_date_range(d(2024, 3, 1), None, None));
        assert!(within_date_range(d(2024, 3, 1), Some(d(2024, 1, 1)), None));
        assert!(!within_date_range(d(2023, 12, 31), Some(d(2024, 1, 1)), None));
        assert!(!within_date_range(d(2024, 3, 1), None, Some(d(2024, 2, 1))));
        assert!(within_date_range(
            d(2024, 2, 1),
            Some(d(2024, 2, 1)),
            Some(d(2024, 2, 1))
        ));
    }
}
