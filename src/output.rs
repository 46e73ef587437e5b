//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output, including colored
//! output, progress tracking, and formatted tables. This module abstracts
//! away output details, making it easy to change formatting globally.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::decision::UNRECOGNIZED_BUCKET;

/// One line of the end-of-run summary: a company bucket, how many files
/// landed in it and the mean match confidence of those files.
pub struct SummaryRow {
    pub company: String,
    pub files: usize,
    pub mean_confidence: u8,
}

/// Manages all CLI output with consistent styling and formatting.
///
/// This struct provides methods for:
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - Progress bars for file operations
/// - Summary tables with per-company statistics
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates and returns a progress bar for file operations.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use docsort::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(100);
    /// pb.inc(1);
    /// pb.finish_with_message("Completed!");
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        pb
    }

    /// Prints the per-company summary of an organize run.
    ///
    /// Companies appear by descending file count with the Unrecognized
    /// bucket always last, each with the mean match confidence of its
    /// files.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use docsort::output::{OutputFormatter, SummaryRow};
    ///
    /// let rows = vec![
    ///     SummaryRow { company: "ACME Corporation".to_string(), files: 15, mean_confidence: 96 },
    ///     SummaryRow { company: "Unrecognized".to_string(), files: 3, mean_confidence: 41 },
    /// ];
    /// OutputFormatter::summary_table(&rows, 18);
    /// ```
    pub fn summary_table(rows: &[SummaryRow], total_files: usize) {
        Self::header("SUMMARY");

        let ordered = ordered_rows(rows);
        let name_width = ordered
            .iter()
            .map(|row| row.company.len())
            .max()
            .unwrap_or(0)
            .max("Company".len());
        let rule_width = name_width + 22;

        println!(
            "{:<name_width$} | {:>5} | {:>9}",
            "Company".bold(),
            "Files".bold(),
            "Avg score".bold(),
        );
        println!("{}", "-".repeat(rule_width));

        for row in &ordered {
            let name = if row.company == UNRECOGNIZED_BUCKET {
                row.company.yellow()
            } else {
                row.company.normal()
            };
            println!(
                "{:<name_width$} | {:>5} | {:>9}",
                name,
                row.files.to_string().green(),
                row.mean_confidence,
            );
        }

        println!("{}", "-".repeat(rule_width));
        println!(
            "{:<name_width$} | {:>5} |",
            "Total".bold(),
            total_files.to_string().green().bold(),
        );
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }
}

/// Display order for summary rows: most files first, the Unrecognized
/// bucket always last, company names breaking ties.
fn ordered_rows(rows: &[SummaryRow]) -> Vec<&SummaryRow> {
    let mut ordered: Vec<&SummaryRow> = rows.iter().collect();
    ordered.sort_by(|a, b| {
        (a.company == UNRECOGNIZED_BUCKET)
            .cmp(&(b.company == UNRECOGNIZED_BUCKET))
            .then(b.files.cmp(&a.files))
            .then_with(|| a.company.cmp(&b.company))
    });
    ordered
}
