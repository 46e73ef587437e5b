//! Final per-file decision records.
//!
//! A [`DecisionRecord`] combines the matcher's verdict with the classifier's
//! bucket into the one immutable value the mover and the operation log
//! consume. The destination follows the template
//! `Company/Category/Year/<date>_<original filename>`; unrecognized files
//! route into the `Unrecognized` bucket instead of failing.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};

use crate::classifier::{Classification, FileCategory};
use crate::matcher::MatchDecision;

/// Fallback bucket for files no profile claimed.
pub const UNRECOGNIZED_BUCKET: &str = "Unrecognized";

/// Characters that cannot appear in a directory or file name component.
const INVALID_COMPONENT_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Finalized classification and match outcome for one file; created once,
/// never mutated, information-complete for the operation log and for undo.
#[derive(Debug, Clone)]
pub struct DecisionRecord {
    pub source_path: PathBuf,
    /// Company name, or [`UNRECOGNIZED_BUCKET`].
    pub company: String,
    pub category: FileCategory,
    pub year: i32,
    pub date: NaiveDate,
    /// Destination relative to the output root.
    pub destination: PathBuf,
    pub confidence: u8,
    pub timestamp: DateTime<Utc>,
}

impl DecisionRecord {
    /// Assembles the record for one file from the matcher decision and the
    /// classification. Pure aside from reading the clock for the record
    /// timestamp.
    pub fn assemble(
        source_path: &Path,
        decision: &MatchDecision,
        classification: &Classification,
    ) -> Self {
        let filename = source_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "file".to_string());

        let company = sanitize_component(decision.company_label());
        let dated_name = dated_filename(&filename, classification.date);

        let destination = PathBuf::from(&company)
            .join(classification.category.dir_name())
            .join(classification.year.to_string())
            .join(sanitize_component(&dated_name));

        Self {
            source_path: source_path.to_path_buf(),
            company,
            category: classification.category,
            year: classification.year,
            date: classification.date,
            destination,
            confidence: decision.confidence,
            timestamp: Utc::now(),
        }
    }
}

/// Prefixes the filing date unless the name already starts with it.
fn dated_filename(filename: &str, date: NaiveDate) -> String {
    let date_str = date.format("%Y-%m-%d").to_string();
    if filename.starts_with(&date_str) {
        filename.to_string()
    } else {
        format!("{date_str}_{filename}")
    }
}

/// Replaces path-hostile characters and trims dangling dots/spaces so a
/// company name is always usable as a directory component.
fn sanitize_component(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|c| {
            if INVALID_COMPONENT_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();
    let trimmed = cleaned.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}
