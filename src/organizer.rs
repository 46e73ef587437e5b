//! File movement, directory scanning and the CSV operation log.
//!
//! This module executes [`DecisionRecord`]s: it creates the destination
//! tree, moves files with conflict-safe naming, and appends one CSV row per
//! move so every run can be undone later. Scanning walks the source tree
//! applying the compiled filters before any matching happens.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::CompiledScanFilters;
use crate::decision::DecisionRecord;

/// One row of the operation log.
///
/// Paths are stored as strings because the log is a plain CSV file meant to
/// be inspectable and editable by hand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    /// RFC 3339 timestamp of the move.
    pub timestamp: String,
    /// Currently always `"move"`; kept as a column so the log format can
    /// grow other actions without breaking old files.
    pub action: String,
    /// Absolute path the file was moved from.
    pub original_path: String,
    /// Absolute path the file was moved to.
    pub new_path: String,
    /// Company bucket the file landed in.
    pub company: String,
    /// Category directory name.
    pub category: String,
    /// Match confidence, 0 for unrecognized files.
    pub score: u8,
}

/// Append-only CSV log of performed moves, the undo journal.
pub struct OperationLog {
    path: PathBuf,
}

impl OperationLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Appends operations, writing the header row only when creating the
    /// file.
    pub fn append(&self, operations: &[Operation]) -> OrganizeResult<()> {
        if operations.is_empty() {
            return Ok(());
        }

        let write_header = !self.path.exists();
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| OrganizeError::LogWriteFailed { source: e })?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(file);

        for operation in operations {
            writer
                .serialize(operation)
                .map_err(|e| OrganizeError::InvalidLogFormat {
                    reason: e.to_string(),
                })?;
        }
        writer
            .flush()
            .map_err(|e| OrganizeError::LogWriteFailed { source: e })?;

        Ok(())
    }

    /// Loads all logged operations in file order.
    pub fn load(&self) -> OrganizeResult<Vec<Operation>> {
        if !self.path.exists() {
            return Err(OrganizeError::LogNotFound {
                path: self.path.clone(),
            });
        }

        let file =
            fs::File::open(&self.path).map_err(|e| OrganizeError::LogReadFailed { source: e })?;
        let mut reader = csv::Reader::from_reader(file);

        let mut operations = Vec::new();
        for row in reader.deserialize() {
            let operation: Operation = row.map_err(|e| OrganizeError::InvalidLogFormat {
                reason: e.to_string(),
            })?;
            operations.push(operation);
        }
        Ok(operations)
    }

    /// Deletes the log file if present.
    pub fn delete(&self) -> OrganizeResult<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .map_err(|e| OrganizeError::LogWriteFailed { source: e })?;
        }
        Ok(())
    }
}

/// Errors that can occur while scanning, moving or logging files.
#[derive(Debug)]
pub enum OrganizeError {
    /// The scan root is missing or not a directory.
    InvalidRoot {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to create a destination directory.
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to move a file to its destination.
    FileMoveFailure {
        source: PathBuf,
        destination: PathBuf,
        source_error: std::io::Error,
    },
    /// Failed while walking the source tree.
    ScanFailed { reason: String },
    /// The operation log does not exist.
    LogNotFound { path: PathBuf },
    /// Failed to write the operation log.
    LogWriteFailed { source: std::io::Error },
    /// Failed to read the operation log.
    LogReadFailed { source: std::io::Error },
    /// A log row could not be serialized or parsed.
    InvalidLogFormat { reason: String },
}

impl std::fmt::Display for OrganizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRoot { path, source } => {
                write!(f, "Invalid scan root {}: {}", path.display(), source)
            }
            Self::DirectoryCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::FileMoveFailure {
                source,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to move {} to {}: {}",
                    source.display(),
                    destination.display(),
                    source_error
                )
            }
            Self::ScanFailed { reason } => write!(f, "Scan failed: {}", reason),
            Self::LogNotFound { path } => {
                write!(f, "Operation log not found: {}", path.display())
            }
            Self::LogWriteFailed { source } => {
                write!(f, "Failed to write operation log: {}", source)
            }
            Self::LogReadFailed { source } => {
                write!(f, "Failed to read operation log: {}", source)
            }
            Self::InvalidLogFormat { reason } => {
                write!(f, "Invalid operation log format: {}", reason)
            }
        }
    }
}

impl std::error::Error for OrganizeError {}

/// Result type for scan, move and log operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Recursively collects the files eligible for organization.
///
/// Directories failing [`CompiledScanFilters::should_descend`] are pruned
/// whole; files are kept only when [`CompiledScanFilters::should_include`]
/// accepts them. `skip` prunes an additional subtree (the output directory
/// when it lives strictly inside the scan root; passing the root itself
/// would prune everything). Results come back sorted so runs are
/// deterministic.
pub fn scan_files(
    root: &Path,
    filters: &CompiledScanFilters,
    skip: Option<&Path>,
) -> OrganizeResult<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(OrganizeError::InvalidRoot {
            path: root.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "scan root is not a directory",
            ),
        });
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
        if entry.depth() == 0 {
            return true;
        }
        if let Some(skipped) = skip
            && entry.path().starts_with(skipped)
        {
            return false;
        }
        if entry.file_type().is_dir() {
            let name = entry.file_name().to_string_lossy();
            return filters.should_descend(&name);
        }
        true
    });

    for entry in walker {
        let entry = entry.map_err(|e| OrganizeError::ScanFailed {
            reason: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let size = entry.metadata().ok().map(|m| m.len());
        if filters.should_include(entry.path(), size) {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

/// Executes decision records against the filesystem.
///
/// In dry-run mode no directory is created and no file is moved; `apply`
/// still returns the operation that would have been performed so callers
/// can report the plan.
pub struct FileOrganizer {
    output_root: PathBuf,
    dry_run: bool,
}

impl FileOrganizer {
    pub fn new(output_root: PathBuf, dry_run: bool) -> Self {
        Self { output_root, dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Moves one file to its decided destination and returns the log row.
    ///
    /// Destination directories are created as needed. When the destination
    /// name is already taken, a `_1`, `_2`, ... suffix is inserted before
    /// the extension so no existing file is ever overwritten.
    pub fn apply(&self, record: &DecisionRecord) -> OrganizeResult<Operation> {
        let destination = self.output_root.join(&record.destination);

        if self.dry_run {
            return Ok(self.operation_for(record, &destination));
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|e| OrganizeError::DirectoryCreationFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let destination = resolve_conflict(&destination);
        fs::rename(&record.source_path, &destination).map_err(|e| {
            OrganizeError::FileMoveFailure {
                source: record.source_path.clone(),
                destination: destination.clone(),
                source_error: e,
            }
        })?;

        Ok(self.operation_for(record, &destination))
    }

    fn operation_for(&self, record: &DecisionRecord, destination: &Path) -> Operation {
        Operation {
            timestamp: record.timestamp.to_rfc3339(),
            action: "move".to_string(),
            original_path: record.source_path.to_string_lossy().to_string(),
            new_path: destination.to_string_lossy().to_string(),
            company: record.company.clone(),
            category: record.category.dir_name().to_string(),
            score: record.confidence,
        }
    }
}

/// First free variant of `path`: the path itself, then `name_1.ext`,
/// `name_2.ext` and so on.
fn resolve_conflict(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "file".to_string());
    let extension = path.extension().map(|e| e.to_string_lossy().to_string());
    let parent = path.parent().unwrap_or_else(|| Path::new(""));

    for counter in 1u32.. {
        let candidate_name = match &extension {
            Some(ext) => format!("{stem}_{counter}.{ext}"),
            None => format!("{stem}_{counter}"),
        };
        let candidate = parent.join(candidate_name);
        if !candidate.exists() {
            return candidate;
        }
    }
    unreachable!("counter space exhausted");
}
