/// Undo functionality for reverting file organization operations.
///
/// This module replays the CSV operation log in reverse, moving files back
/// to their original locations. The log is deleted only when every row was
/// restored, so a partially failed undo can be retried.
use crate::organizer::{Operation, OperationLog, OrganizeResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Represents the result of an undo run.
#[derive(Debug)]
pub struct UndoReport {
    /// Number of files successfully restored.
    pub restored_files: usize,
    /// Files that failed to restore, with the error reason.
    pub failed_restores: Vec<(PathBuf, String)>,
    /// Files that were skipped (no longer at the logged location).
    pub skipped_files: Vec<(PathBuf, String)>,
    /// Whether this was a dry run.
    pub dry_run: bool,
}

impl UndoReport {
    fn new(dry_run: bool) -> Self {
        Self {
            restored_files: 0,
            failed_restores: Vec::new(),
            skipped_files: Vec::new(),
            dry_run,
        }
    }

    /// Returns the total number of operations processed.
    pub fn total_processed(&self) -> usize {
        self.restored_files + self.failed_restores.len() + self.skipped_files.len()
    }

    /// Returns true if every logged operation was restored.
    pub fn is_complete_success(&self) -> bool {
        self.failed_restores.is_empty() && self.skipped_files.is_empty()
    }
}

/// Replays an operation log backwards.
pub struct UndoManager;

impl UndoManager {
    /// Undoes every move recorded in the log at `log_path`.
    ///
    /// Operations are processed in reverse order of the log (undo is LIFO),
    /// so a file moved twice in one session ends up where it started. The
    /// log file is deleted only on complete success; otherwise it is kept
    /// so the remaining rows can be retried.
    ///
    /// # Edge Cases Handled
    ///
    /// * **File not found**: the row is skipped and reported
    /// * **Name conflict**: the file now occupying the original location is
    ///   backed up with a timestamp suffix before the restore
    /// * **Permission denied**: recorded as a failure with the error reason
    /// * **Missing log**: returns an error, nothing to undo
    ///
    /// In dry-run mode nothing is moved and the log is kept; the report
    /// counts the rows that would have been restored.
    pub fn undo(log_path: &Path, dry_run: bool) -> OrganizeResult<UndoReport> {
        let log = OperationLog::new(log_path.to_path_buf());
        let operations = log.load()?;

        let mut report = UndoReport::new(dry_run);
        for operation in operations.iter().rev() {
            if dry_run {
                if Path::new(&operation.new_path).exists() {
                    report.restored_files += 1;
                } else {
                    report.skipped_files.push((
                        PathBuf::from(&operation.new_path),
                        "File not found at expected location".to_string(),
                    ));
                }
                continue;
            }

            match Self::restore_file(operation) {
                Ok(()) => {
                    report.restored_files += 1;
                }
                Err((path, reason)) => {
                    if reason.contains("not found") {
                        report.skipped_files.push((path, reason));
                    } else {
                        report.failed_restores.push((path, reason));
                    }
                }
            }
        }

        // Only delete the log if undo was fully successful.
        if !dry_run
            && report.is_complete_success()
            && let Err(e) = log.delete()
        {
            eprintln!("Warning: Could not delete operation log: {}", e);
        }

        Ok(report)
    }

    /// Restores a single file to its original location.
    ///
    /// Handles conflicts by backing up the existing file with a timestamp.
    fn restore_file(operation: &Operation) -> Result<(), (PathBuf, String)> {
        let new_path = PathBuf::from(&operation.new_path);
        let original_path = PathBuf::from(&operation.original_path);

        if !new_path.exists() {
            return Err((new_path, "File not found at expected location".to_string()));
        }

        if original_path.exists() {
            let backup_path = Self::generate_backup_path(&original_path);
            fs::rename(&original_path, &backup_path).map_err(|e| {
                (
                    original_path.clone(),
                    format!("Could not backup conflicting file: {}", e),
                )
            })?;
        }

        if let Some(parent) = original_path.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| {
                (
                    original_path.clone(),
                    format!("Could not recreate original directory: {}", e),
                )
            })?;
        }

        fs::rename(&new_path, &original_path)
            .map_err(|e| (new_path, format!("Failed to restore file: {}", e)))?;

        Ok(())
    }

    /// Generates a backup path for a file by appending a timestamp.
    ///
    /// Example: `file.txt` becomes `file.txt.bak.20251109-143052`
    fn generate_backup_path(original_path: &Path) -> PathBuf {
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let filename = original_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file");

        let backup_name = format!("{}.bak.{}", filename, timestamp);

        if let Some(parent) = original_path.parent() {
            parent.join(backup_name)
        } else {
            PathBuf::from(backup_name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn operation(original: &Path, moved: &Path) -> Operation {
        Operation {
            timestamp: "2024-03-01T10:00:00+00:00".to_string(),
            action: "move".to_string(),
            original_path: original.to_string_lossy().to_string(),
            new_path: moved.to_string_lossy().to_string(),
            company: "Acme".to_string(),
            category: "PDF".to_string(),
            score: 95,
        }
    }

    fn move_with_log(base: &Path, log: &OperationLog, name: &str, dest_dir: &str) -> PathBuf {
        let original = base.join(name);
        fs::write(&original, format!("content of {name}")).expect("Failed to write test file");
        let dest = base.join(dest_dir).join(name);
        fs::create_dir_all(dest.parent().unwrap()).unwrap();
        fs::rename(&original, &dest).unwrap();
        log.append(&[operation(&original, &dest)]).unwrap();
        original
    }

    #[test]
    fn test_undo_missing_log() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let result = UndoManager::undo(&temp_dir.path().join("missing.csv"), false);
        assert!(result.is_err());
    }

    #[test]
    fn test_undo_single_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        let log_path = base.join("log.csv");
        let log = OperationLog::new(log_path.clone());

        let original = move_with_log(base, &log, "fattura.pdf", "Acme/PDF/2024");
        assert!(!original.exists());

        let report = UndoManager::undo(&log_path, false).expect("Undo failed");

        assert_eq!(report.restored_files, 1);
        assert!(report.is_complete_success());
        assert!(original.exists());
        assert!(!base.join("Acme/PDF/2024/fattura.pdf").exists());
        // Log deleted on full success.
        assert!(!log_path.exists());
    }

    #[test]
    fn test_undo_multiple_files_reverse_order() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        let log_path = base.join("log.csv");
        let log = OperationLog::new(log_path.clone());

        let first = move_with_log(base, &log, "a.pdf", "Acme/PDF/2024");
        let second = move_with_log(base, &log, "b.pdf", "Globex/PDF/2023");

        let report = UndoManager::undo(&log_path, false).expect("Undo failed");

        assert_eq!(report.restored_files, 2);
        assert!(first.exists());
        assert!(second.exists());
    }

    #[test]
    fn test_undo_conflict_backs_up_existing_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        let log_path = base.join("log.csv");
        let log = OperationLog::new(log_path.clone());

        let original = move_with_log(base, &log, "doc.pdf", "Acme/PDF/2024");

        // Simulate a new file appearing at the original location.
        fs::write(&original, "new content").expect("Failed to create conflict");

        let report = UndoManager::undo(&log_path, false).expect("Undo failed");
        assert_eq!(report.restored_files, 1);
        assert!(report.failed_restores.is_empty());

        let restored = fs::read_to_string(&original).expect("Failed to read file");
        assert_eq!(restored, "content of doc.pdf");

        let backups: Vec<_> = fs::read_dir(base)
            .expect("Failed to read dir")
            .filter_map(|e| {
                let path = e.ok()?.path();
                path.file_name()?
                    .to_string_lossy()
                    .contains(".bak.")
                    .then_some(path)
            })
            .collect();
        assert_eq!(backups.len(), 1);
    }

    #[test]
    fn test_undo_missing_file_skipped_and_log_kept() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        let log_path = base.join("log.csv");
        let log = OperationLog::new(log_path.clone());

        log.append(&[operation(
            &base.join("ghost.pdf"),
            &base.join("Acme/PDF/2024/ghost.pdf"),
        )])
        .unwrap();

        let report = UndoManager::undo(&log_path, false).expect("Undo failed");

        assert_eq!(report.restored_files, 0);
        assert_eq!(report.skipped_files.len(), 1);
        assert!(!report.is_complete_success());
        assert!(log_path.exists());
    }

    #[test]
    fn test_undo_dry_run_moves_nothing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        let log_path = base.join("log.csv");
        let log = OperationLog::new(log_path.clone());

        let original = move_with_log(base, &log, "fattura.pdf", "Acme/PDF/2024");

        let report = UndoManager::undo(&log_path, true).expect("Undo failed");

        assert!(report.dry_run);
        assert_eq!(report.restored_files, 1);
        assert!(!original.exists());
        assert!(base.join("Acme/PDF/2024/fattura.pdf").exists());
        assert!(log_path.exists());
    }
}
