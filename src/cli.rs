//! Command orchestration for filify.
//!
//! Wires configuration, the move log, the organizer, and the undo engine
//! together for the three operations the binary exposes: organize (with an
//! optional dry run), undo-last-N, and undo-by-commit. Mutating operations
//! run under the directory lock; dry runs do not.

use crate::classifier::Classifier;
use crate::config::{CompiledExcludes, Config};
use crate::lock::{DEFAULT_LOCK_TIMEOUT, DirLock};
use crate::move_log::{MoveLog, MoveRecord};
use crate::organizer::Organizer;
use crate::output::OutputFormatter;
use crate::undo::{UndoEngine, UndoReport};
use std::collections::HashMap;
use std::path::Path;

/// An operation to execute against the target directory.
#[derive(Debug, Clone)]
pub enum Command {
    /// Organize files into category subfolders.
    Organize {
        /// If true, report the planned moves without making changes.
        dry_run: bool,
    },
    /// Undo the last N recorded moves.
    UndoLast { count: usize },
    /// Undo every move recorded under one commit id.
    UndoCommit { commit_id: String },
}

/// Runs one command with the given configuration.
///
/// This is the entry point `main` calls after argument parsing. Fatal errors
/// (bad configuration, lock held, unreadable log, unknown commit) come back
/// as the `Err` string; per-file failures are printed and reported in the
/// summary but complete the operation normally.
pub fn run_cli(command: Command, config: &Config) -> Result<(), String> {
    let classifier = config
        .classifier()
        .map_err(|e| format!("Configuration error: {}", e))?;
    let excludes = config
        .compiled_excludes()
        .map_err(|e| format!("Configuration error: {}", e))?;

    let target_dir = config.target_directory.as_path();
    let log = MoveLog::for_directory(target_dir);

    match command {
        Command::Organize { dry_run: true } => {
            dry_run_organize(target_dir, &log, &classifier, &excludes)
        }
        Command::Organize { dry_run: false } => {
            organize(target_dir, &log, &classifier, &excludes)
        }
        Command::UndoLast { count } => {
            let _lock = acquire_lock(target_dir)?;
            let report = UndoEngine::new(&log)
                .undo_last_n(count)
                .map_err(|e| e.to_string())?;
            print_undo_report(&report);
            Ok(())
        }
        Command::UndoCommit { commit_id } => {
            let _lock = acquire_lock(target_dir)?;
            let report = UndoEngine::new(&log)
                .undo_by_commit(&commit_id)
                .map_err(|e| e.to_string())?;
            print_undo_report(&report);
            Ok(())
        }
    }
}

fn acquire_lock(target_dir: &Path) -> Result<DirLock, String> {
    DirLock::acquire(target_dir, DEFAULT_LOCK_TIMEOUT).map_err(|e| e.to_string())
}

/// Organizes the target directory and prints the run summary.
fn organize(
    target_dir: &Path,
    log: &MoveLog,
    classifier: &Classifier,
    excludes: &CompiledExcludes,
) -> Result<(), String> {
    OutputFormatter::info(&format!("Organizing contents of: {}", target_dir.display()));

    let _lock = acquire_lock(target_dir)?;
    let organizer = Organizer::new(log, classifier, excludes);

    let progress = OutputFormatter::create_progress_bar();
    let summary = organizer
        .run(target_dir, Some(&progress))
        .map_err(|e| e.to_string())?;
    progress.finish_and_clear();

    for record in &summary.moved {
        OutputFormatter::success(&format!(
            "{} → {}/",
            record.source_path.display(),
            category_of(record)
        ));
    }
    for (path, reason) in &summary.failures {
        OutputFormatter::error(&format!("{}: {}", path.display(), reason));
    }

    if summary.moved.is_empty() && summary.failures.is_empty() {
        OutputFormatter::plain("No files needed organizing.");
    } else {
        OutputFormatter::summary_table(&category_counts(&summary.moved), summary.moved.len());
    }
    OutputFormatter::commit_line(&summary.commit_id);

    if !summary.is_clean() {
        OutputFormatter::warning(&format!(
            "{} file(s) could not be organized; see errors above.",
            summary.failures.len()
        ));
    }

    Ok(())
}

/// Prints what an organize run would do, without locking, moving, or logging.
fn dry_run_organize(
    target_dir: &Path,
    log: &MoveLog,
    classifier: &Classifier,
    excludes: &CompiledExcludes,
) -> Result<(), String> {
    OutputFormatter::dry_run_notice(&format!(
        "Analyzing contents of: {}",
        target_dir.display()
    ));

    let organizer = Organizer::new(log, classifier, excludes);
    let candidates = organizer.scan(target_dir).map_err(|e| e.to_string())?;

    if candidates.is_empty() {
        OutputFormatter::plain("No files to organize.");
        return Ok(());
    }

    let mut counts: HashMap<String, usize> = HashMap::new();
    for path in &candidates {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let category = classifier.classify(&name);
        OutputFormatter::plain(&format!(" - {} → {}/", name, category));
        *counts.entry(category.to_string()).or_insert(0) += 1;
    }

    OutputFormatter::summary_table(&counts, candidates.len());
    OutputFormatter::dry_run_notice("No files were modified.");
    Ok(())
}

fn print_undo_report(report: &UndoReport) {
    for record in &report.restored {
        OutputFormatter::success(&format!(
            "Restored {} → {}",
            record.dest_path.display(),
            record.source_path.display()
        ));
    }
    for record in &report.already_undone {
        OutputFormatter::plain(&format!(
            "Already undone: {} (commit {})",
            record.dest_path.display(),
            record.commit_id
        ));
    }
    for (record, reason) in &report.failed {
        OutputFormatter::error(&format!("{}: {}", record.dest_path.display(), reason));
    }

    OutputFormatter::plain(&format!(
        "Undo finished: {} restored, {} already undone, {} failed.",
        report.restored.len(),
        report.already_undone.len(),
        report.failed.len()
    ));

    if !report.is_complete_success() {
        OutputFormatter::warning(
            "Failed records stay ACTIVE in the log and can be retried once fixed.",
        );
    }
}

fn category_of(record: &MoveRecord) -> String {
    record
        .dest_path
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn category_counts(moved: &[MoveRecord]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for record in moved {
        *counts.entry(category_of(record)).or_insert(0) += 1;
    }
    counts
}
