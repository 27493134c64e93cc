/// Batch organization of a directory into category subfolders.
///
/// The organizer scans the top level of the target directory (subdirectories
/// are never descended into, so already-sorted output is left alone),
/// classifies each eligible file, and moves it via [`FileMover`], recording
/// every successful move in the injected [`MoveLog`] under one commit id per
/// run. A failed move skips that file and the batch continues; a failed log
/// append aborts the run, since an unrecorded move would be invisible to undo.
use crate::classifier::Classifier;
use crate::config::CompiledExcludes;
use crate::lock::LOCK_FILE_NAME;
use crate::move_log::{self, LOG_FILE_NAME, LOG_TMP_FILE_NAME, LogError, MoveLog, MoveRecord};
use crate::mover::FileMover;
use indicatif::ProgressBar;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Errors that abort an organize run before or during the batch.
#[derive(Debug)]
pub enum OrganizeError {
    /// The target directory does not exist or cannot be read.
    InvalidTargetDir { path: PathBuf, source: io::Error },
    /// The move log could not be read or written.
    Log(LogError),
}

impl std::fmt::Display for OrganizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTargetDir { path, source } => {
                write!(f, "Invalid target directory {}: {}", path.display(), source)
            }
            Self::Log(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for OrganizeError {}

impl From<LogError> for OrganizeError {
    fn from(e: LogError) -> Self {
        Self::Log(e)
    }
}

/// Outcome of one organize run.
#[derive(Debug)]
pub struct OrganizeSummary {
    /// Commit id shared by every record of this run. Present even when no
    /// files were moved, so "ran but nothing to do" is distinguishable from
    /// "did not run".
    pub commit_id: String,
    /// Records appended to the log, in move order.
    pub moved: Vec<MoveRecord>,
    /// Files that could not be moved, with the reason. These are diagnostics,
    /// not log records.
    pub failures: Vec<(PathBuf, String)>,
}

impl OrganizeSummary {
    /// True when every candidate file was moved.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Orchestrates scan, classification, move, and log append.
///
/// The log, classifier, and exclude rules are injected so tests can run
/// against a temp directory with a custom category map.
pub struct Organizer<'a> {
    log: &'a MoveLog,
    classifier: &'a Classifier,
    excludes: &'a CompiledExcludes,
}

impl<'a> Organizer<'a> {
    pub fn new(
        log: &'a MoveLog,
        classifier: &'a Classifier,
        excludes: &'a CompiledExcludes,
    ) -> Self {
        Self {
            log,
            classifier,
            excludes,
        }
    }

    /// Lists the files an organize run would touch, sorted by name.
    ///
    /// Only regular files directly inside `target_dir` are candidates;
    /// subdirectories, the log file, the lock file, and config-excluded
    /// files are skipped.
    pub fn scan(&self, target_dir: &Path) -> Result<Vec<PathBuf>, OrganizeError> {
        let entries = fs::read_dir(target_dir).map_err(|e| OrganizeError::InvalidTargetDir {
            path: target_dir.to_path_buf(),
            source: e,
        })?;

        let mut candidates = Vec::new();
        for entry in entries.flatten() {
            if let Ok(file_type) = entry.file_type()
                && file_type.is_file()
            {
                let name = entry.file_name();
                if name == LOG_FILE_NAME || name == LOG_TMP_FILE_NAME || name == LOCK_FILE_NAME {
                    continue;
                }
                let path = entry.path();
                if self.excludes.should_include(&path) {
                    candidates.push(path);
                }
            }
        }

        candidates.sort();
        Ok(candidates)
    }

    /// Runs one organize batch over `target_dir`.
    ///
    /// For each candidate: classify by extension, move into
    /// `<target_dir>/<category>/<name>`, then append the record. The move
    /// happens before the append, so a crash between the two leaves an
    /// unlogged but correctly placed file rather than a log entry for a move
    /// that never happened.
    ///
    /// When `progress` is given its length is set to the candidate count and
    /// it is advanced once per file.
    pub fn run(
        &self,
        target_dir: &Path,
        progress: Option<&ProgressBar>,
    ) -> Result<OrganizeSummary, OrganizeError> {
        let candidates = self.scan(target_dir)?;
        if let Some(bar) = progress {
            bar.set_length(candidates.len() as u64);
        }

        let mut summary = OrganizeSummary {
            commit_id: move_log::generate_commit_id(),
            moved: Vec::new(),
            failures: Vec::new(),
        };

        for path in candidates {
            let file_name = match path.file_name() {
                Some(name) => name.to_os_string(),
                None => continue,
            };
            let category = self
                .classifier
                .classify(&file_name.to_string_lossy())
                .to_string();
            let dest = target_dir.join(&category).join(&file_name);

            match FileMover::move_file(&path, &dest) {
                Ok(()) => {
                    let record = MoveRecord::new(&summary.commit_id, path, dest);
                    self.log.append(&record)?;
                    summary.moved.push(record);
                }
                Err(e) => {
                    summary.failures.push((path, e.to_string()));
                }
            }

            if let Some(bar) = progress {
                bar.inc(1);
            }
        }

        Ok(summary)
    }
}
