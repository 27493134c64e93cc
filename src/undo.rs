/// Undo engine reversing logged moves by count or by commit id.
///
/// Reversal moves `dest_path` back to `source_path` through the same
/// [`FileMover`] used by the organizer (so collisions at the original
/// location are refused, never overwritten) and flips the record's status
/// only after the reversal move succeeded. A record whose reversal fails
/// stays `ACTIVE` and can be retried; a record already `UNDONE` is reported
/// as such and never re-moved.
use crate::move_log::{LogError, MoveLog, MoveRecord, MoveStatus};
use crate::mover::FileMover;

/// Errors that abort an undo operation before any file is touched, plus log
/// failures mid-operation.
#[derive(Debug)]
pub enum UndoError {
    /// The requested count is not a positive integer.
    InvalidCount(usize),
    /// No log record carries the requested commit id.
    UnknownCommit(String),
    /// The move log could not be read or updated.
    Log(LogError),
}

impl std::fmt::Display for UndoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCount(n) => {
                write!(f, "Undo count must be a positive integer, got {}", n)
            }
            Self::UnknownCommit(id) => {
                write!(f, "Commit id '{}' not found in the move log", id)
            }
            Self::Log(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for UndoError {}

impl From<LogError> for UndoError {
    fn from(e: LogError) -> Self {
        Self::Log(e)
    }
}

/// Per-record outcomes of an undo operation.
#[derive(Debug, Default)]
pub struct UndoReport {
    /// Records whose files were moved back and whose status was flipped.
    pub restored: Vec<MoveRecord>,
    /// Records that were already `UNDONE`; nothing was re-moved.
    pub already_undone: Vec<MoveRecord>,
    /// Records whose reversal failed, with the reason. They stay `ACTIVE`.
    pub failed: Vec<(MoveRecord, String)>,
}

impl UndoReport {
    /// Number of records newly flipped to `UNDONE` by this operation.
    pub fn newly_undone(&self) -> usize {
        self.restored.len()
    }

    /// True when no reversal failed.
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Total records considered by this operation.
    pub fn total_processed(&self) -> usize {
        self.restored.len() + self.already_undone.len() + self.failed.len()
    }
}

/// Reverses logged moves against an injected log store.
pub struct UndoEngine<'a> {
    log: &'a MoveLog,
}

impl<'a> UndoEngine<'a> {
    pub fn new(log: &'a MoveLog) -> Self {
        Self { log }
    }

    /// Undoes the most recent `n` still-active moves, most-recent-first.
    ///
    /// Fewer than `n` active records is not an error; whatever exists is
    /// reversed and reported.
    pub fn undo_last_n(&self, n: usize) -> Result<UndoReport, UndoError> {
        if n == 0 {
            return Err(UndoError::InvalidCount(n));
        }

        let records = self.log.find_last_n_active(n)?;
        self.reverse_all(&records)
    }

    /// Undoes every record belonging to one organize run.
    ///
    /// Fails with [`UndoError::UnknownCommit`] before touching the
    /// filesystem or the log when the commit id matches nothing.
    pub fn undo_by_commit(&self, commit_id: &str) -> Result<UndoReport, UndoError> {
        let mut records = self.log.find_by_commit(commit_id)?;
        if records.is_empty() {
            return Err(UndoError::UnknownCommit(commit_id.to_string()));
        }

        // Records of one run are independent files, but reversing newest
        // first keeps the behavior consistent with undo_last_n.
        records.reverse();
        self.reverse_all(&records)
    }

    /// Applies the fail-and-continue policy over a batch of records.
    fn reverse_all(&self, records: &[MoveRecord]) -> Result<UndoReport, UndoError> {
        let mut report = UndoReport::default();

        for record in records {
            if record.status == MoveStatus::Undone {
                report.already_undone.push(record.clone());
                continue;
            }

            match FileMover::move_file(&record.dest_path, &record.source_path) {
                Ok(()) => {
                    // Flip only after the file is back; a flip failure here is
                    // a fatal log error, not a per-record one.
                    self.log.mark_undone(record)?;
                    report.restored.push(record.clone());
                }
                Err(e) => {
                    report.failed.push((record.clone(), e.to_string()));
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Classifier;
    use crate::config::Config;
    use crate::organizer::Organizer;
    use std::collections::HashMap;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn test_config() -> Config {
        let mut categories = HashMap::new();
        categories.insert("Images".to_string(), vec!["jpg".to_string()]);
        categories.insert("Documents".to_string(), vec!["pdf".to_string()]);
        Config {
            categories,
            ..Config::default()
        }
    }

    fn organize(dir: &Path, log: &MoveLog) -> String {
        let config = test_config();
        let classifier: Classifier = config.classifier().unwrap();
        let excludes = config.compiled_excludes().unwrap();
        let organizer = Organizer::new(log, &classifier, &excludes);
        organizer.run(dir, None).expect("organize failed").commit_id
    }

    #[test]
    fn test_undo_last_n_restores_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::write(base.join("a.jpg"), "jpeg").unwrap();
        fs::write(base.join("b.pdf"), "pdf").unwrap();

        let log = MoveLog::for_directory(base);
        organize(base, &log);

        let report = UndoEngine::new(&log).undo_last_n(2).unwrap();

        assert_eq!(report.newly_undone(), 2);
        assert!(report.is_complete_success());
        assert!(base.join("a.jpg").exists());
        assert!(base.join("b.pdf").exists());
        assert!(!base.join("Images").join("a.jpg").exists());

        let records = log.read_all().unwrap();
        assert!(records.iter().all(|r| r.status == MoveStatus::Undone));
    }

    #[test]
    fn test_undo_last_n_partial_count() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::write(base.join("a.jpg"), "jpeg").unwrap();
        fs::write(base.join("b.pdf"), "pdf").unwrap();

        let log = MoveLog::for_directory(base);
        organize(base, &log);

        // Only the most recent move is reversed.
        let report = UndoEngine::new(&log).undo_last_n(1).unwrap();
        assert_eq!(report.newly_undone(), 1);

        let still_active = log.find_last_n_active(10).unwrap();
        assert_eq!(still_active.len(), 1);
    }

    #[test]
    fn test_undo_zero_is_invalid() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let log = MoveLog::for_directory(temp_dir.path());

        assert!(matches!(
            UndoEngine::new(&log).undo_last_n(0),
            Err(UndoError::InvalidCount(0))
        ));
    }

    #[test]
    fn test_undo_by_commit_round_trip() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::write(base.join("a.jpg"), "photo bytes").unwrap();
        fs::write(base.join("c"), "extensionless").unwrap();

        let log = MoveLog::for_directory(base);
        let commit_id = organize(base, &log);

        let report = UndoEngine::new(&log).undo_by_commit(&commit_id).unwrap();

        assert_eq!(report.newly_undone(), 2);
        assert_eq!(
            fs::read_to_string(base.join("a.jpg")).unwrap(),
            "photo bytes"
        );
        assert_eq!(fs::read_to_string(base.join("c")).unwrap(), "extensionless");
    }

    #[test]
    fn test_undo_by_commit_twice_is_idempotent() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::write(base.join("a.jpg"), "jpeg").unwrap();

        let log = MoveLog::for_directory(base);
        let commit_id = organize(base, &log);

        let engine = UndoEngine::new(&log);
        let first = engine.undo_by_commit(&commit_id).unwrap();
        assert_eq!(first.newly_undone(), 1);

        let second = engine.undo_by_commit(&commit_id).unwrap();
        assert_eq!(second.newly_undone(), 0);
        assert_eq!(second.already_undone.len(), 1);
        assert!(base.join("a.jpg").exists());
    }

    #[test]
    fn test_undo_unknown_commit_fails_without_touching_anything() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::write(base.join("a.jpg"), "jpeg").unwrap();

        let log = MoveLog::for_directory(base);
        organize(base, &log);
        let before = log.read_all().unwrap();

        let result = UndoEngine::new(&log).undo_by_commit("nonexistent");
        assert!(matches!(result, Err(UndoError::UnknownCommit(_))));

        // Filesystem and log are unchanged.
        assert!(base.join("Images").join("a.jpg").exists());
        let after = log.read_all().unwrap();
        assert_eq!(before.len(), after.len());
        assert!(after.iter().all(|r| r.status == MoveStatus::Active));
    }

    #[test]
    fn test_missing_dest_fails_record_but_continues() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::write(base.join("a.jpg"), "jpeg").unwrap();
        fs::write(base.join("b.pdf"), "pdf").unwrap();

        let log = MoveLog::for_directory(base);
        let commit_id = organize(base, &log);

        // Simulate the user relocating one organized file by hand.
        fs::remove_file(base.join("Images").join("a.jpg")).unwrap();

        let report = UndoEngine::new(&log).undo_by_commit(&commit_id).unwrap();

        assert_eq!(report.newly_undone(), 1);
        assert_eq!(report.failed.len(), 1);
        assert!(base.join("b.pdf").exists());

        // The failed record stays ACTIVE and is retryable.
        let records = log.read_all().unwrap();
        let failed_record = records
            .iter()
            .find(|r| r.source_path == base.join("a.jpg"))
            .unwrap();
        assert_eq!(failed_record.status, MoveStatus::Active);
    }

    #[test]
    fn test_collision_at_original_path_is_not_overwritten() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::write(base.join("a.jpg"), "original").unwrap();

        let log = MoveLog::for_directory(base);
        let commit_id = organize(base, &log);

        // A new unrelated file now occupies the original path.
        fs::write(base.join("a.jpg"), "newcomer").unwrap();

        let report = UndoEngine::new(&log).undo_by_commit(&commit_id).unwrap();

        assert_eq!(report.newly_undone(), 0);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(fs::read_to_string(base.join("a.jpg")).unwrap(), "newcomer");
        assert_eq!(
            fs::read_to_string(base.join("Images").join("a.jpg")).unwrap(),
            "original"
        );
    }
}
