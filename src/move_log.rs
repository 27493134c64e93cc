/// Durable, append-only log of file moves.
///
/// Every move performed by the organizer is recorded here before the run is
/// considered committed, and the undo engine reads this log to reverse moves.
/// Records are stored one-per-line as JSON in `.filify_log.jsonl` inside the
/// target directory. Undo never deletes history: it flips the `status` field
/// of the affected record while preserving every record and their order.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Name of the log file kept inside the organized directory.
pub const LOG_FILE_NAME: &str = ".filify_log.jsonl";

/// Name of the transient file used while rewriting the log. A crash can
/// leave it behind, so the organizer skips it by name like the log itself.
pub const LOG_TMP_FILE_NAME: &str = ".filify_log.jsonl.tmp";

/// Generates a commit id shared by all records of one organize run.
///
/// Eight hex characters of a v4 UUID, short enough to retype from the run
/// summary into `filify undo-commit`.
pub fn generate_commit_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Lifecycle state of a logged move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MoveStatus {
    /// The move was applied and has not been undone.
    Active,
    /// The move was reversed. Terminal state.
    Undone,
}

/// One logged file relocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveRecord {
    /// Unique id of this record, target of [`MoveLog::mark_undone`].
    pub id: String,
    /// Id shared by every record of the same organize run.
    pub commit_id: String,
    /// Path before organization.
    pub source_path: PathBuf,
    /// Path after organization.
    pub dest_path: PathBuf,
    /// When the record was created.
    pub timestamp: DateTime<Utc>,
    /// Whether the move is still applied or has been reversed.
    pub status: MoveStatus,
}

impl MoveRecord {
    /// Creates an `ACTIVE` record for a move that was just performed.
    pub fn new(commit_id: &str, source_path: PathBuf, dest_path: PathBuf) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            commit_id: commit_id.to_string(),
            source_path,
            dest_path,
            timestamp: Utc::now(),
            status: MoveStatus::Active,
        }
    }
}

/// Errors raised by the log store.
#[derive(Debug)]
pub enum LogError {
    /// Reading or writing the log file failed.
    Io { path: PathBuf, source: io::Error },
    /// A log line could not be parsed. Fatal for the current operation.
    Corrupt {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    /// `mark_undone` was asked to flip a record the log does not contain.
    RecordNotFound { id: String },
}

impl std::fmt::Display for LogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Log IO error on {}: {}", path.display(), source)
            }
            Self::Corrupt { path, line, reason } => {
                write!(
                    f,
                    "Corrupt log {} at line {}: {}",
                    path.display(),
                    line,
                    reason
                )
            }
            Self::RecordNotFound { id } => {
                write!(f, "Log record {} not found", id)
            }
        }
    }
}

impl std::error::Error for LogError {}

/// File-backed move log store.
///
/// Constructed per target directory and injected into the organizer and the
/// undo engine, so tests can point it at a temporary directory.
pub struct MoveLog {
    path: PathBuf,
}

impl MoveLog {
    /// Creates a store backed by an explicit log file path.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Creates a store for the conventional log location inside `dir`.
    pub fn for_directory(dir: &Path) -> Self {
        Self::new(dir.join(LOG_FILE_NAME))
    }

    /// Path of the backing log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one record and flushes it to disk.
    ///
    /// The caller must not consider the corresponding file move committed
    /// unless this returns `Ok`.
    pub fn append(&self, record: &MoveRecord) -> Result<(), LogError> {
        let mut line = serde_json::to_string(record).map_err(|e| LogError::Io {
            path: self.path.clone(),
            source: io::Error::new(io::ErrorKind::InvalidData, e),
        })?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;

        file.write_all(line.as_bytes())
            .map_err(|e| self.io_error(e))?;
        file.sync_all().map_err(|e| self.io_error(e))?;

        Ok(())
    }

    /// Reads every record in append order. A missing log file is an empty log.
    pub fn read_all(&self) -> Result<Vec<MoveRecord>, LogError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;

        let mut records = Vec::new();
        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(line).map_err(|e| LogError::Corrupt {
                path: self.path.clone(),
                line: index + 1,
                reason: e.to_string(),
            })?;
            records.push(record);
        }

        Ok(records)
    }

    /// Returns all records sharing a commit id, in append order.
    pub fn find_by_commit(&self, commit_id: &str) -> Result<Vec<MoveRecord>, LogError> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|r| r.commit_id == commit_id)
            .collect())
    }

    /// Returns the most recent `n` records with `ACTIVE` status,
    /// most-recent-first.
    pub fn find_last_n_active(&self, n: usize) -> Result<Vec<MoveRecord>, LogError> {
        Ok(self
            .read_all()?
            .into_iter()
            .rev()
            .filter(|r| r.status == MoveStatus::Active)
            .take(n)
            .collect())
    }

    /// Flips a record's status to `UNDONE` and persists the change.
    ///
    /// History is preserved: all records are kept in their original order,
    /// and the rewrite goes through a temp file plus atomic rename so a crash
    /// mid-flip leaves the previous log intact.
    pub fn mark_undone(&self, record: &MoveRecord) -> Result<(), LogError> {
        let mut records = self.read_all()?;
        let entry = records
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or_else(|| LogError::RecordNotFound {
                id: record.id.clone(),
            })?;
        entry.status = MoveStatus::Undone;
        self.rewrite(&records)
    }

    fn rewrite(&self, records: &[MoveRecord]) -> Result<(), LogError> {
        let mut content = String::new();
        for record in records {
            let line = serde_json::to_string(record).map_err(|e| LogError::Io {
                path: self.path.clone(),
                source: io::Error::new(io::ErrorKind::InvalidData, e),
            })?;
            content.push_str(&line);
            content.push('\n');
        }

        let tmp_path = self.path.with_extension("jsonl.tmp");
        let mut tmp = File::create(&tmp_path).map_err(|e| self.io_error(e))?;
        tmp.write_all(content.as_bytes())
            .map_err(|e| self.io_error(e))?;
        tmp.sync_all().map_err(|e| self.io_error(e))?;

        fs::rename(&tmp_path, &self.path).map_err(|e| self.io_error(e))
    }

    fn io_error(&self, source: io::Error) -> LogError {
        LogError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
