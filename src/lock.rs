/// Advisory lock file serializing organize and undo runs.
///
/// Two concurrent invocations against the same directory would interleave
/// moves and log appends, so every mutating operation first acquires
/// `.filify.lock` inside the target directory. The lock is taken by creating
/// the file with `create_new` (O_EXCL) and released by deleting it on drop.
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

/// Name of the lock file kept inside the organized directory.
pub const LOCK_FILE_NAME: &str = ".filify.lock";

/// How long [`DirLock::acquire`] retries before failing with `Held`.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(2);

const RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// Errors raised while acquiring the lock.
#[derive(Debug)]
pub enum LockError {
    /// Another invocation holds the lock and the timeout elapsed. Safe to
    /// retry once the other run finishes.
    Held { path: PathBuf },
    /// The lock file could not be created for a reason other than contention.
    Io { path: PathBuf, source: io::Error },
}

impl std::fmt::Display for LockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Held { path } => {
                write!(
                    f,
                    "Another filify run holds the lock {}; retry when it finishes \
                     or remove the file if the run crashed",
                    path.display()
                )
            }
            Self::Io { path, source } => {
                write!(f, "Failed to create lock {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for LockError {}

/// Exclusive advisory lock on a directory, released on drop.
pub struct DirLock {
    path: PathBuf,
}

impl DirLock {
    /// Acquires the lock for `dir`, retrying until `timeout` elapses.
    ///
    /// The lock file records the owning process id to help diagnose a stale
    /// lock left behind by a crashed run.
    pub fn acquire(dir: &Path, timeout: Duration) -> Result<Self, LockError> {
        let path = dir.join(LOCK_FILE_NAME);
        let deadline = Instant::now() + timeout;

        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    let _ = writeln!(file, "{}", std::process::id());
                    return Ok(Self { path });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    if Instant::now() >= deadline {
                        return Err(LockError::Held { path });
                    }
                    thread::sleep(RETRY_INTERVAL);
                }
                Err(e) => {
                    return Err(LockError::Io { path, source: e });
                }
            }
        }
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
