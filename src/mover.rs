/// Single-file move with pre-checks and collision avoidance.
///
/// Moves are atomic from the caller's perspective: a plain `fs::rename` on
/// the same volume, and a copy-verify-delete sequence when the rename fails
/// because source and destination live on different devices. The source is
/// only deleted after the copy has been verified by size and checksum.
use std::fs::{self, File};
use std::hash::{DefaultHasher, Hasher};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

/// Errors from a single move attempt. All variants are per-file: callers
/// skip the file and continue the batch.
#[derive(Debug)]
pub enum MoveError {
    /// The source path does not exist.
    SourceMissing { path: PathBuf },
    /// The source exists but is not a regular file.
    NotAFile { path: PathBuf },
    /// The destination is already occupied; the move is refused rather than
    /// overwriting.
    Collision { path: PathBuf },
    /// The destination's parent directory could not be created.
    DirectoryCreationFailed { path: PathBuf, source: io::Error },
    /// The rename or the fallback copy failed.
    MoveFailed {
        source_path: PathBuf,
        dest_path: PathBuf,
        source: io::Error,
    },
    /// The cross-device copy did not verify; the source was left in place.
    CopyVerifyFailed {
        source_path: PathBuf,
        dest_path: PathBuf,
        reason: String,
    },
}

impl std::fmt::Display for MoveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SourceMissing { path } => {
                write!(f, "Source file not found: {}", path.display())
            }
            Self::NotAFile { path } => {
                write!(f, "Not a regular file: {}", path.display())
            }
            Self::Collision { path } => {
                write!(f, "Destination already exists: {}", path.display())
            }
            Self::DirectoryCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::MoveFailed {
                source_path,
                dest_path,
                source,
            } => {
                write!(
                    f,
                    "Failed to move {} to {}: {}",
                    source_path.display(),
                    dest_path.display(),
                    source
                )
            }
            Self::CopyVerifyFailed {
                source_path,
                dest_path,
                reason,
            } => {
                write!(
                    f,
                    "Copy of {} to {} failed verification: {}",
                    source_path.display(),
                    dest_path.display(),
                    reason
                )
            }
        }
    }
}

impl std::error::Error for MoveError {}

/// Performs individual file moves.
pub struct FileMover;

impl FileMover {
    /// Moves `source` to `dest`, creating `dest`'s parent directory if needed.
    ///
    /// Preconditions checked here: `source` exists and is a regular file, and
    /// `dest` is unoccupied. An occupied destination fails with
    /// [`MoveError::Collision`]; the existing file is never overwritten.
    pub fn move_file(source: &Path, dest: &Path) -> Result<(), MoveError> {
        if !source.exists() {
            return Err(MoveError::SourceMissing {
                path: source.to_path_buf(),
            });
        }
        if !source.is_file() {
            return Err(MoveError::NotAFile {
                path: source.to_path_buf(),
            });
        }
        if dest.exists() {
            return Err(MoveError::Collision {
                path: dest.to_path_buf(),
            });
        }

        if let Some(parent) = dest.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| MoveError::DirectoryCreationFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        match fs::rename(source, dest) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                Self::copy_verify_delete(source, dest)
            }
            Err(e) => Err(MoveError::MoveFailed {
                source_path: source.to_path_buf(),
                dest_path: dest.to_path_buf(),
                source: e,
            }),
        }
    }

    /// Fallback for moves across filesystems: copy, verify size and checksum,
    /// then delete the source. A failed verification removes the partial copy
    /// and leaves the source untouched.
    fn copy_verify_delete(source: &Path, dest: &Path) -> Result<(), MoveError> {
        let move_failed = |e: io::Error| MoveError::MoveFailed {
            source_path: source.to_path_buf(),
            dest_path: dest.to_path_buf(),
            source: e,
        };

        let copied = match fs::copy(source, dest) {
            Ok(n) => n,
            Err(e) => {
                // A failed copy can leave a partial destination behind; remove
                // it so a retry does not trip the collision pre-check.
                let _ = fs::remove_file(dest);
                return Err(move_failed(e));
            }
        };

        let source_len = fs::metadata(source).map_err(move_failed)?.len();
        if copied != source_len {
            let _ = fs::remove_file(dest);
            return Err(MoveError::CopyVerifyFailed {
                source_path: source.to_path_buf(),
                dest_path: dest.to_path_buf(),
                reason: format!("size mismatch: copied {} of {} bytes", copied, source_len),
            });
        }

        let source_sum = Self::checksum(source).map_err(move_failed)?;
        let dest_sum = Self::checksum(dest).map_err(move_failed)?;
        if source_sum != dest_sum {
            let _ = fs::remove_file(dest);
            return Err(MoveError::CopyVerifyFailed {
                source_path: source.to_path_buf(),
                dest_path: dest.to_path_buf(),
                reason: format!("checksum mismatch: {:016x} != {:016x}", source_sum, dest_sum),
            });
        }

        fs::remove_file(source).map_err(move_failed)
    }

    fn checksum(path: &Path) -> io::Result<u64> {
        let mut reader = BufReader::new(File::open(path)?);
        let mut hasher = DefaultHasher::new();
        let mut buffer = [0u8; 64 * 1024];
        loop {
            let read = reader.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            hasher.write(&buffer[..read]);
        }
        Ok(hasher.finish())
    }
}
