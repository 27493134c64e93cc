//! filify - file organization with a durable move log and commit-based undo
//!
//! This library organizes the files directly inside a directory into category
//! subfolders based on their extension. Every move is recorded in an
//! append-only log, and recorded moves can be reversed either by count
//! ("undo the last N moves") or by the commit id shared by one organize run.

pub mod classifier;
pub mod cli;
pub mod config;
pub mod lock;
pub mod move_log;
pub mod mover;
pub mod organizer;
pub mod output;
pub mod undo;

pub use classifier::Classifier;
pub use config::{CompiledExcludes, Config, ConfigError};
pub use lock::{DirLock, LockError};
pub use move_log::{LogError, MoveLog, MoveRecord, MoveStatus};
pub use mover::{FileMover, MoveError};
pub use organizer::{OrganizeError, OrganizeSummary, Organizer};
pub use undo::{UndoEngine, UndoError, UndoReport};

pub use cli::{Command, run_cli};
