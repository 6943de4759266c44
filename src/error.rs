//! Structural errors.
//!
//! Only failures that make a whole call meaningless end up here: the managed
//! directory is gone, an operation id does not exist, the configuration is
//! broken. Failures that concern a single file are carried as values inside
//! plans, operation records and revert reports instead.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a scan, plan, execute or revert call as a whole.
#[derive(Debug, Error)]
pub enum RenameError {
    /// The directory does not exist.
    #[error("directory not found: {}", path.display())]
    DirectoryNotFound { path: PathBuf },

    /// The path exists but is not a directory.
    #[error("not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },

    /// The directory exists but its entries cannot be listed.
    #[error("cannot read directory {}: {source}", path.display())]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No operation with this id is recorded in the history.
    #[error("operation not found: {id}")]
    OperationNotFound { id: String },

    /// A "last operation" was requested but nothing has been recorded.
    #[error("no operations recorded")]
    EmptyHistory,

    /// The history file could not be written.
    #[error("failed to write history file {}: {source}", path.display())]
    HistoryWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The history could not be serialized.
    #[error("failed to serialize history: {0}")]
    HistorySerialize(#[from] serde_json::Error),

    /// Configuration could not be loaded or compiled.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}

/// Result type for structural operations.
pub type RenameResult<T> = Result<T, RenameError>;

/// Fails with a structural error unless `path` is an existing directory.
pub(crate) fn ensure_directory(path: &std::path::Path) -> RenameResult<()> {
    if !path.exists() {
        return Err(RenameError::DirectoryNotFound {
            path: path.to_path_buf(),
        });
    }
    if !path.is_dir() {
        return Err(RenameError::NotADirectory {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}
