//! Rename execution.
//!
//! Commits a plan to disk one entry at a time. Preconditions are checked
//! again right before each rename because the plan may be stale, and a
//! failing entry is recorded and skipped so it never stops the batch. The
//! resulting [`OperationRecord`] is appended to the history.

use crate::history::{FailedRename, History, OperationRecord, RenameRecord};
use crate::planner::{PlanOutcome, RenamePlanEntry};
use chrono::Local;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Why a single ready entry could not be renamed.
#[derive(Debug, Error)]
pub enum RenameFailure {
    #[error("file not found")]
    SourceMissing,

    #[error("no write permission")]
    NoWritePermission,

    #[error("target already exists")]
    TargetExists,

    #[error("{0}")]
    Io(#[from] io::Error),
}

/// What an execute call produced.
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteOutcome {
    pub operation: OperationRecord,
    /// Set when the operation could not be written to the history file.
    /// The renames themselves stand either way.
    pub history_warning: Option<String>,
}

/// Checks that `original` can still be renamed to `target`.
pub fn check_preconditions(original: &Path, target: &Path) -> Result<(), RenameFailure> {
    if !original.exists() {
        return Err(RenameFailure::SourceMissing);
    }

    let parent = original.parent().unwrap_or_else(|| Path::new("."));
    let parent = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };
    if !is_writable_dir(parent) {
        return Err(RenameFailure::NoWritePermission);
    }

    if target.exists() {
        return Err(RenameFailure::TargetExists);
    }
    Ok(())
}

/// Renames one file after re-checking its preconditions.
pub fn rename_file(original: &Path, target: &Path) -> Result<(), RenameFailure> {
    check_preconditions(original, target)?;
    fs::rename(original, target).map_err(rename_error)
}

fn rename_error(e: io::Error) -> RenameFailure {
    match e.kind() {
        io::ErrorKind::PermissionDenied => RenameFailure::NoWritePermission,
        _ => RenameFailure::Io(e),
    }
}

/// Whether the current process may create and remove entries in `dir`,
/// taking ownership and the effective user into account.
#[cfg(unix)]
fn is_writable_dir(dir: &Path) -> bool {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let Ok(c_path) = CString::new(dir.as_os_str().as_bytes()) else {
        return false;
    };
    // SAFETY: c_path is a valid NUL-terminated string that outlives the call.
    unsafe { libc::access(c_path.as_ptr(), libc::W_OK) == 0 }
}

#[cfg(not(unix))]
fn is_writable_dir(dir: &Path) -> bool {
    fs::metadata(dir).is_ok_and(|meta| !meta.permissions().readonly())
}

/// Executes `plan`, records the operation in `history` and saves it to
/// `base_dir`.
///
/// `on_entry` is called once per plan entry before it is processed.
pub fn execute_plan<F>(
    plan: &[RenamePlanEntry],
    history: &mut History,
    base_dir: &Path,
    mut on_entry: F,
) -> ExecuteOutcome
where
    F: FnMut(&RenamePlanEntry),
{
    let mut successful = Vec::new();
    let mut failed = Vec::new();

    for entry in plan {
        on_entry(entry);

        let (new_name, new_path) = match &entry.outcome {
            PlanOutcome::Ready {
                new_name, new_path, ..
            } => (new_name, new_path),
            PlanOutcome::Error { error } => {
                failed.push(FailedRename {
                    file: entry.original_name.clone(),
                    error: error.clone(),
                });
                continue;
            }
        };

        match rename_file(&entry.original_path, new_path) {
            Ok(()) => successful.push(RenameRecord {
                original_path: entry.original_path.clone(),
                new_path: new_path.clone(),
                original_name: entry.original_name.clone(),
                new_name: new_name.clone(),
                timestamp: Local::now(),
            }),
            Err(e) => {
                warn!("cannot rename {}: {}", entry.original_path.display(), e);
                failed.push(FailedRename {
                    file: entry.original_name.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    let now = Local::now();
    let operation = OperationRecord::new(history.next_operation_id(now), now, successful, failed);
    info!(
        "operation {}: {} renamed, {} failed",
        operation.operation_id, operation.successful_count, operation.failed_count
    );

    let history_warning = match history.append(operation.clone(), base_dir) {
        Ok(()) => None,
        Err(e) => {
            warn!("{}", e);
            Some(e.to_string())
        }
    };

    ExecuteOutcome {
        operation,
        history_warning,
    }
}
