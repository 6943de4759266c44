//! Reverting recorded operations.
//!
//! Each successful rename of an operation is played back in its original
//! order. A revert never overwrites: if something now sits at the original
//! path, that file is reported as failed and left alone. The operation stays
//! in the history afterwards.

use crate::error::{RenameError, RenameResult};
use crate::history::{History, OperationRecord, RenameRecord};
use serde::Serialize;
use std::fs;
use std::io;
use thiserror::Error;
use tracing::{info, warn};

/// Why a single file could not be moved back.
#[derive(Debug, Error)]
pub enum RevertFailure {
    #[error("renamed file not found")]
    RenamedFileMissing,

    #[error("original path already exists")]
    OriginalOccupied,

    #[error("{0}")]
    Io(#[from] io::Error),
}

/// One file that could not be moved back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedRevert {
    /// Current (renamed) file name.
    pub file: String,
    pub error: String,
}

/// Outcome of reverting one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevertReport {
    pub operation_id: String,
    pub reverted_count: usize,
    pub failed_reverts: Vec<FailedRevert>,
    pub total_to_revert: usize,
}

impl RevertReport {
    /// Returns true if every file was moved back.
    pub fn is_complete_success(&self) -> bool {
        self.failed_reverts.is_empty()
    }
}

/// Reverts operation `operation_id` recorded in `history`.
///
/// # Errors
///
/// Only fails when no operation has that id; per-file problems are part
/// of the report.
pub fn revert_operation(history: &History, operation_id: &str) -> RenameResult<RevertReport> {
    let operation = history
        .find(operation_id)
        .ok_or_else(|| RenameError::OperationNotFound {
            id: operation_id.to_string(),
        })?;
    Ok(revert_record(operation))
}

/// Reverts the renames of `operation`.
pub fn revert_record(operation: &OperationRecord) -> RevertReport {
    let mut report = RevertReport {
        operation_id: operation.operation_id.clone(),
        reverted_count: 0,
        failed_reverts: Vec::new(),
        total_to_revert: operation.successful_renames.len(),
    };

    for record in &operation.successful_renames {
        match restore(record) {
            Ok(()) => report.reverted_count += 1,
            Err(e) => {
                warn!("cannot revert {}: {}", record.new_path.display(), e);
                report.failed_reverts.push(FailedRevert {
                    file: record.new_name.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        "reverted operation {}: {}/{} files",
        report.operation_id, report.reverted_count, report.total_to_revert
    );
    report
}

fn restore(record: &RenameRecord) -> Result<(), RevertFailure> {
    if !record.new_path.exists() {
        return Err(RevertFailure::RenamedFileMissing);
    }
    if record.original_path.exists() {
        return Err(RevertFailure::OriginalOccupied);
    }
    fs::rename(&record.new_path, &record.original_path)?;
    Ok(())
}
