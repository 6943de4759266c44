//! Persistent rename history.
//!
//! Every executed batch becomes an [`OperationRecord`] appended to the
//! history of the managed directory, stored as pretty-printed JSON in
//! `.rename_history.json` inside that directory. Records are never removed
//! or changed, including after a revert.
//!
//! Loading is forgiving: a missing, unreadable or corrupt file yields an
//! empty history, so a broken log never blocks renaming.

use crate::error::{RenameError, RenameResult};
use chrono::{DateTime, Duration, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name of the history log inside the managed directory.
pub const HISTORY_FILE_NAME: &str = ".rename_history.json";

/// Operation ids are local timestamps with microsecond precision.
pub const OPERATION_ID_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// One file that was renamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameRecord {
    pub original_path: PathBuf,
    pub new_path: PathBuf,
    pub original_name: String,
    pub new_name: String,
    /// When the rename happened (not when it was planned).
    pub timestamp: DateTime<Local>,
}

/// One file that could not be renamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedRename {
    pub file: String,
    pub error: String,
}

/// The outcome of one execute call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub operation_id: String,
    pub timestamp: DateTime<Local>,
    pub successful_renames: Vec<RenameRecord>,
    pub failed_renames: Vec<FailedRename>,
    pub total_files: usize,
    pub successful_count: usize,
    pub failed_count: usize,
}

impl OperationRecord {
    /// Builds a record, deriving the counts from the two lists.
    pub fn new(
        operation_id: String,
        timestamp: DateTime<Local>,
        successful_renames: Vec<RenameRecord>,
        failed_renames: Vec<FailedRename>,
    ) -> Self {
        let successful_count = successful_renames.len();
        let failed_count = failed_renames.len();
        Self {
            operation_id,
            timestamp,
            successful_renames,
            failed_renames,
            total_files: successful_count + failed_count,
            successful_count,
            failed_count,
        }
    }

    /// Whether the stored counts agree with the stored lists.
    pub fn counts_are_consistent(&self) -> bool {
        self.successful_count == self.successful_renames.len()
            && self.failed_count == self.failed_renames.len()
            && self.total_files == self.successful_count + self.failed_count
    }
}

/// All operations recorded for one directory, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    pub operations: Vec<OperationRecord>,
    pub created_at: DateTime<Local>,
    pub last_operation: Option<String>,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self {
            operations: Vec::new(),
            created_at: Local::now(),
            last_operation: None,
        }
    }

    /// Returns the path of the history file for `base_dir`.
    pub fn file_path(base_dir: &Path) -> PathBuf {
        base_dir.join(HISTORY_FILE_NAME)
    }

    /// Loads the history of `base_dir`.
    ///
    /// Never fails: anything other than a readable, well-formed file gives
    /// an empty history.
    pub fn load(base_dir: &Path) -> Self {
        let path = Self::file_path(base_dir);
        if !path.exists() {
            return Self::new();
        }

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!("cannot read history {}: {}; starting fresh", path.display(), e);
                return Self::new();
            }
        };

        match serde_json::from_str::<History>(&content) {
            Ok(history) => {
                debug!(
                    "loaded {} operations from {}",
                    history.operations.len(),
                    path.display()
                );
                history
            }
            Err(e) => {
                warn!("corrupt history {}: {}; starting fresh", path.display(), e);
                Self::new()
            }
        }
    }

    /// Writes the history of `base_dir`, replacing the file.
    pub fn save(&self, base_dir: &Path) -> RenameResult<()> {
        let path = Self::file_path(base_dir);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json).map_err(|source| RenameError::HistoryWrite { path, source })
    }

    /// Appends `record` and saves.
    ///
    /// The in-memory history is updated even if saving fails.
    pub fn append(&mut self, record: OperationRecord, base_dir: &Path) -> RenameResult<()> {
        self.last_operation = Some(record.operation_id.clone());
        self.operations.push(record);
        self.save(base_dir)
    }

    /// Generates an id for an operation created at `now`.
    ///
    /// Ids sort in creation order: if `now` does not format after the most
    /// recent id, the new id is that id plus one microsecond.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{Local, TimeZone};
    /// use docrenamer::history::History;
    ///
    /// let history = History::new();
    /// let now = Local.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
    /// assert_eq!(history.next_operation_id(now), "2024-01-01T10:00:00.000000");
    /// ```
    pub fn next_operation_id(&self, now: DateTime<Local>) -> String {
        let fresh = now.format(OPERATION_ID_FORMAT).to_string();
        let Some(last) = self.operations.last().map(|op| op.operation_id.as_str()) else {
            return fresh;
        };
        if fresh.as_str() > last {
            return fresh;
        }

        match NaiveDateTime::parse_from_str(last, OPERATION_ID_FORMAT) {
            Ok(parsed) => (parsed + Duration::microseconds(1))
                .format(OPERATION_ID_FORMAT)
                .to_string(),
            // not one of ours; appending keeps it sorting after `last`
            Err(_) => format!("{}.1", last),
        }
    }

    /// Looks up an operation by id.
    pub fn find(&self, operation_id: &str) -> Option<&OperationRecord> {
        self.operations
            .iter()
            .find(|op| op.operation_id == operation_id)
    }

    /// The most recently recorded operation.
    pub fn last(&self) -> Option<&OperationRecord> {
        self.operations.last()
    }

    /// Up to `limit` operations, most recent first.
    pub fn recent(&self, limit: usize) -> Vec<&OperationRecord> {
        self.operations.iter().rev().take(limit).collect()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
