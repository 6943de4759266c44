//! The rename engine for one directory.
//!
//! [`RenameEngine`] ties the pieces together: it owns the history of its
//! base directory and the content readers, and exposes the
//! scan / preview / execute / revert cycle. It holds no state between a
//! preview and an execute; the caller passes the plan back in.
//!
//! # Examples
//!
//! ```no_run
//! use docrenamer::config::CompiledFilters;
//! use docrenamer::engine::RenameEngine;
//! use docrenamer::file_kind::FileKind;
//!
//! # fn main() -> Result<(), docrenamer::error::RenameError> {
//! let mut engine = RenameEngine::open("/path/to/documents")?;
//! let scan = engine.scan(&CompiledFilters::default(), true)?;
//! let files = scan.files_for(&FileKind::SUPPORTED);
//!
//! let plan = engine.preview(&files, &FileKind::SUPPORTED)?;
//! let outcome = engine.execute(&plan)?;
//! println!("operation {}", outcome.operation.operation_id);
//!
//! engine.revert(&outcome.operation.operation_id)?;
//! # Ok(())
//! # }
//! ```

use crate::config::CompiledFilters;
use crate::error::{RenameError, RenameResult, ensure_directory};
use crate::executor::{self, ExecuteOutcome};
use crate::file_kind::FileKind;
use crate::history::History;
use crate::planner::{PreviewPlanner, RenamePlanEntry};
use crate::readers::ReaderRegistry;
use crate::revert::{self, RevertReport};
use crate::scanner::{self, ScanReport};
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Renames documents in one base directory and keeps its history.
#[derive(Debug)]
pub struct RenameEngine {
    base_dir: PathBuf,
    history: History,
    readers: ReaderRegistry,
}

impl RenameEngine {
    /// Opens `base_dir` with the built-in readers and loads its history.
    ///
    /// # Errors
    ///
    /// Fails if `base_dir` does not exist or is not a directory.
    pub fn open(base_dir: impl Into<PathBuf>) -> RenameResult<Self> {
        let base_dir = base_dir.into();
        ensure_directory(&base_dir)?;
        let history = History::load(&base_dir);
        Ok(Self {
            base_dir,
            history,
            readers: ReaderRegistry::with_default_readers(),
        })
    }

    /// Replaces the content readers.
    pub fn with_readers(mut self, readers: ReaderRegistry) -> Self {
        self.readers = readers;
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn readers(&self) -> &ReaderRegistry {
        &self.readers
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Scans the base directory.
    pub fn scan(&self, filters: &CompiledFilters, recursive: bool) -> RenameResult<ScanReport> {
        scanner::scan_directory(&self.base_dir, filters, recursive)
    }

    /// Plans renames for `files`; see [`PreviewPlanner::plan_with`].
    pub fn preview(
        &self,
        files: &[PathBuf],
        selected: &[FileKind],
    ) -> RenameResult<Vec<RenamePlanEntry>> {
        self.preview_with(files, selected, |_| {})
    }

    /// Like [`preview`](Self::preview), calling `on_file` for every path.
    pub fn preview_with<F>(
        &self,
        files: &[PathBuf],
        selected: &[FileKind],
        on_file: F,
    ) -> RenameResult<Vec<RenamePlanEntry>>
    where
        F: FnMut(&Path),
    {
        ensure_directory(&self.base_dir)?;
        let planner = PreviewPlanner::new(&self.readers);
        Ok(planner.plan_with(files, selected, Local::now(), on_file))
    }

    /// Executes `plan` and records it in the history.
    pub fn execute(&mut self, plan: &[RenamePlanEntry]) -> RenameResult<ExecuteOutcome> {
        self.execute_with(plan, |_| {})
    }

    /// Like [`execute`](Self::execute), calling `on_entry` for every entry.
    pub fn execute_with<F>(
        &mut self,
        plan: &[RenamePlanEntry],
        on_entry: F,
    ) -> RenameResult<ExecuteOutcome>
    where
        F: FnMut(&RenamePlanEntry),
    {
        ensure_directory(&self.base_dir)?;
        Ok(executor::execute_plan(
            plan,
            &mut self.history,
            &self.base_dir,
            on_entry,
        ))
    }

    /// Reverts the operation with `operation_id`.
    ///
    /// The history is written back afterwards; a failed write is only
    /// logged.
    pub fn revert(&mut self, operation_id: &str) -> RenameResult<RevertReport> {
        let report = revert::revert_operation(&self.history, operation_id)?;
        if let Err(e) = self.history.save(&self.base_dir) {
            warn!("{}", e);
        }
        Ok(report)
    }

    /// Reverts the most recent operation.
    pub fn revert_last(&mut self) -> RenameResult<RevertReport> {
        let id = self
            .history
            .last()
            .map(|op| op.operation_id.clone())
            .ok_or(RenameError::EmptyHistory)?;
        self.revert(&id)
    }
}
