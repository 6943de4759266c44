//! docrenamer - rename office documents after their own content
//!
//! This library scans a directory for Word, Excel, PowerPoint, PDF and CSV
//! files, extracts a title from each one, and renames the files to
//! `<title>_<timestamp>.<ext>` in two phases: a preview that touches nothing
//! and an execute step that performs the renames and records them in a
//! per-directory history so that any operation can be reverted.

pub mod cli;
pub mod config;
pub mod conflict;
pub mod engine;
pub mod error;
pub mod executor;
pub mod file_kind;
pub mod history;
pub mod logging;
pub mod naming;
pub mod output;
pub mod planner;
pub mod readers;
pub mod revert;
pub mod scanner;

pub use config::{CompiledFilters, ConfigError, RenamerConfig};
pub use engine::RenameEngine;
pub use error::{RenameError, RenameResult};
pub use executor::ExecuteOutcome;
pub use file_kind::FileKind;
pub use history::{History, OperationRecord};
pub use planner::{PlanOutcome, RenamePlanEntry};
pub use readers::{ContentReader, ExtractionResult, ReaderRegistry};
pub use revert::RevertReport;
pub use scanner::ScanReport;

pub use cli::{Cli, RenameCommand, run};
