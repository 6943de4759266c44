//! Directory scanning.
//!
//! Walks the managed directory and groups the files that pass the configured
//! filters by [`FileKind`]. The planner consumes the grouped paths; it never
//! walks the tree itself.

use crate::config::CompiledFilters;
use crate::error::{RenameError, RenameResult, ensure_directory};
use crate::file_kind::{FileKind, KindMapper};
use crate::history::HISTORY_FILE_NAME;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Files of one kind found by a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KindGroup {
    /// Sorted paths.
    pub files: Vec<PathBuf>,
    /// Lowercase extensions seen, without the dot.
    pub extensions: BTreeSet<String>,
}

/// Result of scanning a directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub base_dir: PathBuf,
    pub groups: BTreeMap<FileKind, KindGroup>,
    /// Files that passed the filters.
    pub total_files: usize,
    /// Files with a known kind.
    pub supported_files: usize,
    /// Files that passed the filters but have no reader.
    pub unsupported_files: usize,
}

impl ScanReport {
    /// Files of the given kinds, in kind order and then path order.
    pub fn files_for(&self, kinds: &[FileKind]) -> Vec<PathBuf> {
        self.groups
            .iter()
            .filter(|(kind, _)| kinds.contains(kind))
            .flat_map(|(_, group)| group.files.iter().cloned())
            .collect()
    }

    /// Number of files found for `kind`.
    pub fn count(&self, kind: FileKind) -> usize {
        self.groups.get(&kind).map_or(0, |group| group.files.len())
    }

    /// True when no supported file was found.
    pub fn is_empty(&self) -> bool {
        self.supported_files == 0
    }
}

/// Scans `dir` for supported documents.
///
/// With `recursive` set, subdirectories are walked too. Entries below the
/// root that cannot be read are skipped with a warning.
///
/// # Errors
///
/// Fails when `dir` is missing, is not a directory, or cannot be listed.
pub fn scan_directory(
    dir: &Path,
    filters: &CompiledFilters,
    recursive: bool,
) -> RenameResult<ScanReport> {
    ensure_directory(dir)?;
    fs::read_dir(dir).map_err(|source| RenameError::DirectoryUnreadable {
        path: dir.to_path_buf(),
        source,
    })?;

    let mapper = KindMapper::default();
    let mut report = ScanReport {
        base_dir: dir.to_path_buf(),
        ..Default::default()
    };

    let walker = WalkDir::new(dir).min_depth(1).follow_links(false);
    let walker = if recursive { walker } else { walker.max_depth(1) };

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() || entry.file_name() == HISTORY_FILE_NAME {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(dir).unwrap_or(path);
        if !filters.should_include(relative) {
            debug!("filtered out {}", relative.display());
            continue;
        }

        report.total_files += 1;
        let kind = mapper.classify(path);
        if kind == FileKind::Unknown {
            report.unsupported_files += 1;
            continue;
        }

        report.supported_files += 1;
        let group = report.groups.entry(kind).or_default();
        group.files.push(path.to_path_buf());
        if let Some(ext) = path.extension() {
            group.extensions.insert(ext.to_string_lossy().to_lowercase());
        }
    }

    for group in report.groups.values_mut() {
        group.files.sort();
    }

    debug!(
        "scanned {}: {} files, {} supported",
        dir.display(),
        report.total_files,
        report.supported_files
    );
    Ok(report)
}
