//! Rename planning.
//!
//! The planner turns a list of files into one [`RenamePlanEntry`] per
//! selected file: either a ready rename with a free target path, or the
//! reason the file cannot be renamed. Nothing on disk is changed here; the
//! only filesystem access is reading documents and checking whether target
//! names are taken.

use crate::conflict;
use crate::file_kind::{FileKind, KindMapper};
use crate::naming;
use crate::readers::ReaderRegistry;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Characters of content preview kept in a plan entry.
pub const DISPLAY_PREVIEW_CHARS: usize = 100;

/// The planned outcome for one file.
///
/// Serializes as a flat JSON object tagged with `"status": "ready"` or
/// `"status": "error"`, so a saved plan can be applied later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenamePlanEntry {
    pub original_path: PathBuf,
    pub original_name: String,
    #[serde(flatten)]
    pub outcome: PlanOutcome,
}

/// Ready-only or error-only fields of a plan entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PlanOutcome {
    Ready {
        new_name: String,
        new_path: PathBuf,
        title_extracted: String,
        content_preview: String,
    },
    Error {
        error: String,
    },
}

impl RenamePlanEntry {
    /// An entry that cannot be renamed.
    pub fn failed(original_path: &Path, error: impl Into<String>) -> Self {
        Self {
            original_path: original_path.to_path_buf(),
            original_name: display_name(original_path),
            outcome: PlanOutcome::Error {
                error: error.into(),
            },
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.outcome, PlanOutcome::Ready { .. })
    }

    /// Target path of a ready entry.
    pub fn new_path(&self) -> Option<&Path> {
        match &self.outcome {
            PlanOutcome::Ready { new_path, .. } => Some(new_path),
            PlanOutcome::Error { .. } => None,
        }
    }

    /// Reason of an error entry.
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            PlanOutcome::Ready { .. } => None,
            PlanOutcome::Error { error } => Some(error),
        }
    }
}

/// Builds rename plans using a set of content readers.
pub struct PreviewPlanner<'a> {
    readers: &'a ReaderRegistry,
    mapper: KindMapper,
}

impl<'a> PreviewPlanner<'a> {
    pub fn new(readers: &'a ReaderRegistry) -> Self {
        Self {
            readers,
            mapper: KindMapper::default(),
        }
    }

    /// Plans renames for `files`, keeping only kinds listed in `selected`.
    pub fn plan(&self, files: &[PathBuf], selected: &[FileKind]) -> Vec<RenamePlanEntry> {
        self.plan_with(files, selected, Local::now(), |_| {})
    }

    /// Plans renames with an explicit batch time and a per-file callback.
    ///
    /// Every name in the batch carries the timestamp derived from `now`.
    /// `on_file` is called once for every input path, including the ones
    /// that are skipped because their kind is not selected. Entries come
    /// back in input order.
    pub fn plan_with<F>(
        &self,
        files: &[PathBuf],
        selected: &[FileKind],
        now: DateTime<Local>,
        mut on_file: F,
    ) -> Vec<RenamePlanEntry>
    where
        F: FnMut(&Path),
    {
        let timestamp = naming::batch_timestamp(now);
        let mut claimed: HashSet<PathBuf> = HashSet::new();
        let mut plan = Vec::new();

        for path in files {
            on_file(path);

            let kind = self.mapper.classify(path);
            if !selected.contains(&kind) {
                continue;
            }

            let entry = self.plan_file(path, kind, &timestamp, &mut claimed);
            match entry.error() {
                Some(error) => debug!("{}: {}", path.display(), error),
                None => debug!(
                    "{} -> {}",
                    path.display(),
                    entry.new_path().map(|p| p.display().to_string()).unwrap_or_default()
                ),
            }
            plan.push(entry);
        }

        plan
    }

    fn plan_file(
        &self,
        path: &Path,
        kind: FileKind,
        timestamp: &str,
        claimed: &mut HashSet<PathBuf>,
    ) -> RenamePlanEntry {
        let Some(original_name) = path.file_name().map(|n| n.to_string_lossy().into_owned())
        else {
            return RenamePlanEntry::failed(path, "path has no file name");
        };

        let Some(reader) = self.readers.get(kind) else {
            return RenamePlanEntry::failed(path, format!("reader unavailable for type {}", kind));
        };

        let extraction = reader.extract(path);
        if !extraction.success {
            return RenamePlanEntry::failed(path, extraction.error);
        }

        let candidate = naming::synthesize(&extraction.title, path, timestamp);
        let parent = path.parent().unwrap_or_else(|| Path::new(""));
        let new_path = conflict::resolve_with(&parent.join(candidate), |target| {
            claimed.contains(target) || target.exists()
        });
        claimed.insert(new_path.clone());

        let new_name = display_name(&new_path);
        RenamePlanEntry {
            original_path: path.to_path_buf(),
            original_name,
            outcome: PlanOutcome::Ready {
                new_name,
                new_path,
                title_extracted: extraction.title,
                content_preview: naming::truncate_for_display(
                    &extraction.content_preview,
                    DISPLAY_PREVIEW_CHARS,
                ),
            },
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
