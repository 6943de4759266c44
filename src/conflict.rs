//! Collision avoidance for target paths.
//!
//! A taken name `Title_2024-01-01_10h00.docx` is retried as
//! `Title_2024-01-01_10h00_001.docx`, `_002`, ... up to `_999`. Past that the
//! counter is replaced by a sub-second timestamp which is returned without a
//! further existence check.
//!
//! This is check-then-use: nothing stops another process from creating the
//! returned path before it is used. The executor re-checks right before
//! renaming.

use chrono::Local;
use std::path::{Path, PathBuf};

/// Highest numeric suffix tried before falling back to a timestamp.
pub const MAX_COUNTER: u32 = 999;

/// Width of the fallback suffix (`YYYYMMDD_HHMMSS_` plus one fractional digit).
const PRECISE_SUFFIX_WIDTH: usize = 17;

/// Returns `target` if it is free on disk, otherwise the first free variant.
pub fn resolve(target: &Path) -> PathBuf {
    resolve_with(target, |candidate| candidate.exists())
}

/// Same as [`resolve`] with a caller-supplied notion of "taken".
///
/// # Examples
///
/// ```
/// use docrenamer::conflict::resolve_with;
/// use std::path::{Path, PathBuf};
///
/// let taken = [PathBuf::from("out/a.txt"), PathBuf::from("out/a_001.txt")];
/// let free = resolve_with(Path::new("out/a.txt"), |p| taken.iter().any(|t| t == p));
/// assert_eq!(free, PathBuf::from("out/a_002.txt"));
/// ```
pub fn resolve_with<F>(target: &Path, mut exists: F) -> PathBuf
where
    F: FnMut(&Path) -> bool,
{
    if !exists(target) {
        return target.to_path_buf();
    }

    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = crate::naming::extension_of(target);
    let parent = target.parent().unwrap_or_else(|| Path::new(""));

    for counter in 1..=MAX_COUNTER {
        let candidate = parent.join(format!("{}_{:03}{}", stem, counter, extension));
        if !exists(&candidate) {
            return candidate;
        }
    }

    parent.join(format!("{}_{}{}", stem, precise_suffix(), extension))
}

fn precise_suffix() -> String {
    let full = Local::now().format("%Y%m%d_%H%M%S_%6f").to_string();
    full.chars().take(PRECISE_SUFFIX_WIDTH).collect()
}
