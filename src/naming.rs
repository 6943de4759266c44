//! Content-derived file names.
//!
//! A new name has the shape `{stem}_{timestamp}{ext}`: the stem is the
//! extracted title squeezed into something every filesystem accepts, the
//! timestamp is shared by the whole batch, and the extension is copied
//! verbatim from the original file.

use chrono::{DateTime, Local};
use std::path::Path;

/// Stem used when the title is empty or sanitizes down to nothing.
pub const FALLBACK_STEM: &str = "arquivo";

/// Name used by [`safe_filename`] when nothing survives sanitization.
pub const UNNAMED: &str = "arquivo_sem_nome";

/// Maximum number of characters kept from a title.
pub const MAX_TITLE_CHARS: usize = 100;

/// Characters that are rejected by at least one common filesystem.
pub const FORBIDDEN_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Format of the batch timestamp, e.g. `2024-01-01_10h00`.
pub const BATCH_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%Hh%M";

/// Formats the timestamp shared by every name of one planning call.
///
/// # Examples
///
/// ```
/// use chrono::{Local, TimeZone};
/// use docrenamer::naming::batch_timestamp;
///
/// let now = Local.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
/// assert_eq!(batch_timestamp(now), "2024-01-01_10h00");
/// ```
pub fn batch_timestamp(now: DateTime<Local>) -> String {
    now.format(BATCH_TIMESTAMP_FORMAT).to_string()
}

/// Removes control characters and folds every whitespace run into one space.
///
/// Line breaks and tabs become spaces before the remaining control
/// characters are dropped, so words on separate lines stay separate.
pub fn normalize_text(text: &str) -> String {
    let spaced: String = text
        .chars()
        .map(|c| if matches!(c, '\n' | '\r' | '\t') { ' ' } else { c })
        .filter(|c| (*c as u32) >= 32)
        .collect();
    collapse_whitespace(&spaced)
}

/// Makes a display name safe to use as (part of) a file name.
///
/// Forbidden characters become `_`, whitespace is collapsed, names longer
/// than `max_chars` are cut at the last space that keeps them within the
/// limit (or hard-cut when there is no space), and trailing dots are
/// removed. Never returns an empty string.
///
/// # Examples
///
/// ```
/// use docrenamer::naming::safe_filename;
///
/// assert_eq!(safe_filename("Q1: Budget / Plan?", 100), "Q1_ Budget _ Plan_");
/// assert_eq!(safe_filename("final version...", 100), "final version");
/// assert_eq!(safe_filename("   ", 100), "arquivo_sem_nome");
/// ```
pub fn safe_filename(name: &str, max_chars: usize) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if FORBIDDEN_CHARS.contains(&c) { '_' } else { c })
        .collect();
    let mut safe = collapse_whitespace(&replaced);

    if safe.chars().count() > max_chars {
        // One extra char so a space right at the limit counts as a boundary.
        let window: String = safe.chars().take(max_chars + 1).collect();
        safe = match window.rfind(' ') {
            Some(cut) if cut > 0 => window[..cut].to_string(),
            _ => safe.chars().take(max_chars).collect(),
        };
    }

    let safe = safe.trim_end_matches('.');
    if safe.is_empty() {
        UNNAMED.to_string()
    } else {
        safe.to_string()
    }
}

/// Builds the new file name for a document.
///
/// Pure function of its inputs; always returns a non-empty name that
/// contains none of [`FORBIDDEN_CHARS`] and ends with the original
/// extension (case preserved, empty if the original has none).
///
/// # Examples
///
/// ```
/// use docrenamer::naming::synthesize;
/// use std::path::Path;
///
/// let name = synthesize("Contract Draft", Path::new("/tmp/a.docx"), "2024-01-01_10h00");
/// assert_eq!(name, "Contract_Draft_2024-01-01_10h00.docx");
///
/// let name = synthesize("", Path::new("scan.PDF"), "2024-01-01_10h00");
/// assert_eq!(name, "arquivo_2024-01-01_10h00.PDF");
/// ```
pub fn synthesize(title: &str, original_path: &Path, timestamp: &str) -> String {
    let title = if title.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        normalize_text(title)
    };
    let title = safe_filename(&title, MAX_TITLE_CHARS);

    let mut stem: String = title
        .replace(' ', "_")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if stem.is_empty() || stem == "_" {
        stem = FALLBACK_STEM.to_string();
    }

    format!("{}_{}{}", stem, timestamp, extension_of(original_path))
}

/// Returns the extension of `path` including the leading dot, or `""`.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// Shortens `text` to `max_chars` characters, appending `...` if it was cut.
pub fn truncate_for_display(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
