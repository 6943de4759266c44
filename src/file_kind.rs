//! File kinds the renamer knows how to read.
//!
//! This module maps file extensions to the document kinds that have a
//! content reader (Word, Excel, PowerPoint, PDF, CSV). Classification is by
//! extension only; the readers sniff the actual bytes later.
//!
//! # Examples
//!
//! ```
//! use docrenamer::file_kind::{FileKind, KindMapper};
//! use std::path::Path;
//!
//! let mapper = KindMapper::default();
//! assert_eq!(mapper.classify(Path::new("report.DOCX")), FileKind::Word);
//! assert_eq!(mapper.classify(Path::new("budget.xls")), FileKind::Excel);
//! assert_eq!(mapper.classify(Path::new("notes.txt")), FileKind::Unknown);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Represents a document kind.
///
/// The lowercase label (`word`, `excel`, ...) is what users type on the
/// command line, what the configuration file stores, and what error
/// messages show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Word documents (DOC, DOCX)
    Word,
    /// Excel workbooks (XLS, XLSX)
    Excel,
    /// PowerPoint presentations (PPT, PPTX)
    PowerPoint,
    /// PDF documents
    Pdf,
    /// Comma-separated values
    Csv,
    /// Anything else
    Unknown,
}

impl FileKind {
    /// Every kind that has a content reader, in display order.
    pub const SUPPORTED: [FileKind; 5] = [
        FileKind::Word,
        FileKind::Excel,
        FileKind::PowerPoint,
        FileKind::Pdf,
        FileKind::Csv,
    ];

    /// Returns the lowercase label for this kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use docrenamer::file_kind::FileKind;
    ///
    /// assert_eq!(FileKind::PowerPoint.label(), "powerpoint");
    /// assert_eq!(FileKind::Unknown.label(), "unknown");
    /// ```
    pub fn label(&self) -> &'static str {
        match self {
            FileKind::Word => "word",
            FileKind::Excel => "excel",
            FileKind::PowerPoint => "powerpoint",
            FileKind::Pdf => "pdf",
            FileKind::Csv => "csv",
            FileKind::Unknown => "unknown",
        }
    }

    /// Returns a human-readable description of this kind.
    pub fn friendly_name(&self) -> &'static str {
        match self {
            FileKind::Word => "Word documents",
            FileKind::Excel => "Excel workbooks",
            FileKind::PowerPoint => "PowerPoint presentations",
            FileKind::Pdf => "PDF documents",
            FileKind::Csv => "CSV files",
            FileKind::Unknown => "Other files",
        }
    }

    /// Returns the icon shown next to this kind in tables.
    pub fn icon(&self) -> &'static str {
        match self {
            FileKind::Word => "📄",
            FileKind::Excel => "📊",
            FileKind::PowerPoint => "📽",
            FileKind::Pdf => "📕",
            FileKind::Csv => "📈",
            FileKind::Unknown => "❔",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a label does not name a kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown file type '{0}' (expected one of: word, excel, powerpoint, pdf, csv)")]
pub struct ParseKindError(pub String);

impl FromStr for FileKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "word" => Ok(FileKind::Word),
            "excel" => Ok(FileKind::Excel),
            "powerpoint" => Ok(FileKind::PowerPoint),
            "pdf" => Ok(FileKind::Pdf),
            "csv" => Ok(FileKind::Csv),
            "unknown" => Ok(FileKind::Unknown),
            _ => Err(ParseKindError(s.to_string())),
        }
    }
}

/// Maps file extensions to kinds.
///
/// Lookups are case-insensitive; extensions are stored without the dot.
#[derive(Debug, Clone)]
pub struct KindMapper {
    extension_map: HashMap<String, FileKind>,
}

impl KindMapper {
    /// Creates a new `KindMapper` with the standard extension table.
    pub fn new() -> Self {
        let mut mapper = Self {
            extension_map: HashMap::new(),
        };
        mapper.populate_standard_mappings();
        mapper
    }

    fn populate_standard_mappings(&mut self) {
        self.add_extension_mapping("doc", FileKind::Word);
        self.add_extension_mapping("docx", FileKind::Word);
        self.add_extension_mapping("xls", FileKind::Excel);
        self.add_extension_mapping("xlsx", FileKind::Excel);
        self.add_extension_mapping("ppt", FileKind::PowerPoint);
        self.add_extension_mapping("pptx", FileKind::PowerPoint);
        self.add_extension_mapping("pdf", FileKind::Pdf);
        self.add_extension_mapping("csv", FileKind::Csv);
    }

    /// Adds a file extension to kind mapping. A leading dot is ignored.
    pub fn add_extension_mapping(&mut self, ext: &str, kind: FileKind) {
        let ext = ext.trim_start_matches('.');
        self.extension_map.insert(ext.to_lowercase(), kind);
    }

    /// Maps a file extension (with or without the dot) to a kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use docrenamer::file_kind::{FileKind, KindMapper};
    ///
    /// let mapper = KindMapper::default();
    /// assert_eq!(mapper.extension_to_kind(".PDF"), Some(FileKind::Pdf));
    /// assert_eq!(mapper.extension_to_kind("png"), None);
    /// ```
    pub fn extension_to_kind(&self, ext: &str) -> Option<FileKind> {
        let ext = ext.trim_start_matches('.');
        self.extension_map.get(&ext.to_lowercase()).copied()
    }

    /// Classifies a path by its extension, `FileKind::Unknown` if unmapped.
    pub fn classify(&self, path: &Path) -> FileKind {
        path.extension()
            .and_then(|ext| self.extension_to_kind(&ext.to_string_lossy()))
            .unwrap_or(FileKind::Unknown)
    }
}

impl Default for KindMapper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_extension_table() {
        let mapper = KindMapper::default();
        assert_eq!(mapper.extension_to_kind("doc"), Some(FileKind::Word));
        assert_eq!(mapper.extension_to_kind("docx"), Some(FileKind::Word));
        assert_eq!(mapper.extension_to_kind("xls"), Some(FileKind::Excel));
        assert_eq!(mapper.extension_to_kind("xlsx"), Some(FileKind::Excel));
        assert_eq!(mapper.extension_to_kind("ppt"), Some(FileKind::PowerPoint));
        assert_eq!(mapper.extension_to_kind("pptx"), Some(FileKind::PowerPoint));
        assert_eq!(mapper.extension_to_kind("pdf"), Some(FileKind::Pdf));
        assert_eq!(mapper.extension_to_kind("csv"), Some(FileKind::Csv));
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        let mapper = KindMapper::default();
        assert_eq!(mapper.classify(Path::new("A.DocX")), FileKind::Word);
        assert_eq!(mapper.classify(Path::new("dir/b.CSV")), FileKind::Csv);
    }

    #[test]
    fn test_classify_unknown() {
        let mapper = KindMapper::default();
        assert_eq!(mapper.classify(Path::new("notes.txt")), FileKind::Unknown);
        assert_eq!(mapper.classify(Path::new("Makefile")), FileKind::Unknown);
        assert_eq!(mapper.classify(Path::new(".docx")), FileKind::Unknown);
    }

    #[test]
    fn test_custom_mapping() {
        let mut mapper = KindMapper::default();
        mapper.add_extension_mapping(".tsv", FileKind::Csv);
        assert_eq!(mapper.classify(Path::new("data.tsv")), FileKind::Csv);
    }

    #[test]
    fn test_label_round_trip() {
        for kind in FileKind::SUPPORTED {
            assert_eq!(kind.label().parse::<FileKind>(), Ok(kind));
        }
        assert_eq!("PowerPoint".parse::<FileKind>(), Ok(FileKind::PowerPoint));
        assert!("image".parse::<FileKind>().is_err());
    }

    #[test]
    fn test_serde_uses_labels() {
        let json = serde_json::to_string(&FileKind::PowerPoint).unwrap();
        assert_eq!(json, "\"powerpoint\"");
        let kind: FileKind = serde_json::from_str("\"excel\"").unwrap();
        assert_eq!(kind, FileKind::Excel);
    }
}
