//! Content sources.
//!
//! A reader turns one document into an [`ExtractionResult`]: a title to name
//! the file after and a short preview of the content. Readers are selected
//! per [`FileKind`] through a [`ReaderRegistry`]; the planner only ever sees
//! the result value, never how it was produced.

mod delimited;
mod excel;
mod ooxml;
mod pdf;
mod powerpoint;
mod word;

pub use delimited::CsvReader;
pub use excel::ExcelReader;
pub use pdf::PdfReader;
pub use powerpoint::PowerPointReader;
pub use word::WordReader;

use crate::file_kind::FileKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Upper bound on `content_preview`, in characters.
pub const MAX_PREVIEW_CHARS: usize = 1000;

/// What a reader found in a file.
///
/// `error` is non-empty exactly when `success` is false; use the
/// constructors to keep it that way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub title: String,
    pub content_preview: String,
    pub success: bool,
    pub error: String,
}

impl ExtractionResult {
    /// A successful extraction. The preview is capped at [`MAX_PREVIEW_CHARS`].
    pub fn extracted(title: impl Into<String>, content_preview: &str) -> Self {
        Self {
            title: title.into(),
            content_preview: content_preview.chars().take(MAX_PREVIEW_CHARS).collect(),
            success: true,
            error: String::new(),
        }
    }

    /// A failed extraction.
    pub fn failed(error: impl Into<String>) -> Self {
        let mut error = error.into();
        if error.is_empty() {
            error = "unknown extraction error".to_string();
        }
        Self {
            title: String::new(),
            content_preview: String::new(),
            success: false,
            error,
        }
    }

    fn from_read(kind: FileKind, result: Result<Extracted, ReadError>) -> Self {
        match result {
            Ok(extracted) => Self::extracted(extracted.title, &extracted.preview),
            Err(e) => Self::failed(format!("error reading {} file: {}", kind, e)),
        }
    }
}

/// Intermediate output of the built-in readers.
#[derive(Debug)]
struct Extracted {
    title: String,
    preview: String,
}

/// Why a built-in reader could not extract anything.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("not an Office Open XML package (legacy binary formats are not supported)")]
    NotOoxml,

    #[error("not a PDF file")]
    NotPdf,

    #[error("malformed package: {0}")]
    Package(#[from] zip::result::ZipError),

    #[error("package part '{0}' is missing")]
    MissingPart(&'static str),

    #[error("{0}")]
    Csv(#[from] csv::Error),

    #[error("file has no header row")]
    NoHeader,

    #[error("could not extract text from PDF")]
    NoText,
}

/// The capability every content source provides.
///
/// Implementations report failures inside the result instead of panicking.
/// Any `Fn(&Path) -> ExtractionResult` is a reader too, which is handy for
/// plugging in external extractors.
pub trait ContentReader {
    fn extract(&self, path: &Path) -> ExtractionResult;
}

impl<F> ContentReader for F
where
    F: Fn(&Path) -> ExtractionResult,
{
    fn extract(&self, path: &Path) -> ExtractionResult {
        self(path)
    }
}

/// Maps each file kind to the reader responsible for it.
#[derive(Default)]
pub struct ReaderRegistry {
    readers: HashMap<FileKind, Box<dyn ContentReader>>,
}

impl ReaderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in reader for every supported kind.
    pub fn with_default_readers() -> Self {
        let mut registry = Self::new();
        registry.register(FileKind::Word, WordReader);
        registry.register(FileKind::Excel, ExcelReader);
        registry.register(FileKind::PowerPoint, PowerPointReader);
        registry.register(FileKind::Pdf, PdfReader);
        registry.register(FileKind::Csv, CsvReader);
        registry
    }

    /// Installs `reader` for `kind`, replacing any previous one.
    pub fn register(&mut self, kind: FileKind, reader: impl ContentReader + 'static) {
        self.readers.insert(kind, Box::new(reader));
    }

    /// Removes the reader for `kind`.
    pub fn remove(&mut self, kind: FileKind) -> Option<Box<dyn ContentReader>> {
        self.readers.remove(&kind)
    }

    /// Returns the reader for `kind`, if one is installed.
    pub fn get(&self, kind: FileKind) -> Option<&dyn ContentReader> {
        self.readers.get(&kind).map(|reader| reader.as_ref())
    }

    /// Kinds that currently have a reader, sorted.
    pub fn kinds(&self) -> Vec<FileKind> {
        let mut kinds: Vec<_> = self.readers.keys().copied().collect();
        kinds.sort();
        kinds
    }
}

impl std::fmt::Debug for ReaderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
