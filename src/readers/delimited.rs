use super::{ContentReader, Extracted, ExtractionResult, ReadError};
use crate::file_kind::FileKind;
use encoding_rs::{UTF_8, WINDOWS_1252};
use std::fs;
use std::path::Path;

/// Title used when the header row yields no text.
pub const FALLBACK_TITLE: &str = "dados_csv";

const TITLE_COLUMNS: usize = 3;
const PREVIEW_ROWS: usize = 5;

/// Reads comma-separated files.
///
/// The first three column headers joined by `_` are the title; the preview
/// shows the header and the first five records. Files that are not valid
/// UTF-8 are read as Windows-1252, which covers Latin-1 text too.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvReader;

impl CsvReader {
    fn read(&self, path: &Path) -> Result<Extracted, ReadError> {
        let text = decode(&fs::read(path)?);
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        if headers.iter().all(String::is_empty) {
            return Err(ReadError::NoHeader);
        }

        let title = headers
            .iter()
            .take(TITLE_COLUMNS)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("_");
        let title = if title.trim_matches('_').is_empty() {
            FALLBACK_TITLE.to_string()
        } else {
            title
        };

        let mut lines = vec![headers.join(" | ")];
        for record in reader.records().take(PREVIEW_ROWS) {
            let record = record?;
            lines.push(record.iter().map(str::trim).collect::<Vec<_>>().join(" | "));
        }

        Ok(Extracted {
            title,
            preview: lines.join("\n"),
        })
    }
}

impl ContentReader for CsvReader {
    fn extract(&self, path: &Path) -> ExtractionResult {
        ExtractionResult::from_read(FileKind::Csv, self.read(path))
    }
}

/// UTF-8 (a byte order mark is honored and dropped), else Windows-1252.
fn decode(bytes: &[u8]) -> String {
    let (text, _, had_errors) = UTF_8.decode(bytes);
    if !had_errors {
        return text.into_owned();
    }
    WINDOWS_1252.decode_without_bom_handling(bytes).0.into_owned()
}
