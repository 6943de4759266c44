use super::ooxml::{self, Package};
use super::{ContentReader, Extracted, ExtractionResult, ReadError};
use crate::file_kind::FileKind;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Title used when a document has neither a core title nor any text.
pub const FALLBACK_TITLE: &str = "documento_word";

const PREVIEW_PARAGRAPHS: usize = 5;

static PARAGRAPH: LazyLock<Regex> = LazyLock::new(|| ooxml::element_regex("w:p"));
static TEXT_RUN: LazyLock<Regex> = LazyLock::new(|| ooxml::element_regex("w:t"));
static CORE_TITLE: LazyLock<Regex> = LazyLock::new(|| ooxml::element_regex("dc:title"));

/// Reads `.docx` documents.
///
/// The title is the `dc:title` core property, else the first paragraph with
/// text. The preview joins the first five non-empty paragraphs.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordReader;

impl WordReader {
    fn read(&self, path: &Path) -> Result<Extracted, ReadError> {
        let mut package = Package::open(path)?;

        let core_title = package
            .part("docProps/core.xml")?
            .map(|core| ooxml::text_of(&CORE_TITLE, &core).trim().to_string())
            .filter(|title| !title.is_empty());

        let document = package.required_part("word/document.xml")?;
        let paragraphs: Vec<String> = ooxml::inner_xml(&PARAGRAPH, &document)
            .map(|paragraph| ooxml::text_of(&TEXT_RUN, paragraph).trim().to_string())
            .filter(|text| !text.is_empty())
            .collect();

        let title = core_title
            .or_else(|| paragraphs.first().cloned())
            .unwrap_or_else(|| FALLBACK_TITLE.to_string());
        let preview = paragraphs
            .iter()
            .take(PREVIEW_PARAGRAPHS)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ");

        Ok(Extracted { title, preview })
    }
}

impl ContentReader for WordReader {
    fn extract(&self, path: &Path) -> ExtractionResult {
        ExtractionResult::from_read(FileKind::Word, self.read(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readers::ooxml::fixtures::write_package;
    use tempfile::TempDir;

    fn document_xml(paragraphs: &[&str]) -> String {
        let body: String = paragraphs
            .iter()
            .map(|p| format!(r#"<w:p w:rsidR="00A1"><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#, p))
            .collect();
        format!(
            r#"<?xml version="1.0"?><w:document xmlns:w="x"><w:body>{}<w:sectPr/></w:body></w:document>"#,
            body
        )
    }

    #[test]
    fn test_first_paragraph_becomes_title() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("a.docx");
        write_package(
            &path,
            &[(
                "word/document.xml",
                &document_xml(&["", "Contract Draft", "Between A &amp; B", "Signed"]),
            )],
        );

        let result = WordReader.extract(&path);
        assert!(result.success, "{}", result.error);
        assert_eq!(result.title, "Contract Draft");
        assert_eq!(result.content_preview, "Contract Draft Between A & B Signed");
    }

    #[test]
    fn test_core_title_wins() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("a.docx");
        write_package(
            &path,
            &[
                (
                    "docProps/core.xml",
                    r#"<cp:coreProperties><dc:title>Annual Report</dc:title></cp:coreProperties>"#,
                ),
                ("word/document.xml", &document_xml(&["Intro"])),
            ],
        );

        let result = WordReader.extract(&path);
        assert_eq!(result.title, "Annual Report");
        assert_eq!(result.content_preview, "Intro");
    }

    #[test]
    fn test_preview_is_limited_to_five_paragraphs() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("a.docx");
        write_package(
            &path,
            &[("word/document.xml", &document_xml(&["1", "2", "3", "4", "5", "6"]))],
        );

        assert_eq!(WordReader.extract(&path).content_preview, "1 2 3 4 5");
    }

    #[test]
    fn test_empty_document_uses_fallback_title() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("a.docx");
        write_package(&path, &[("word/document.xml", &document_xml(&[]))]);

        let result = WordReader.extract(&path);
        assert!(result.success);
        assert_eq!(result.title, FALLBACK_TITLE);
        assert!(result.content_preview.is_empty());
    }

    #[test]
    fn test_legacy_doc_fails_with_message() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("old.doc");
        std::fs::write(&path, b"\xD0\xCF\x11\xE0 binary").unwrap();

        let result = WordReader.extract(&path);
        assert!(!result.success);
        assert!(result.error.starts_with("error reading word file: not an Office Open XML package"));
    }

    #[test]
    fn test_package_without_document_part_fails() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("a.docx");
        write_package(&path, &[("other.xml", "<x/>")]);

        let result = WordReader.extract(&path);
        assert!(!result.success);
        assert!(result.error.contains("word/document.xml"));
    }
}
