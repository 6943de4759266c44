use super::ooxml::{self, Package};
use super::{ContentReader, Extracted, ExtractionResult, ReadError};
use crate::file_kind::FileKind;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Title used when the first slide has no text.
pub const FALLBACK_TITLE: &str = "apresentacao";

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";
const DEFAULT_SLIDE_PART: &str = "ppt/slides/slide1.xml";

static SLIDE_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<p:sldId\s[^>]*>").unwrap());
static SHAPE: LazyLock<Regex> = LazyLock::new(|| ooxml::element_regex("p:sp"));
static PARAGRAPH: LazyLock<Regex> = LazyLock::new(|| ooxml::element_regex("a:p"));
static TEXT: LazyLock<Regex> = LazyLock::new(|| ooxml::element_regex("a:t"));

/// Reads `.pptx` presentations.
///
/// Only the first slide is looked at: the first shape with text is the
/// title, and all shape texts joined by spaces form the preview.
#[derive(Debug, Clone, Copy, Default)]
pub struct PowerPointReader;

impl PowerPointReader {
    fn read(&self, path: &Path) -> Result<Extracted, ReadError> {
        let mut package = Package::open(path)?;
        let slide_part = self.first_slide_part(&mut package)?;

        let texts = match package.part(&slide_part)? {
            Some(slide) => shape_texts(&slide),
            None => Vec::new(),
        };

        let title = texts
            .first()
            .cloned()
            .unwrap_or_else(|| FALLBACK_TITLE.to_string());
        Ok(Extracted {
            title,
            preview: texts.join(" "),
        })
    }

    fn first_slide_part(&self, package: &mut Package) -> Result<String, ReadError> {
        let presentation = package.required_part(PRESENTATION_PART)?;
        let first_id = SLIDE_ID
            .find(&presentation)
            .and_then(|m| ooxml::attribute(m.as_str(), "r:id"));

        let resolved = match first_id {
            Some(id) => package.relationship_target(PRESENTATION_RELS, "ppt/", &id)?,
            None => None,
        };
        Ok(resolved.unwrap_or_else(|| DEFAULT_SLIDE_PART.to_string()))
    }
}

impl ContentReader for PowerPointReader {
    fn extract(&self, path: &Path) -> ExtractionResult {
        ExtractionResult::from_read(FileKind::PowerPoint, self.read(path))
    }
}

/// Text of every shape on a slide, one entry per shape with text.
fn shape_texts(slide: &str) -> Vec<String> {
    ooxml::inner_xml(&SHAPE, slide)
        .map(|shape| {
            ooxml::inner_xml(&PARAGRAPH, shape)
                .map(|paragraph| ooxml::text_of(&TEXT, paragraph))
                .collect::<Vec<_>>()
                .join("\n")
                .trim()
                .to_string()
        })
        .filter(|text| !text.is_empty())
        .collect()
}
