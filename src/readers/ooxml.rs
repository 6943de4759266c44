//! Minimal Office Open XML access shared by the Word, Excel and PowerPoint
//! readers: open the zip package, fetch parts, follow relationships and pull
//! text out of elements.

use super::ReadError;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;
use zip::ZipArchive;
use zip::result::ZipError;

static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#x[0-9A-Fa-f]+|#[0-9]+|[A-Za-z]+);").unwrap());

static RELATIONSHIP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<Relationship\s[^>]*>").unwrap());

/// An opened OOXML package.
pub(crate) struct Package {
    archive: ZipArchive<File>,
}

impl Package {
    /// Opens `path`, rejecting anything that is not a zip container.
    pub(crate) fn open(path: &Path) -> Result<Self, ReadError> {
        let mut head = Vec::with_capacity(8);
        File::open(path)?.take(8).read_to_end(&mut head)?;
        if !infer::archive::is_zip(&head) {
            return Err(ReadError::NotOoxml);
        }

        let archive = ZipArchive::new(File::open(path)?)?;
        Ok(Self { archive })
    }

    /// Reads a part as text, `None` if the package does not contain it.
    pub(crate) fn part(&mut self, name: &str) -> Result<Option<String>, ReadError> {
        match self.archive.by_name(name) {
            Ok(mut entry) => {
                let mut xml = String::new();
                entry.read_to_string(&mut xml)?;
                Ok(Some(xml))
            }
            Err(ZipError::FileNotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Reads a part that has to be present.
    pub(crate) fn required_part(&mut self, name: &'static str) -> Result<String, ReadError> {
        self.part(name)?.ok_or(ReadError::MissingPart(name))
    }

    /// Resolves relationship `id` in `rels_part` to a part name.
    ///
    /// Relative targets are resolved against `base_dir` (e.g. `xl/`).
    pub(crate) fn relationship_target(
        &mut self,
        rels_part: &str,
        base_dir: &str,
        id: &str,
    ) -> Result<Option<String>, ReadError> {
        let Some(rels) = self.part(rels_part)? else {
            return Ok(None);
        };

        let target = RELATIONSHIP
            .find_iter(&rels)
            .map(|m| m.as_str())
            .find(|tag| attribute(tag, "Id").as_deref() == Some(id))
            .and_then(|tag| attribute(tag, "Target"));

        Ok(target.map(|target| match target.strip_prefix('/') {
            Some(absolute) => absolute.to_string(),
            None => format!("{}{}", base_dir, target),
        }))
    }
}

/// Builds a regex matching `<tag ...>inner</tag>` or `<tag .../>`.
///
/// Capture group 1 holds the inner XML and is absent for empty elements.
/// The tag must be followed by whitespace, `/` or `>`, so `a:t` does not
/// match `<a:tbl>`.
pub(crate) fn element_regex(tag: &str) -> Regex {
    let tag = regex::escape(tag);
    Regex::new(&format!(r"(?s)<{tag}(?:\s[^>]*?)?(?:/>|>(.*?)</{tag}>)")).unwrap()
}

/// Inner XML of every match of an [`element_regex`].
pub(crate) fn inner_xml<'a>(re: &Regex, xml: &'a str) -> impl Iterator<Item = &'a str> {
    re.captures_iter(xml)
        .map(|caps| caps.get(1).map_or("", |m| m.as_str()))
}

/// Concatenated, unescaped text of every `re` element inside `xml`.
pub(crate) fn text_of(re: &Regex, xml: &str) -> String {
    inner_xml(re, xml).map(unescape).collect()
}

/// Value of attribute `name` inside a start tag.
pub(crate) fn attribute(tag: &str, name: &str) -> Option<String> {
    let pattern = format!(r#"(?:^|\s){}\s*=\s*"([^"]*)""#, regex::escape(name));
    let re = Regex::new(&pattern).ok()?;
    re.captures(tag).map(|caps| unescape(&caps[1]).into_owned())
}

/// Replaces XML entity and character references.
pub(crate) fn unescape(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }
    ENTITY.replace_all(text, |caps: &Captures| {
        let entity = &caps[1];
        let decoded = match entity {
            "lt" => Some('<'),
            "gt" => Some('>'),
            "amp" => Some('&'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .map(|hex| u32::from_str_radix(hex, 16))
                .or_else(|| entity.strip_prefix('#').map(str::parse::<u32>))
                .and_then(Result::ok)
                .and_then(char::from_u32),
        };
        decoded.map_or_else(|| caps[0].to_string(), String::from)
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Builders for small in-memory OOXML packages.

    use std::io::Write;
    use std::path::Path;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    /// Writes a zip at `path` containing the given `(name, content)` parts.
    pub(crate) fn write_package(path: &Path, parts: &[(&str, &str)]) {
        let file = std::fs::File::create(path).expect("Failed to create package");
        let mut zip = ZipWriter::new(file);
        for (name, content) in parts {
            zip.start_file(*name, SimpleFileOptions::default())
                .expect("Failed to start part");
            zip.write_all(content.as_bytes())
                .expect("Failed to write part");
        }
        zip.finish().expect("Failed to finish package");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_element_regex_skips_longer_tag_names() {
        let re = element_regex("a:t");
        let xml = r#"<a:tbl><a:t>one</a:t><a:tab/><a:t xml:space="preserve"> two</a:t></a:tbl>"#;
        assert_eq!(text_of(&re, xml), "one two");
    }

    #[test]
    fn test_element_regex_handles_empty_elements() {
        let re = element_regex("w:p");
        let xml = r#"<w:p/><w:p w:rsidR="1"><w:t>x</w:t></w:p>"#;
        let inner: Vec<_> = inner_xml(&re, xml).collect();
        assert_eq!(inner, vec!["", "<w:t>x</w:t>"]);
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("Q&amp;A &lt;draft&gt;"), "Q&A <draft>");
        assert_eq!(unescape("caf&#233; &#x41;"), "café A");
        assert_eq!(unescape("&unknown; stays"), "&unknown; stays");
    }

    #[test]
    fn test_attribute() {
        let tag = r#"<sheet name="Q&amp;A" sheetId="1" r:id="rId1"/>"#;
        assert_eq!(attribute(tag, "name").as_deref(), Some("Q&A"));
        assert_eq!(attribute(tag, "r:id").as_deref(), Some("rId1"));
        assert_eq!(attribute(tag, "id"), None);
    }

    #[test]
    fn test_open_rejects_non_zip() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("legacy.doc");
        std::fs::write(&path, b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1 old binary").unwrap();

        assert!(matches!(Package::open(&path), Err(ReadError::NotOoxml)));
    }

    #[test]
    fn test_relationship_target_resolution() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("book.xlsx");
        fixtures::write_package(
            &path,
            &[(
                "xl/_rels/workbook.xml.rels",
                r#"<Relationships><Relationship Id="rId1" Type="ws" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="ws" Target="/xl/worksheets/data.xml"/></Relationships>"#,
            )],
        );

        let mut package = Package::open(&path).unwrap();
        let rels = "xl/_rels/workbook.xml.rels";
        assert_eq!(
            package.relationship_target(rels, "xl/", "rId1").unwrap().as_deref(),
            Some("xl/worksheets/sheet1.xml")
        );
        assert_eq!(
            package.relationship_target(rels, "xl/", "rId2").unwrap().as_deref(),
            Some("xl/worksheets/data.xml")
        );
        assert_eq!(package.relationship_target(rels, "xl/", "rId9").unwrap(), None);
        assert!(package.part("missing.xml").unwrap().is_none());
    }
}
