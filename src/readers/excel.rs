use super::ooxml::{self, Package};
use super::{ContentReader, Extracted, ExtractionResult, ReadError};
use crate::file_kind::FileKind;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

/// Title used when the workbook has no sheet name.
pub const FALLBACK_TITLE: &str = "planilha";

/// Default sheet names that say nothing about the content.
const GENERIC_SHEET_NAMES: [&str; 3] = ["sheet1", "planilha1", "plan1"];

const PREVIEW_ROWS: u32 = 5;
const PREVIEW_COLUMNS: usize = 3;

/// Column letters of the widest sheet a workbook can have (`XFD`).
const MAX_COLUMN_LETTERS: usize = 3;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS: &str = "xl/_rels/workbook.xml.rels";
const DEFAULT_SHEET_PART: &str = "xl/worksheets/sheet1.xml";

static SHEET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<sheet\s[^>]*>").unwrap());
static CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<c(\s[^>]*?)?(?:/>|>(.*?)</c>)").unwrap());
static CELL_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?:^|\s)r="([A-Z]+)([0-9]+)""#).unwrap());
static SHARED_ITEM: LazyLock<Regex> = LazyLock::new(|| ooxml::element_regex("si"));
static TEXT: LazyLock<Regex> = LazyLock::new(|| ooxml::element_regex("t"));
static VALUE: LazyLock<Regex> = LazyLock::new(|| ooxml::element_regex("v"));

/// Reads `.xlsx` workbooks.
///
/// The title is the first sheet's name unless that name is a default like
/// `Sheet1`, in which case a text value in cell A1 is preferred. The preview
/// lists the first five rows, three columns wide.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExcelReader;

#[derive(Debug)]
struct Cell {
    row: u32,
    column: usize,
    text: String,
    is_text: bool,
}

impl ExcelReader {
    fn read(&self, path: &Path) -> Result<Extracted, ReadError> {
        let mut package = Package::open(path)?;
        let workbook = package.required_part(WORKBOOK_PART)?;

        let first_sheet = SHEET.find(&workbook).map(|m| m.as_str().to_string());
        let sheet_name = first_sheet
            .as_deref()
            .and_then(|tag| ooxml::attribute(tag, "name"))
            .filter(|name| !name.trim().is_empty());

        let sheet_part = match first_sheet.as_deref().and_then(|tag| ooxml::attribute(tag, "r:id")) {
            Some(id) => package.relationship_target(WORKBOOK_RELS, "xl/", &id)?,
            None => None,
        }
        .unwrap_or_else(|| DEFAULT_SHEET_PART.to_string());

        let shared = match package.part("xl/sharedStrings.xml")? {
            Some(xml) => shared_strings(&xml),
            None => Vec::new(),
        };
        let cells = match package.part(&sheet_part)? {
            Some(xml) => parse_cells(&xml, &shared),
            None => Vec::new(),
        };

        let mut title = sheet_name.unwrap_or_else(|| FALLBACK_TITLE.to_string());
        if GENERIC_SHEET_NAMES.contains(&title.to_lowercase().as_str())
            && let Some(a1) = cells
                .iter()
                .find(|c| c.row == 1 && c.column == 0 && c.is_text)
                .map(|c| c.text.trim())
                .filter(|text| !text.is_empty())
        {
            title = a1.to_string();
        }

        Ok(Extracted {
            title,
            preview: preview(&cells),
        })
    }
}

impl ContentReader for ExcelReader {
    fn extract(&self, path: &Path) -> ExtractionResult {
        ExtractionResult::from_read(FileKind::Excel, self.read(path))
    }
}

fn shared_strings(xml: &str) -> Vec<String> {
    ooxml::inner_xml(&SHARED_ITEM, xml)
        .map(|item| ooxml::text_of(&TEXT, item))
        .collect()
}

fn parse_cells(xml: &str, shared: &[String]) -> Vec<Cell> {
    CELL.captures_iter(xml)
        .filter_map(|caps| {
            let attrs = caps.get(1).map_or("", |m| m.as_str());
            let inner = caps.get(2).map_or("", |m| m.as_str());

            let reference = CELL_REF.captures(attrs)?;
            let column = column_index(&reference[1])?;
            let row = reference[2].parse().ok()?;

            let raw_value = || ooxml::text_of(&VALUE, inner);
            let cell_type = ooxml::attribute(attrs, "t");
            let (text, is_text) = match cell_type.as_deref() {
                Some("s") => {
                    let index: usize = raw_value().trim().parse().ok()?;
                    (shared.get(index)?.clone(), true)
                }
                Some("inlineStr") => (ooxml::text_of(&TEXT, inner), true),
                Some("str") => (raw_value(), true),
                Some("b") => {
                    let flag = if raw_value().trim() == "1" { "TRUE" } else { "FALSE" };
                    (flag.to_string(), false)
                }
                _ => (raw_value(), false),
            };

            Some(Cell {
                row,
                column,
                text,
                is_text,
            })
        })
        .collect()
}

/// `A` is 0, `Z` is 25, `AA` is 26. `None` for references wider than `XFD`
/// can spell.
fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() || letters.len() > MAX_COLUMN_LETTERS {
        return None;
    }
    letters
        .bytes()
        .try_fold(0usize, |acc, b| {
            acc.checked_mul(26)?
                .checked_add(usize::from(b.checked_sub(b'A')?) + 1)
        })
        .map(|n| n - 1)
}

fn preview(cells: &[Cell]) -> String {
    let mut rows: BTreeMap<u32, Vec<(usize, &str)>> = BTreeMap::new();
    for cell in cells {
        let text = cell.text.trim();
        if cell.row <= PREVIEW_ROWS && cell.column < PREVIEW_COLUMNS && !text.is_empty() {
            rows.entry(cell.row).or_default().push((cell.column, text));
        }
    }

    rows.into_values()
        .map(|mut values| {
            values.sort_by_key(|(column, _)| *column);
            values
                .into_iter()
                .map(|(_, text)| text)
                .collect::<Vec<_>>()
                .join(" | ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readers::ooxml::fixtures::write_package;
    use tempfile::TempDir;

    const RELS: &str = r#"<Relationships><Relationship Id="rId1" Target="worksheets/sheet1.xml"/></Relationships>"#;

    fn workbook(sheet_name: &str) -> String {
        format!(
            r#"<workbook><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
            sheet_name
        )
    }

    fn write_workbook(path: &Path, sheet_name: &str, shared: &str, sheet: &str) {
        write_package(
            path,
            &[
                ("xl/workbook.xml", &workbook(sheet_name)),
                (WORKBOOK_RELS, RELS),
                ("xl/sharedStrings.xml", shared),
                ("xl/worksheets/sheet1.xml", sheet),
            ],
        );
    }

    #[test]
    fn test_generic_sheet_name_defers_to_a1() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("b.xlsx");
        write_workbook(
            &path,
            "Sheet1",
            "<sst><si><t>Q1 Budget</t></si><si><t>Total</t></si></sst>",
            r#"<worksheet><sheetData>
                <row r="1"><c r="A1" t="s"><v>0</v></c></row>
                <row r="2"><c r="A2" t="s"><v>1</v></c><c r="B2"><v>1500</v></c><c r="D2"><v>9</v></c></row>
            </sheetData></worksheet>"#,
        );

        let result = ExcelReader.extract(&path);
        assert!(result.success, "{}", result.error);
        assert_eq!(result.title, "Q1 Budget");
        assert_eq!(result.content_preview, "Q1 Budget\nTotal | 1500");
    }

    #[test]
    fn test_meaningful_sheet_name_is_kept() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("b.xlsx");
        write_workbook(
            &path,
            "Vendas 2024",
            "<sst><si><t>Ignored</t></si></sst>",
            r#"<worksheet><sheetData><row r="1"><c r="A1" t="s"><v>0</v></c></row></sheetData></worksheet>"#,
        );

        assert_eq!(ExcelReader.extract(&path).title, "Vendas 2024");
    }

    #[test]
    fn test_numeric_a1_does_not_replace_generic_name() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("b.xlsx");
        write_workbook(
            &path,
            "Planilha1",
            "<sst/>",
            r#"<worksheet><sheetData><row r="1"><c r="A1"><v>42</v></c></row></sheetData></worksheet>"#,
        );

        let result = ExcelReader.extract(&path);
        assert_eq!(result.title, "Planilha1");
        assert_eq!(result.content_preview, "42");
    }

    #[test]
    fn test_inline_strings_and_preview_bounds() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("b.xlsx");
        let rows: String = (1..=7)
            .map(|r| {
                format!(
                    r#"<row r="{r}"><c r="A{r}" t="inlineStr"><is><t>r{r}</t></is></c><c r="B{r}"/></row>"#
                )
            })
            .collect();
        write_workbook(
            &path,
            "Data",
            "<sst/>",
            &format!("<worksheet><sheetData>{}</sheetData></worksheet>", rows),
        );

        let result = ExcelReader.extract(&path);
        assert_eq!(result.content_preview, "r1\nr2\nr3\nr4\nr5");
    }

    #[test]
    fn test_column_index() {
        assert_eq!(column_index("A"), Some(0));
        assert_eq!(column_index("C"), Some(2));
        assert_eq!(column_index("AA"), Some(26));
        assert_eq!(column_index("XFD"), Some(16383));
        assert_eq!(column_index("ZZZZZZZZZZZZZZZZZZZZ"), None);
        assert_eq!(column_index(""), None);
    }

    #[test]
    fn test_oversized_cell_reference_is_skipped() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("b.xlsx");
        write_workbook(
            &path,
            "Sheet1",
            "<sst><si><t>Bogus</t></si><si><t>Q1 Budget</t></si></sst>",
            r#"<worksheet><sheetData><row r="1">
                <c r="ZZZZZZZZZZZZZZZZZZZZ1" t="s"><v>0</v></c>
                <c r="A1" t="s"><v>1</v></c>
            </row></sheetData></worksheet>"#,
        );

        let result = ExcelReader.extract(&path);
        assert!(result.success, "{}", result.error);
        assert_eq!(result.title, "Q1 Budget");
        assert_eq!(result.content_preview, "Q1 Budget");
    }

    #[test]
    fn test_legacy_xls_fails() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("old.xls");
        std::fs::write(&path, b"\xD0\xCF\x11\xE0").unwrap();

        let result = ExcelReader.extract(&path);
        assert!(!result.success);
        assert!(result.error.starts_with("error reading excel file:"));
    }
}
