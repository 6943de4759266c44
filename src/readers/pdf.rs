use super::{ContentReader, Extracted, ExtractionResult, ReadError};
use crate::file_kind::FileKind;
use encoding_rs::{UTF_16BE, WINDOWS_1252};
use flate2::read::ZlibDecoder;
use regex::bytes::Regex;
use std::borrow::Cow;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

/// Title used when there is text but no line long enough to be a title.
pub const FALLBACK_TITLE: &str = "documento_pdf";

/// Lines this short are not considered as a title.
const MIN_TITLE_CHARS: usize = 4;

static STREAM_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?-u:\b)stream\r?\n").unwrap());

/// `(text) Tj`, `(text) '` and `[(te) -20 (xt)] TJ`.
static TEXT_SHOW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\(((?:[^()\\]|\\.)*)\)\s*(?:Tj|')|\[((?:[^\]\\]|\\.)*)\]\s*TJ").unwrap()
});
static ARRAY_STRING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\(((?:[^()\\]|\\.)*)\)").unwrap());
static INFO_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)/Title\s*(?:\(((?:[^()\\]|\\.)*)\)|<([0-9A-Fa-f\s]*)>)").unwrap()
});

/// Reads PDF documents.
///
/// Text is taken from the text-showing operators of the content streams;
/// streams compressed with `/FlateDecode` are inflated first. The title
/// is the first line longer than three characters, else the `/Title` entry
/// of the document information dictionary, else `documento_pdf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfReader;

impl PdfReader {
    fn read(&self, path: &Path) -> Result<Extracted, ReadError> {
        let bytes = fs::read(path)?;
        if !infer::archive::is_pdf(&bytes) {
            return Err(ReadError::NotPdf);
        }

        let bytes = inflate_streams(&bytes);
        let lines = text_lines(&bytes);
        let preview = lines.join("\n");
        let title = match lines
            .iter()
            .find(|line| line.chars().count() >= MIN_TITLE_CHARS)
            .cloned()
            .or_else(|| info_title(&bytes))
        {
            Some(title) => title,
            None if preview.is_empty() => return Err(ReadError::NoText),
            None => FALLBACK_TITLE.to_string(),
        };

        Ok(Extracted { title, preview })
    }
}

impl ContentReader for PdfReader {
    fn extract(&self, path: &Path) -> ExtractionResult {
        ExtractionResult::from_read(FileKind::Pdf, self.read(path))
    }
}

/// Returns the file with every `/FlateDecode` stream replaced by its
/// inflated data. Streams with other filters, or that fail to inflate, are
/// left as they are.
fn inflate_streams(bytes: &[u8]) -> Cow<'_, [u8]> {
    let mut out = Vec::new();
    let mut copied = 0;
    let mut resume = 0;

    for start in STREAM_START.find_iter(bytes) {
        if start.start() < resume {
            continue;
        }
        let data_start = start.end();
        let Some(len) = find(&bytes[data_start..], b"endstream") else {
            break;
        };
        let data_end = data_start + len;
        resume = data_end;

        // the stream dictionary sits between "obj" and "stream"
        let head = &bytes[copied..start.start()];
        let dict = rfind(head, b"obj").map_or(head, |at| &head[at..]);
        if find(dict, b"/FlateDecode").is_none() {
            continue;
        }

        let mut inflated = Vec::new();
        if let Err(e) = ZlibDecoder::new(&bytes[data_start..data_end]).read_to_end(&mut inflated) {
            debug!("skipping undecodable stream at byte {}: {}", data_start, e);
            continue;
        }
        out.extend_from_slice(&bytes[copied..data_start]);
        out.extend_from_slice(&inflated);
        out.push(b'\n');
        copied = data_end;
    }

    if copied == 0 {
        return Cow::Borrowed(bytes);
    }
    out.extend_from_slice(&bytes[copied..]);
    Cow::Owned(out)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|w| w == needle)
}

fn text_lines(bytes: &[u8]) -> Vec<String> {
    TEXT_SHOW
        .captures_iter(bytes)
        .map(|caps| {
            if let Some(literal) = caps.get(1) {
                decode_text(&unescape_literal(literal.as_bytes()))
            } else {
                let array = caps.get(2).map_or(&[][..], |m| m.as_bytes());
                ARRAY_STRING
                    .captures_iter(array)
                    .map(|part| decode_text(&unescape_literal(&part[1])))
                    .collect()
            }
        })
        .map(|line| crate::naming::normalize_text(&line))
        .filter(|line| !line.is_empty())
        .collect()
}

fn info_title(bytes: &[u8]) -> Option<String> {
    let caps = INFO_TITLE.captures(bytes)?;
    let raw = match (caps.get(1), caps.get(2)) {
        (Some(literal), _) => unescape_literal(literal.as_bytes()),
        (None, Some(hex)) => decode_hex(hex.as_bytes()),
        (None, None) => return None,
    };
    let title = crate::naming::normalize_text(&decode_text(&raw));
    (!title.is_empty()).then_some(title)
}

/// Resolves backslash escapes of a literal string.
fn unescape_literal(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let byte = raw[i];
        i += 1;
        if byte != b'\\' || i >= raw.len() {
            out.push(byte);
            continue;
        }

        let escaped = raw[i];
        i += 1;
        match escaped {
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            // line continuation
            b'\r' | b'\n' => {
                if escaped == b'\r' && raw.get(i) == Some(&b'\n') {
                    i += 1;
                }
            }
            b'0'..=b'7' => {
                let mut value = u32::from(escaped - b'0');
                for _ in 0..2 {
                    match raw.get(i) {
                        Some(d @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(d - b'0');
                            i += 1;
                        }
                        _ => break,
                    }
                }
                out.push((value & 0xff) as u8);
            }
            other => out.push(other),
        }
    }
    out
}

fn decode_hex(raw: &[u8]) -> Vec<u8> {
    let digits: Vec<u8> = raw
        .iter()
        .filter_map(|b| (*b as char).to_digit(16).map(|d| d as u8))
        .collect();
    digits
        .chunks(2)
        .map(|pair| (pair[0] << 4) | pair.get(1).copied().unwrap_or(0))
        .collect()
}

/// Decodes a PDF text string: UTF-16BE with a byte order mark, else
/// Windows-1252.
fn decode_text(bytes: &[u8]) -> String {
    match bytes.strip_prefix(&[0xFE, 0xFF]) {
        Some(utf16) => UTF_16BE.decode_without_bom_handling(utf16).0.into_owned(),
        None => WINDOWS_1252.decode_without_bom_handling(bytes).0.into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_pdf(path: &Path, content: &str, info: &str) {
        let pdf = format!(
            "%PDF-1.4\n1 0 obj\n<< /Length {} >>\nstream\n{}\nendstream\nendobj\n2 0 obj\n<< {} >>\nendobj\n%%EOF\n",
            content.len(),
            content,
            info
        );
        fs::write(path, pdf).expect("Failed to write pdf");
    }

    #[test]
    fn test_first_long_line_becomes_title() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("scan.pdf");
        write_pdf(
            &path,
            "BT /F1 12 Tf (p1) Tj (Invoice \\(March\\)) Tj [(Total: ) -120 (R$ 100)] TJ ET",
            "/Producer (x)",
        );

        let result = PdfReader.extract(&path);
        assert!(result.success, "{}", result.error);
        assert_eq!(result.title, "Invoice (March)");
        assert_eq!(result.content_preview, "p1\nInvoice (March)\nTotal: R$ 100");
    }

    fn write_compressed_pdf(path: &Path, content: &str) {
        use flate2::Compression;
        use flate2::write::ZlibEncoder;
        use std::io::Write;

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(content.as_bytes()).unwrap();
        let data = encoder.finish().unwrap();

        let mut pdf = format!(
            "%PDF-1.5\n1 0 obj\n<< /Length {} /Filter /FlateDecode >>\nstream\n",
            data.len()
        )
        .into_bytes();
        pdf.extend_from_slice(&data);
        pdf.extend_from_slice(b"\nendstream\nendobj\n%%EOF\n");
        fs::write(path, pdf).expect("Failed to write pdf");
    }

    #[test]
    fn test_flate_compressed_stream_is_read() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("report.pdf");
        write_compressed_pdf(&path, "BT /F1 18 Tf (Annual Report 2024) Tj ET");

        let result = PdfReader.extract(&path);
        assert!(result.success, "{}", result.error);
        assert_eq!(result.title, "Annual Report 2024");
        assert_eq!(result.content_preview, "Annual Report 2024");
    }

    #[test]
    fn test_short_text_without_info_title_uses_fallback() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("scan.pdf");
        write_pdf(&path, "BT (ab) Tj (7) Tj ET", "/Producer (x)");

        let result = PdfReader.extract(&path);
        assert!(result.success, "{}", result.error);
        assert_eq!(result.title, FALLBACK_TITLE);
        assert_eq!(result.content_preview, "ab\n7");
    }

    #[test]
    fn test_info_title_used_when_lines_are_short() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("scan.pdf");
        write_pdf(&path, "BT (ab) Tj ET", "/Title (Quarterly \\050Draft\\051)");

        let result = PdfReader.extract(&path);
        assert_eq!(result.title, "Quarterly (Draft)");
        assert_eq!(result.content_preview, "ab");
    }

    #[test]
    fn test_hex_utf16_info_title() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("scan.pdf");
        write_pdf(&path, "", "/Title <FEFF00430061006600E9>");

        assert_eq!(PdfReader.extract(&path).title, "Café");
    }

    #[test]
    fn test_pdf_without_text_fails() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("image.pdf");
        write_pdf(&path, "q 100 0 0 100 0 0 cm /Im1 Do Q", "/Producer (scanner)");

        let result = PdfReader.extract(&path);
        assert!(!result.success);
        assert_eq!(
            result.error,
            "error reading pdf file: could not extract text from PDF"
        );
    }

    #[test]
    fn test_non_pdf_bytes_fail() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("fake.pdf");
        fs::write(&path, "just text").unwrap();

        let result = PdfReader.extract(&path);
        assert!(!result.success);
        assert!(result.error.contains("not a PDF file"));
    }

    #[test]
    fn test_unescape_literal_octal_and_continuation() {
        assert_eq!(unescape_literal(b"a\\101\\\nb"), b"aAb".to_vec());
        assert_eq!(unescape_literal(b"\\\\x"), b"\\x".to_vec());
    }
}
