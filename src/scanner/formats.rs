//! Format-aware text sources.
//!
//! Office and PDF files are containers: their raw bytes are compressed or
//! binary, so tokenizing them directly yields noise shared by every file of
//! the same type. Each source here accepts a family of extensions and feeds
//! only the visible text to the sink.
//!
//! - [`PdfSource`]: PDF via pdf-extract
//! - [`DocxSource`]: Word body text via docx-rs
//! - [`ZipXmlSource`]: OOXML and ODF packages, XML text of the content parts
//! - [`RtfSource`]: RTF with control words and hidden destinations removed
//! - [`LegacyOfficeSource`]: printable runs from pre-2007 Office binaries

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use super::document::{DocumentError, TextSource, CHUNK_SIZE};
use crate::text::ChunkSink;

/// Word processing packages read by [`DocxSource`] and [`ZipXmlSource`].
const DOCX_LIKE: &[&str] = &["docx", "docm", "dotx", "dotm"];
const PPTX_LIKE: &[&str] = &["pptx", "pptm", "potx", "potm", "ppsx", "ppsm"];
const XLSX_LIKE: &[&str] = &["xlsx", "xlsm", "xltx", "xltm"];
const ODF: &[&str] = &["odt", "ods", "odp"];
const LEGACY_OFFICE: &[&str] = &["doc", "dot", "xls", "xlt", "ppt", "pps", "pot"];

/// Lowercased extension of `path`, if it has a UTF-8 one.
fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

fn has_extension(path: &Path, family: &[&str]) -> bool {
    extension(path).is_some_and(|ext| family.contains(&ext.as_str()))
}

fn is_zip_office(path: &Path) -> bool {
    [DOCX_LIKE, PPTX_LIKE, XLSX_LIKE, ODF]
        .iter()
        .any(|family| has_extension(path, family))
}

/// Returns `true` for files whose raw bytes are not text.
///
/// The raw source refuses these so a failed extraction never falls back to
/// tokenizing compressed or binary content.
#[must_use]
pub fn is_binary_container(path: &Path) -> bool {
    has_extension(path, &["pdf"]) || is_zip_office(path) || has_extension(path, LEGACY_OFFICE)
}

fn read_all(path: &Path) -> Result<Vec<u8>, DocumentError> {
    fs::read(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn extraction_error(path: &Path, message: impl ToString) -> DocumentError {
    DocumentError::Extraction {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

/// Batches decoded text and hands it to the sink in [`CHUNK_SIZE`] pieces.
struct TextBuffer<'a> {
    sink: &'a mut dyn ChunkSink,
    bytes: Vec<u8>,
}

impl<'a> TextBuffer<'a> {
    fn new(sink: &'a mut dyn ChunkSink) -> Self {
        Self {
            sink,
            bytes: Vec::with_capacity(CHUNK_SIZE),
        }
    }

    fn push_byte(&mut self, byte: u8) {
        self.bytes.push(byte);
        if self.bytes.len() >= CHUNK_SIZE {
            self.flush();
        }
    }

    fn push_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
        if self.bytes.len() >= CHUNK_SIZE {
            self.flush();
        }
    }

    fn push_char(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.push_bytes(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn flush(&mut self) {
        if !self.bytes.is_empty() {
            self.sink.add_chunk(&self.bytes);
            self.bytes.clear();
        }
    }
}

impl Drop for TextBuffer<'_> {
    fn drop(&mut self) {
        self.flush();
    }
}

/// PDF text through pdf-extract.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfSource;

impl TextSource for PdfSource {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn accepts(&self, path: &Path) -> bool {
        has_extension(path, &["pdf"])
    }

    fn stream(&self, path: &Path, sink: &mut dyn ChunkSink) -> Result<(), DocumentError> {
        let mut header = [0u8; 5];
        let mut file = File::open(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if file.read_exact(&mut header).is_err() || &header != b"%PDF-" {
            return Err(extraction_error(path, "missing %PDF- header"));
        }
        drop(file);

        let text = pdf_extract::extract_text(path).map_err(|e| extraction_error(path, e))?;
        sink.add_chunk(text.as_bytes());
        Ok(())
    }
}

/// Word document body through docx-rs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxSource;

impl DocxSource {
    fn paragraph_text(paragraph: &docx_rs::Paragraph, text: &mut String) {
        for child in &paragraph.children {
            if let docx_rs::ParagraphChild::Run(run) = child {
                for child in &run.children {
                    match child {
                        docx_rs::RunChild::Text(t) => text.push_str(&t.text),
                        docx_rs::RunChild::Tab(_) => text.push('\t'),
                        docx_rs::RunChild::Break(_) => text.push('\n'),
                        _ => {}
                    }
                }
            }
        }
        text.push('\n');
    }

    fn table_text(table: &docx_rs::Table, text: &mut String) {
        for row in &table.rows {
            let docx_rs::TableChild::TableRow(row) = row;
            for cell in &row.cells {
                let docx_rs::TableRowChild::TableCell(cell) = cell;
                for content in &cell.children {
                    match content {
                        docx_rs::TableCellContent::Paragraph(p) => Self::paragraph_text(p, text),
                        docx_rs::TableCellContent::Table(t) => Self::table_text(t, text),
                        _ => {}
                    }
                }
            }
        }
    }
}

impl TextSource for DocxSource {
    fn name(&self) -> &'static str {
        "docx"
    }

    fn accepts(&self, path: &Path) -> bool {
        has_extension(path, DOCX_LIKE)
    }

    fn stream(&self, path: &Path, sink: &mut dyn ChunkSink) -> Result<(), DocumentError> {
        let bytes = read_all(path)?;
        let docx = docx_rs::read_docx(&bytes).map_err(|e| extraction_error(path, e))?;

        let mut text = String::new();
        for child in &docx.document.children {
            match child {
                docx_rs::DocumentChild::Paragraph(p) => Self::paragraph_text(p, &mut text),
                docx_rs::DocumentChild::Table(t) => Self::table_text(t, &mut text),
                _ => {}
            }
        }
        sink.add_chunk(text.as_bytes());
        Ok(())
    }
}

/// Text of the content parts of an OOXML or ODF package.
///
/// Covers presentations, spreadsheets and OpenDocument files, and is the
/// fallback for Word packages docx-rs cannot parse. Headers, footers and
/// notes are included.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipXmlSource;

impl ZipXmlSource {
    /// Whether the package part `name` (lowercased) carries document text.
    fn is_content_part(ext: &str, name: &str) -> bool {
        if DOCX_LIKE.contains(&ext) {
            return matches!(
                name,
                "word/document.xml" | "word/footnotes.xml" | "word/endnotes.xml"
            ) || name.starts_with("word/header")
                || name.starts_with("word/footer");
        }
        if PPTX_LIKE.contains(&ext) {
            return name.starts_with("ppt/slides/") || name.starts_with("ppt/notesslides/");
        }
        if XLSX_LIKE.contains(&ext) {
            return name == "xl/sharedstrings.xml" || name.starts_with("xl/worksheets/");
        }
        if ODF.contains(&ext) {
            return name == "content.xml" || name == "styles.xml";
        }
        false
    }
}

impl TextSource for ZipXmlSource {
    fn name(&self) -> &'static str {
        "zip-xml"
    }

    fn accepts(&self, path: &Path) -> bool {
        is_zip_office(path)
    }

    fn stream(&self, path: &Path, sink: &mut dyn ChunkSink) -> Result<(), DocumentError> {
        let ext = extension(path).unwrap_or_default();
        let file = File::open(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut archive = zip::ZipArchive::new(file).map_err(|e| extraction_error(path, e))?;

        let mut parts = 0usize;
        let mut out = TextBuffer::new(sink);
        let mut xml = Vec::new();
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).map_err(|e| extraction_error(path, e))?;
            if entry.is_dir() || !Self::is_content_part(&ext, &entry.name().to_ascii_lowercase())
            {
                continue;
            }
            xml.clear();
            entry
                .read_to_end(&mut xml)
                .map_err(|e| extraction_error(path, e))?;
            xml_text(&xml, &mut out);
            out.push_byte(b'\n');
            parts += 1;
        }

        if parts == 0 {
            return Err(extraction_error(path, "package has no text parts"));
        }
        Ok(())
    }
}

/// Local names of elements that end a run of text (paragraphs, breaks, cells).
const XML_BREAK_ELEMENTS: &[&[u8]] = &[b"p", b"br", b"tab", b"h", b"tc", b"c", b"si", b"cr"];

fn is_break_tag(tag: &[u8]) -> bool {
    let name = tag
        .strip_prefix(b"/")
        .unwrap_or(tag)
        .split(|&b| b.is_ascii_whitespace() || b == b'/')
        .next()
        .unwrap_or_default();
    let local = match name.iter().rposition(|&b| b == b':') {
        Some(colon) => &name[colon + 1..],
        None => name,
    };
    XML_BREAK_ELEMENTS.contains(&local)
}

/// Decodes the entity starting after `&` at `data[start..]`.
///
/// Returns the character and the number of bytes consumed including `;`.
fn xml_entity(data: &[u8]) -> Option<(char, usize)> {
    let end = data.iter().take(13).position(|&b| b == b';')?;
    let name = &data[..end];
    let c = match name {
        b"lt" => '<',
        b"gt" => '>',
        b"amp" => '&',
        b"quot" => '"',
        b"apos" => '\'',
        b"nbsp" => ' ',
        [b'#', b'x' | b'X', hex @ ..] => {
            char::from_u32(u32::from_str_radix(std::str::from_utf8(hex).ok()?, 16).ok()?)?
        }
        [b'#', dec @ ..] => char::from_u32(std::str::from_utf8(dec).ok()?.parse().ok()?)?,
        _ => return None,
    };
    Some((c, end + 1))
}

/// Writes the character data of `xml` with markup removed.
fn xml_text(xml: &[u8], out: &mut TextBuffer<'_>) {
    const CDATA_OPEN: &[u8] = b"<![CDATA[";
    let mut i = 0;
    while i < xml.len() {
        match xml[i] {
            b'<' if xml[i..].starts_with(CDATA_OPEN) => {
                let body = &xml[i + CDATA_OPEN.len()..];
                let Some(end) = body.windows(3).position(|w| w == b"]]>") else {
                    return;
                };
                out.push_bytes(&body[..end]);
                i += CDATA_OPEN.len() + end + 3;
            }
            b'<' => {
                let Some(len) = xml[i + 1..].iter().position(|&b| b == b'>') else {
                    return;
                };
                if is_break_tag(&xml[i + 1..i + 1 + len]) {
                    out.push_byte(b' ');
                }
                i += len + 2;
            }
            b'&' => match xml_entity(&xml[i + 1..]) {
                Some((c, consumed)) => {
                    out.push_char(c);
                    i += 1 + consumed;
                }
                None => {
                    out.push_byte(b'&');
                    i += 1;
                }
            },
            b => {
                out.push_byte(b);
                i += 1;
            }
        }
    }
}

/// RTF with control words, group braces and hidden destinations removed.
#[derive(Debug, Clone, Copy, Default)]
pub struct RtfSource;

/// Destinations whose content is never visible text.
const RTF_HIDDEN_DESTINATIONS: &[&[u8]] = &[
    b"fonttbl",
    b"colortbl",
    b"stylesheet",
    b"info",
    b"pict",
    b"object",
    b"themedata",
    b"datastore",
    b"latentstyles",
    b"listtable",
    b"listoverridetable",
    b"rsidtbl",
    b"generator",
    b"xmlnstbl",
];

impl RtfSource {
    /// Writes the visible text of an RTF document.
    fn visible_text(data: &[u8], out: &mut TextBuffer<'_>) {
        // Hidden flag per open group; the bottom entry is the document itself.
        let mut hidden = vec![false];
        let mut i = 0;
        while i < data.len() {
            let skipping = hidden.last().copied().unwrap_or(false);
            match data[i] {
                b'{' => {
                    hidden.push(skipping);
                    i += 1;
                }
                b'}' => {
                    if hidden.len() > 1 {
                        hidden.pop();
                    }
                    i += 1;
                }
                b'\\' => i = Self::control(data, i, &mut hidden, out),
                b'\r' | b'\n' => i += 1,
                b => {
                    if !skipping {
                        out.push_byte(b);
                    }
                    i += 1;
                }
            }
        }
    }

    /// Handles the control sequence at `data[start]` and returns the next index.
    fn control(data: &[u8], start: usize, hidden: &mut [bool], out: &mut TextBuffer<'_>) -> usize {
        let skipping = hidden.last().copied().unwrap_or(false);
        let Some(&next) = data.get(start + 1) else {
            return data.len();
        };
        match next {
            b'\\' | b'{' | b'}' => {
                if !skipping {
                    out.push_byte(next);
                }
                start + 2
            }
            b'*' => {
                if let Some(flag) = hidden.last_mut() {
                    *flag = true;
                }
                start + 2
            }
            b'\'' => match data.get(start + 2..start + 4).and_then(hex_byte) {
                Some(byte) => {
                    if !skipping {
                        // Code page 1252 agrees with Latin-1 for letters.
                        out.push_char(char::from(byte));
                    }
                    start + 4
                }
                None => start + 2,
            },
            b if b.is_ascii_alphabetic() => {
                let word_end = data[start + 1..]
                    .iter()
                    .position(|b| !b.is_ascii_alphabetic())
                    .map_or(data.len(), |p| start + 1 + p);
                let word = &data[start + 1..word_end];

                let mut cursor = word_end;
                let negative = data.get(cursor) == Some(&b'-');
                if negative {
                    cursor += 1;
                }
                let digits_end = data[cursor..]
                    .iter()
                    .position(|b| !b.is_ascii_digit())
                    .map_or(data.len(), |p| cursor + p);
                let param = std::str::from_utf8(&data[cursor..digits_end])
                    .ok()
                    .and_then(|s| s.parse::<i32>().ok());
                cursor = digits_end;
                if data.get(cursor) == Some(&b' ') {
                    cursor += 1;
                }

                if RTF_HIDDEN_DESTINATIONS.contains(&word) {
                    if let Some(flag) = hidden.last_mut() {
                        *flag = true;
                    }
                    return cursor;
                }
                if skipping {
                    return cursor;
                }
                match word {
                    b"par" | b"line" | b"sect" | b"page" | b"row" | b"cell" => {
                        out.push_byte(b'\n');
                    }
                    b"tab" => out.push_byte(b'\t'),
                    b"u" => {
                        if let Some(value) = param {
                            let value = if negative { -value } else { value };
                            let code = if value < 0 { value + 65536 } else { value };
                            if let Some(c) = u32::try_from(code).ok().and_then(char::from_u32) {
                                out.push_char(c);
                            }
                        }
                        // One fallback character follows for non-Unicode readers.
                        return match data.get(cursor).copied() {
                            Some(b'\\') if data.get(cursor + 1) == Some(&b'\'') => cursor + 4,
                            Some(b'\\' | b'{' | b'}') | None => cursor,
                            Some(_) => cursor + 1,
                        };
                    }
                    _ => {}
                }
                cursor
            }
            _ => start + 2,
        }
    }
}

fn hex_byte(pair: &[u8]) -> Option<u8> {
    u8::from_str_radix(std::str::from_utf8(pair).ok()?, 16).ok()
}

impl TextSource for RtfSource {
    fn name(&self) -> &'static str {
        "rtf"
    }

    fn accepts(&self, path: &Path) -> bool {
        has_extension(path, &["rtf"])
    }

    fn stream(&self, path: &Path, sink: &mut dyn ChunkSink) -> Result<(), DocumentError> {
        let data = read_all(path)?;
        if !data.starts_with(b"{\\rtf") {
            return Err(extraction_error(path, "missing {\\rtf header"));
        }
        Self::visible_text(&data, &mut TextBuffer::new(sink));
        Ok(())
    }
}

/// Printable runs from pre-2007 Office binaries.
///
/// Picks up ASCII runs and UTF-16LE runs of at least [`Self::MIN_RUN`]
/// characters, one run per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyOfficeSource;

impl LegacyOfficeSource {
    pub const MIN_RUN: usize = 4;

    fn is_text_byte(b: u8) -> bool {
        matches!(b, 0x20..=0x7E | b'\n' | b'\r' | b'\t')
    }

    fn printable_runs(data: &[u8], out: &mut TextBuffer<'_>) {
        let mut i = 0;
        while i < data.len() {
            // UTF-16LE: text byte followed by a zero byte, repeated.
            let wide = data[i..]
                .chunks_exact(2)
                .take_while(|pair| Self::is_text_byte(pair[0]) && pair[1] == 0)
                .count();
            if wide >= Self::MIN_RUN {
                for pair in data[i..i + wide * 2].chunks_exact(2) {
                    out.push_byte(pair[0]);
                }
                out.push_byte(b'\n');
                i += wide * 2;
                continue;
            }

            let narrow = data[i..]
                .iter()
                .take_while(|&&b| Self::is_text_byte(b))
                .count();
            if narrow >= Self::MIN_RUN {
                out.push_bytes(&data[i..i + narrow]);
                out.push_byte(b'\n');
            }
            i += narrow.max(1);
        }
    }
}

impl TextSource for LegacyOfficeSource {
    fn name(&self) -> &'static str {
        "legacy-office"
    }

    fn accepts(&self, path: &Path) -> bool {
        has_extension(path, LEGACY_OFFICE)
    }

    fn stream(&self, path: &Path, sink: &mut dyn ChunkSink) -> Result<(), DocumentError> {
        let data = read_all(path)?;
        Self::printable_runs(&data, &mut TextBuffer::new(sink));
        Ok(())
    }
}
