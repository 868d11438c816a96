use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use crate::error::IngestError;
use crate::extraction::{RawPage, TextExtractor};

/// Text extraction backend for Word documents.
///
/// Reads `word/document.xml` out of the DOCX container and flattens it to
/// lines: one line per paragraph, table rows as tab-separated cells, `w:tab`
/// runs as tab characters. Explicit and rendered page breaks start a new
/// page, so positional reconstruction sees the same page boundaries the
/// supplier exported.
pub struct DocxExtractor;

impl DocxExtractor {
    pub fn new() -> Self {
        DocxExtractor
    }
}

impl Default for DocxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor for DocxExtractor {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<RawPage>, IngestError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| IngestError::Extraction(format!("not a docx container: {e}")))?;

        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .map_err(|e| IngestError::Extraction(format!("word/document.xml missing: {e}")))?
            .read_to_string(&mut xml)
            .map_err(|e| IngestError::Extraction(e.to_string()))?;

        parse_document_xml(&xml)
    }

    fn backend_name(&self) -> &str {
        "docx"
    }
}

fn parse_document_xml(xml: &str) -> Result<Vec<RawPage>, IngestError> {
    let mut reader = Reader::from_str(xml);

    let mut pages: Vec<RawPage> = Vec::new();
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    let mut table_depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text = true,
                b"tbl" => table_depth += 1,
                b"br" if is_page_break(e) => {
                    flush_line(&mut lines, &mut current);
                    flush_page(&mut pages, &mut lines);
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"tab" => current.push('\t'),
                b"br" if is_page_break(e) => {
                    flush_line(&mut lines, &mut current);
                    flush_page(&mut pages, &mut lines);
                }
                b"lastRenderedPageBreak" => {
                    flush_line(&mut lines, &mut current);
                    flush_page(&mut pages, &mut lines);
                }
                _ => {}
            },
            Ok(Event::Text(ref t)) => {
                if in_text {
                    if let Ok(text) = t.unescape() {
                        current.push_str(&text);
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"tbl" => table_depth = table_depth.saturating_sub(1),
                // Inside a table, cells separate columns and rows end lines;
                // paragraph ends only matter outside tables.
                b"tc" => {
                    while current.ends_with(' ') {
                        current.pop();
                    }
                    current.push('\t');
                }
                b"tr" => flush_line(&mut lines, &mut current),
                b"p" if table_depth == 0 => flush_line(&mut lines, &mut current),
                b"p" => {
                    if !current.is_empty() && !current.ends_with(['\t', ' ']) {
                        current.push(' ');
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(IngestError::Extraction(format!(
                    "malformed document.xml: {e}"
                )))
            }
            _ => {}
        }
    }

    flush_line(&mut lines, &mut current);
    if !lines.is_empty() || pages.is_empty() {
        flush_page(&mut pages, &mut lines);
    }

    Ok(pages)
}

fn is_page_break(e: &quick_xml::events::BytesStart<'_>) -> bool {
    e.attributes().flatten().any(|a| {
        a.key.local_name().as_ref() == b"type" && a.value.as_ref() == b"page"
    })
}

fn flush_line(lines: &mut Vec<String>, current: &mut String) {
    let line = std::mem::take(current);
    if !line.trim().is_empty() {
        lines.push(line.trim_end().to_string());
    }
}

fn flush_page(pages: &mut Vec<RawPage>, lines: &mut Vec<String>) {
    let page_number = pages.len() + 1;
    pages.push(RawPage {
        page_number,
        lines: std::mem::take(lines),
    });
}
