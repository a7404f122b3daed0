//! DOCX strategy: paragraph text from `word/document.xml`, in document order.

use std::io::{Cursor, Read};

use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::debug;

use crate::error::ExtractionError;

const DOCUMENT_PART: &str = "word/document.xml";

pub fn extract_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractionError::Decode(format!("DOCX container: {}", e)))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ExtractionError::Decode(format!("DOCX missing {}: {}", DOCUMENT_PART, e)))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractionError::Decode(format!("DOCX body: {}", e)))?;

    let paragraphs = paragraphs(&xml)?;
    debug!("DOCX has {} paragraphs", paragraphs.len());

    Ok(paragraphs.join("\n"))
}

/// Collect the text of every `w:p`, honouring tabs and breaks.
fn paragraphs(xml: &str) -> Result<Vec<String>, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_paragraph = false;
    let mut in_text = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| ExtractionError::Decode(format!("DOCX XML: {}", e)))?;

        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"p" => {
                    in_paragraph = true;
                    current.clear();
                }
                b"t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"tab" if in_paragraph => current.push('\t'),
                b"br" | b"cr" if in_paragraph => current.push('\n'),
                // Self-closing empty paragraph.
                b"p" => paragraphs.push(String::new()),
                _ => {}
            },
            Event::Text(t) if in_text => {
                let text = t
                    .unescape()
                    .map_err(|e| ExtractionError::Decode(format!("DOCX text: {}", e)))?;
                current.push_str(&text);
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    in_paragraph = false;
                    paragraphs.push(std::mem::take(&mut current));
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}
