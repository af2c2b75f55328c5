use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{PipelineError, Result};

const DOCUMENT_PART: &str = "word/document.xml";

/// Extracts paragraph text from a `.docx` package, one line per `<w:p>`, in document order.
pub fn extract_docx_text(bytes: &[u8]) -> Result<String> {
    let cursor = Cursor::new(bytes);
    let mut archive = zip::ZipArchive::new(cursor)
        .map_err(|e| PipelineError::decode_failure("DOCX", format!("Failed to open package: {}", e)))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| PipelineError::decode_failure("DOCX", format!("Missing {}: {}", DOCUMENT_PART, e)))?
        .read_to_string(&mut xml)
        .map_err(|e| PipelineError::decode_failure("DOCX", e))?;

    paragraphs_from_xml(&xml).map(|paragraphs| paragraphs.join("\n"))
}

/// Paragraphs come out in the order their `<w:p>` opens. A paragraph nested in a
/// text box gets its own line after the paragraph that holds it.
fn paragraphs_from_xml(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);

    let mut paragraphs: Vec<String> = Vec::new();
    // indices into `paragraphs` of the currently open <w:p> elements
    let mut open: Vec<usize> = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"p" => {
                    open.push(paragraphs.len());
                    paragraphs.push(String::new());
                }
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"p" => paragraphs.push(String::new()),
                b"tab" => push_to_open(&mut paragraphs, &open, "\t"),
                b"br" | b"cr" => push_to_open(&mut paragraphs, &open, "\n"),
                _ => {}
            },
            Ok(Event::Text(ref t)) if in_text => {
                let text = t
                    .unescape()
                    .map_err(|e| PipelineError::decode_failure("DOCX", e))?;
                push_to_open(&mut paragraphs, &open, &text);
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    open.pop();
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(PipelineError::decode_failure(
                    "DOCX",
                    format!("Malformed {} at byte {}: {}", DOCUMENT_PART, reader.buffer_position(), e),
                ))
            }
            _ => {}
        }
    }

    Ok(paragraphs)
}

fn push_to_open(paragraphs: &mut [String], open: &[usize], text: &str) {
    if let Some(&idx) = open.last() {
        paragraphs[idx].push_str(text);
    }
}
