// src/pipeline/extract/mod.rs

mod docx;
mod ocr;
mod pdf;

pub use docx::extract_docx_text;
pub use ocr::{TesseractRecognizer, TextRecognizer};
pub use pdf::extract_pdf_text;

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::data_model::{DocumentFormat, RawDocument};
use crate::error::{PipelineError, Result};

/// Turns raw document bytes into plain text, dispatching on the declared format.
pub struct ContentExtractor {
    recognizer: Arc<dyn TextRecognizer>,
}

impl ContentExtractor {
    pub fn new(recognizer: Arc<dyn TextRecognizer>) -> Self {
        ContentExtractor { recognizer }
    }

    #[instrument(skip(self, document), fields(file_name = %document.file_name, format = document.format.label(), size = document.bytes.len()))]
    pub async fn extract(&self, document: &RawDocument) -> Result<String> {
        let label = document.format.label().to_string();
        let text = match &document.format {
            DocumentFormat::Unsupported(suffix) => {
                return Err(PipelineError::UnsupportedFormat {
                    suffix: suffix.clone(),
                })
            }
            DocumentFormat::Pdf => {
                // pdf-extract is CPU bound and can panic on malformed input.
                let bytes = document.bytes.clone();
                tokio::task::spawn_blocking(move || extract_pdf_text(&bytes))
                    .await
                    .map_err(|e| PipelineError::decode_failure(&label, format!("PDF decoder aborted: {}", e)))??
            }
            DocumentFormat::Docx => extract_docx_text(&document.bytes)?,
            DocumentFormat::PlainText => String::from_utf8(document.bytes.clone())
                .map_err(|e| PipelineError::decode_failure(&label, e))?,
            DocumentFormat::Image => self
                .recognizer
                .recognize_text(&document.bytes)
                .await
                .map_err(|e| PipelineError::decode_failure(&label, e))?,
        };

        if text.trim().is_empty() {
            return Err(PipelineError::decode_failure(
                &label,
                "document contains no extractable text",
            ));
        }

        debug!(chars = text.len(), "Extracted text");
        Ok(text)
    }
}
