// Shared fixtures for the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use zip::write::SimpleFileOptions;

use DocDispatch::config::AppConfig;
use DocDispatch::data_model::{CustomerRef, RecognizedAction};
use DocDispatch::error::CapabilityError;
use DocDispatch::executor::PipelineExecutor;
use DocDispatch::pipeline::dispatch::{freeze_funds, release_funds, ActionCatalog, HandlerRegistry};
use DocDispatch::pipeline::extract::TextRecognizer;
use DocDispatch::pipeline::language::{DetectedLanguage, LanguageDetector, Translator};
use DocDispatch::pipeline::matcher::CustomerRegistry;
use DocDispatch::service_logic::{build_pipeline, Services};

/// Builds a one-page PDF whose text layer holds `line`.
pub fn single_page_pdf(line: &str) -> Vec<u8> {
    let escaped = line
        .replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)");
    let content = format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", escaped);
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >>".to_string(),
        format!("<< /Length {} >>\nstream\n{}\nendstream", content.len(), content),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>".to_string(),
    ];

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }
    let xref_at = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for offset in offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_at
        )
        .as_bytes(),
    );
    out
}

/// Packs paragraphs into a minimal `.docx` container.
pub fn docx_with_paragraphs(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", p))
        .collect();
    let xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:body>{}</w:body></w:document>",
        body
    );
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("word/document.xml", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(xml.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

/// OCR stand-in returning canned text, counting how often it was asked.
pub struct MockRecognizer {
    pub reply: Result<String, String>,
    pub calls: AtomicUsize,
}

impl MockRecognizer {
    pub fn replying(text: &str) -> Arc<Self> {
        Arc::new(MockRecognizer {
            reply: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(MockRecognizer {
            reply: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextRecognizer for MockRecognizer {
    fn name(&self) -> &'static str {
        "mock-ocr"
    }

    async fn recognize_text(&self, _image: &[u8]) -> Result<String, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone().map_err(|message| CapabilityError::Engine {
            engine: "mock-ocr",
            message,
        })
    }
}

/// Detector that always reports the same language.
pub struct FixedDetector(pub &'static str);

impl LanguageDetector for FixedDetector {
    fn detect_language(&self, _text: &str) -> Result<DetectedLanguage, CapabilityError> {
        Ok(DetectedLanguage {
            code: self.0.to_string(),
            confidence: 0.99,
            reliable: true,
        })
    }
}

/// Translator that replaces the whole text with a canned translation.
pub struct CannedTranslator {
    pub translation: Option<String>,
    pub calls: AtomicUsize,
}

impl CannedTranslator {
    pub fn new(translation: Option<&str>) -> Arc<Self> {
        Arc::new(CannedTranslator {
            translation: translation.map(str::to_string),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Translator for CannedTranslator {
    async fn translate(&self, _text: &str, _from: &str, _to: &str) -> Result<String, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.translation
            .clone()
            .ok_or_else(|| CapabilityError::Unavailable("translation service offline".into()))
    }
}

/// Counts handler invocations per action.
#[derive(Default)]
pub struct HandlerCalls {
    pub freeze: AtomicUsize,
    pub release: AtomicUsize,
}

impl HandlerCalls {
    pub fn total(&self) -> usize {
        self.freeze.load(Ordering::SeqCst) + self.release.load(Ordering::SeqCst)
    }
}

pub fn counting_handlers(calls: Arc<HandlerCalls>) -> HandlerRegistry {
    let freeze_calls = calls.clone();
    let release_calls = calls;
    HandlerRegistry::default()
        .with_handler(RecognizedAction::FreezeFunds, move |c: &CustomerRef| {
            freeze_calls.freeze.fetch_add(1, Ordering::SeqCst);
            freeze_funds(c)
        })
        .with_handler(RecognizedAction::ReleaseFunds, move |c: &CustomerRef| {
            release_calls.release.fetch_add(1, Ordering::SeqCst);
            release_funds(c)
        })
}

/// Everything a test pipeline needs, with capability providers swappable.
pub struct Harness {
    pub recognizer: Arc<MockRecognizer>,
    pub detector: Arc<dyn LanguageDetector>,
    pub translator: Option<Arc<dyn Translator>>,
    pub calls: Arc<HandlerCalls>,
    pub actions: Vec<&'static str>,
    pub customers: Vec<(&'static str, &'static str)>,
}

impl Default for Harness {
    fn default() -> Self {
        Harness {
            recognizer: MockRecognizer::replying("Freeze funds for National ID 1234567890"),
            detector: Arc::new(FixedDetector("eng")),
            translator: None,
            calls: Arc::new(HandlerCalls::default()),
            actions: vec!["Freeze Funds", "Release Funds"],
            customers: vec![("1234567890", "CUST001"), ("9876543210", "CUST002")],
        }
    }
}

impl Harness {
    pub fn services(&self) -> Services {
        let registry = CustomerRegistry::from_rows(self.customers.iter().copied());
        let catalog = ActionCatalog::from_action_names(
            self.actions.iter().copied(),
            &counting_handlers(self.calls.clone()),
        );
        Services::with_capabilities(
            &AppConfig::default(),
            registry,
            catalog,
            self.recognizer.clone(),
            self.detector.clone(),
            self.translator.clone(),
        )
        .expect("default configuration builds")
    }

    pub fn executor(&self) -> Arc<PipelineExecutor> {
        Arc::new(PipelineExecutor::new(build_pipeline(&self.services())))
    }
}
