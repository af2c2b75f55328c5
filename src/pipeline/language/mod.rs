// src/pipeline/language/mod.rs

mod detector;
mod translator;

pub use detector::{DetectedLanguage, LanguageDetector, WhatlangDetector};
pub use translator::{iso639_1, LibreTranslateClient, Translator};

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::utils::prometheus_metrics::TRANSLATION_FAILURES_TOTAL;

/// Brings extracted text into the target language before entity extraction.
///
/// Never fails: anything that goes wrong during detection or translation
/// leaves the text as it was.
pub struct LanguageNormalizer {
    detector: Arc<dyn LanguageDetector>,
    translator: Option<Arc<dyn Translator>>,
    target_language: String,
    min_confidence: f64,
}

impl LanguageNormalizer {
    pub fn new(
        detector: Arc<dyn LanguageDetector>,
        translator: Option<Arc<dyn Translator>>,
        target_language: impl Into<String>,
        min_confidence: f64,
    ) -> Self {
        LanguageNormalizer {
            detector,
            translator,
            target_language: target_language.into(),
            min_confidence,
        }
    }

    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    #[instrument(skip(self, text), fields(chars = text.len(), target = %self.target_language))]
    pub async fn normalize(&self, text: &str) -> String {
        let detected = match self.detector.detect_language(text) {
            Ok(detected) => detected,
            Err(e) => {
                debug!(error = %e, "Language detection failed, keeping text as is");
                return text.to_string();
            }
        };

        if detected.code == self.target_language {
            debug!(language = %detected.code, "Text already in target language");
            return text.to_string();
        }
        if !detected.reliable || detected.confidence < self.min_confidence {
            debug!(
                language = %detected.code,
                confidence = detected.confidence,
                min_confidence = self.min_confidence,
                "Detection not confident enough to translate"
            );
            return text.to_string();
        }

        let Some(translator) = &self.translator else {
            debug!(language = %detected.code, "No translator configured, keeping text as is");
            return text.to_string();
        };

        match translator
            .translate(text, &detected.code, &self.target_language)
            .await
        {
            Ok(translated) => {
                info!(from = %detected.code, "Translated document text");
                translated
            }
            Err(e) => {
                warn!(from = %detected.code, error = %e, "Translation failed, using original text");
                TRANSLATION_FAILURES_TOTAL.inc();
                text.to_string()
            }
        }
    }
}
