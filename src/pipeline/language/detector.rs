use whatlang::{detect, Lang};

use crate::error::CapabilityError;

#[derive(Debug, Clone, PartialEq)]
pub struct DetectedLanguage {
    /// ISO 639-3 code, e.g. "eng".
    pub code: String,
    pub confidence: f64,
    pub reliable: bool,
}

/// Language detection capability.
pub trait LanguageDetector: Send + Sync {
    fn detect_language(&self, text: &str) -> Result<DetectedLanguage, CapabilityError>;
}

/// Offline detector backed by `whatlang`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhatlangDetector;

impl LanguageDetector for WhatlangDetector {
    fn detect_language(&self, text: &str) -> Result<DetectedLanguage, CapabilityError> {
        let info = detect(text).ok_or_else(|| {
            CapabilityError::Unavailable("language could not be detected".to_string())
        })?;
        let lang: Lang = info.lang();
        Ok(DetectedLanguage {
            code: lang.code().to_string(),
            confidence: info.confidence(),
            reliable: info.is_reliable(),
        })
    }
}
