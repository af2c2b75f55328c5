// src/config.rs
use crate::data_model::RecognizedAction;
use crate::error::{PipelineError, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub mod args;

// --- Application Configuration ---

/// Represents the overall service configuration read from YAML.
/// Every section falls back to its defaults when omitted.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub language: LanguageConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub entities: EntityConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        self.registry.validate()?;
        self.language.validate()?;
        self.ocr.validate()?;
        self.entities.validate()?;
        self.server.validate()?;
        Ok(())
    }
}

/// Locations of the customer and action reference tables.
#[derive(Deserialize, Debug, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    pub customers_path: PathBuf,
    pub actions_path: PathBuf,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            customers_path: PathBuf::from("data/customers.csv"),
            actions_path: PathBuf::from("data/actions.csv"),
        }
    }
}

impl RegistryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.customers_path.as_os_str().is_empty() {
            return Err(PipelineError::ConfigValidationError(
                "RegistryConfig: customers_path cannot be empty".to_string(),
            ));
        }
        if self.actions_path.as_os_str().is_empty() {
            return Err(PipelineError::ConfigValidationError(
                "RegistryConfig: actions_path cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// Parameters for language detection and translation
#[derive(Deserialize, Debug, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct LanguageConfig {
    /// ISO 639-3 code of the language entity extraction expects.
    pub target_language: String,
    pub min_confidence: f64,
    /// Base URL of a LibreTranslate-compatible service. Translation is skipped when unset.
    pub translation_endpoint: Option<String>,
    pub translation_api_key: Option<String>,
    pub translation_timeout_secs: u64,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        LanguageConfig {
            target_language: "eng".to_string(),
            min_confidence: 0.5,
            translation_endpoint: None,
            translation_api_key: None,
            translation_timeout_secs: 10,
        }
    }
}

impl LanguageConfig {
    pub fn validate(&self) -> Result<()> {
        if self.target_language.len() != 3
            || !self.target_language.chars().all(|c| c.is_ascii_lowercase())
        {
            return Err(PipelineError::ConfigValidationError(format!(
                "LanguageConfig: target_language must be a lower-case ISO 639-3 code, got '{}'",
                self.target_language
            )));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(PipelineError::ConfigValidationError(format!(
                "LanguageConfig: min_confidence must be between 0.0 and 1.0, got {}",
                self.min_confidence
            )));
        }
        if let Some(endpoint) = &self.translation_endpoint {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(PipelineError::ConfigValidationError(format!(
                    "LanguageConfig: translation_endpoint must be an http(s) URL, got '{}'",
                    endpoint
                )));
            }
        }
        if self.translation_timeout_secs == 0 {
            return Err(PipelineError::ConfigValidationError(
                "LanguageConfig: translation_timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

// Parameters for the OCR engine
#[derive(Deserialize, Debug, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct OcrConfig {
    pub tesseract_binary: PathBuf,
    /// Tesseract language pack(s), e.g. "eng" or "eng+fra".
    pub language: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        OcrConfig {
            tesseract_binary: PathBuf::from("tesseract"),
            language: "eng".to_string(),
        }
    }
}

impl OcrConfig {
    pub fn validate(&self) -> Result<()> {
        if self.tesseract_binary.as_os_str().is_empty() {
            return Err(PipelineError::ConfigValidationError(
                "OcrConfig: tesseract_binary cannot be empty".to_string(),
            ));
        }
        if self.language.trim().is_empty() {
            return Err(PipelineError::ConfigValidationError(
                "OcrConfig: language cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Synonyms for one canonical action. Both the list order and the order of
/// entries inside `EntityConfig::action_keywords` are match priority.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ActionKeywords {
    pub action: RecognizedAction,
    pub synonyms: Vec<String>,
}

// Parameters for the entity extractor
#[derive(Deserialize, Debug, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct EntityConfig {
    pub lead_in_phrases: Vec<String>,
    pub min_digits: usize,
    pub max_digits: usize,
    /// Words allowed between a lead-in phrase and the digit run.
    pub max_token_gap: usize,
    pub action_keywords: Vec<ActionKeywords>,
}

impl Default for EntityConfig {
    fn default() -> Self {
        let words = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        EntityConfig {
            lead_in_phrases: words(&["national id", "id no", "identification number"]),
            min_digits: 8,
            max_digits: 20,
            max_token_gap: 3,
            action_keywords: vec![
                ActionKeywords {
                    action: RecognizedAction::FreezeFunds,
                    synonyms: words(&["freeze", "block", "hold", "suspend", "restrict"]),
                },
                ActionKeywords {
                    action: RecognizedAction::ReleaseFunds,
                    synonyms: words(&["release", "unfreeze", "unblock", "unhold", "restore"]),
                },
            ],
        }
    }
}

impl EntityConfig {
    pub fn validate(&self) -> Result<()> {
        if self.lead_in_phrases.is_empty()
            || self.lead_in_phrases.iter().any(|p| p.trim().is_empty())
        {
            return Err(PipelineError::ConfigValidationError(
                "EntityConfig: lead_in_phrases must contain at least one non-empty phrase"
                    .to_string(),
            ));
        }
        if self.min_digits == 0 {
            return Err(PipelineError::ConfigValidationError(
                "EntityConfig: min_digits must be greater than 0".to_string(),
            ));
        }
        if self.min_digits > self.max_digits {
            return Err(PipelineError::ConfigValidationError(format!(
                "EntityConfig: min_digits ({}) cannot be greater than max_digits ({})",
                self.min_digits, self.max_digits
            )));
        }
        if self.action_keywords.is_empty() {
            return Err(PipelineError::ConfigValidationError(
                "EntityConfig: action_keywords cannot be empty".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for (idx, entry) in self.action_keywords.iter().enumerate() {
            if !seen.insert(entry.action) {
                return Err(PipelineError::ConfigValidationError(format!(
                    "EntityConfig: action '{}' listed more than once (index {})",
                    entry.action, idx
                )));
            }
            if entry.synonyms.is_empty() || entry.synonyms.iter().any(|s| s.trim().is_empty()) {
                return Err(PipelineError::ConfigValidationError(format!(
                    "EntityConfig: action '{}' needs at least one non-empty synonym",
                    entry.action
                )));
            }
        }
        Ok(())
    }
}

// Parameters for the HTTP surface
#[derive(Deserialize, Debug, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind_address: String,
    pub max_upload_bytes: usize,
    pub request_timeout_secs: u64,
    pub enable_metrics: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_address: "127.0.0.1:8000".to_string(),
            max_upload_bytes: 20 * 1024 * 1024,
            request_timeout_secs: 60,
            enable_metrics: true,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.bind_address.parse::<std::net::SocketAddr>().is_err() {
            return Err(PipelineError::ConfigValidationError(format!(
                "ServerConfig: bind_address '{}' is not a valid socket address",
                self.bind_address
            )));
        }
        if self.max_upload_bytes == 0 {
            return Err(PipelineError::ConfigValidationError(
                "ServerConfig: max_upload_bytes must be greater than 0".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(PipelineError::ConfigValidationError(
                "ServerConfig: request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Loads, parses and validates the application configuration YAML file.
pub fn load_app_config<P: AsRef<Path>>(config_path: P) -> Result<AppConfig> {
    let path_ref = config_path.as_ref();
    let config_content = fs::read_to_string(path_ref).map_err(|e| {
        PipelineError::ConfigError(format!(
            "Failed to read config file '{}': {}",
            path_ref.display(),
            e
        ))
    })?;

    let config: AppConfig = serde_yaml::from_str(&config_content).map_err(|e| {
        PipelineError::ConfigError(format!(
            "Failed to parse config YAML from '{}': {}",
            path_ref.display(),
            e
        ))
    })?;

    config.validate()?;

    Ok(config)
}
