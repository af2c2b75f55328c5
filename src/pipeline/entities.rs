use regex::Regex;
use tracing::debug;

use crate::config::EntityConfig;
use crate::data_model::RecognizedAction;
use crate::error::{PipelineError, Result};
use crate::utils::text::phrase_pattern;

/// Identifier and action found in a document. Each may be missing independently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedEntities {
    pub identifier: Option<String>,
    pub action: Option<RecognizedAction>,
}

/// Finds the customer identifier and the requested action in normalized text.
///
/// Both searches are first-match-wins. Actions are tried in the configured
/// priority order (by default `freeze_funds` before `release_funds`), and within
/// an action its synonyms in listed order, so a document that says both
/// "freeze" and "release" always resolves to `freeze_funds`.
pub struct EntityExtractor {
    identifier_pattern: Regex,
    action_keywords: Vec<(RecognizedAction, Vec<Regex>)>,
}

impl EntityExtractor {
    pub fn new(config: &EntityConfig) -> Result<Self> {
        let lead_ins = config
            .lead_in_phrases
            .iter()
            .map(|p| bounded_phrase(p))
            .collect::<Vec<_>>()
            .join("|");
        // lead-in, optional trailing period, punctuation, up to N words, then the digit run
        let pattern = format!(
            r"(?i)(?:{})\.?\W*(?:[^\W\d]+\W+){{0,{}}}(\d{{{},{}}})\b",
            lead_ins, config.max_token_gap, config.min_digits, config.max_digits
        );
        let identifier_pattern = Regex::new(&pattern).map_err(|e| {
            PipelineError::ConfigValidationError(format!("EntityConfig: bad lead-in pattern: {}", e))
        })?;

        let mut action_keywords = Vec::with_capacity(config.action_keywords.len());
        for entry in &config.action_keywords {
            let synonyms = entry
                .synonyms
                .iter()
                .map(|s| Regex::new(&format!("(?i){}", bounded_phrase(s))))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| {
                    PipelineError::ConfigValidationError(format!(
                        "EntityConfig: bad synonym for '{}': {}",
                        entry.action, e
                    ))
                })?;
            action_keywords.push((entry.action, synonyms));
        }

        Ok(EntityExtractor {
            identifier_pattern,
            action_keywords,
        })
    }

    pub fn extract_entities(&self, text: &str) -> ExtractedEntities {
        let entities = ExtractedEntities {
            identifier: self.find_identifier(text),
            action: self.find_action(text),
        };
        debug!(identifier = ?entities.identifier, action = ?entities.action, "Parsed entities");
        entities
    }

    fn find_identifier(&self, text: &str) -> Option<String> {
        self.identifier_pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    fn find_action(&self, text: &str) -> Option<RecognizedAction> {
        self.action_keywords
            .iter()
            .find(|(_, synonyms)| synonyms.iter().any(|re| re.is_match(text)))
            .map(|(action, _)| *action)
    }
}

/// Word boundaries only make sense next to word characters; a phrase such as
/// "ID No." ends in punctuation and must not demand a boundary after it.
fn bounded_phrase(phrase: &str) -> String {
    let trimmed = phrase.trim();
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let mut pattern = String::new();
    if trimmed.chars().next().is_some_and(is_word) {
        pattern.push_str(r"\b");
    }
    pattern.push_str(&phrase_pattern(trimmed));
    if trimmed.chars().last().is_some_and(is_word) {
        pattern.push_str(r"\b");
    }
    pattern
}
