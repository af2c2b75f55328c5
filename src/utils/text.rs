// Text utils

/// Removes every whitespace character, including those inside the value.
pub fn strip_whitespace(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Canonical lookup key for an action name: lower-cased, spaces become underscores.
/// "Freeze Funds" -> "freeze_funds".
pub fn canonical_action_key(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Builds a case-insensitive regex fragment for a multi-word phrase, tolerating
/// any run of whitespace between words.
pub fn phrase_pattern(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+")
}
