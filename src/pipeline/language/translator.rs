use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CapabilityError;

/// Translation capability. Language codes are ISO 639-3.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, from: &str, to: &str) -> Result<String, CapabilityError>;
}

/// Client for a LibreTranslate-compatible `/translate` endpoint.
pub struct LibreTranslateClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

impl LibreTranslateClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, CapabilityError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(LibreTranslateClient {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl Translator for LibreTranslateClient {
    async fn translate(&self, text: &str, from: &str, to: &str) -> Result<String, CapabilityError> {
        let source = iso639_1(from).ok_or_else(|| {
            CapabilityError::Unavailable(format!("no translation code for language '{}'", from))
        })?;
        let target = iso639_1(to).ok_or_else(|| {
            CapabilityError::Unavailable(format!("no translation code for language '{}'", to))
        })?;

        let response = self
            .client
            .post(format!("{}/translate", self.endpoint))
            .json(&TranslateRequest {
                q: text,
                source,
                target,
                format: "text",
                api_key: self.api_key.as_deref(),
            })
            .send()
            .await?
            .error_for_status()?;

        let body: TranslateResponse = response.json().await?;
        Ok(body.translated_text)
    }
}

/// Maps the ISO 639-3 codes produced by the detector to the two-letter codes
/// translation services expect.
pub fn iso639_1(code: &str) -> Option<&'static str> {
    let mapped = match code {
        "eng" => "en",
        "spa" => "es",
        "fra" => "fr",
        "deu" => "de",
        "ita" => "it",
        "por" => "pt",
        "nld" => "nl",
        "rus" => "ru",
        "ukr" => "uk",
        "pol" => "pl",
        "tur" => "tr",
        "arb" | "ara" => "ar",
        "cmn" | "zho" => "zh",
        "jpn" => "ja",
        "kor" => "ko",
        "hin" => "hi",
        "ind" => "id",
        "swe" => "sv",
        "dan" => "da",
        "fin" => "fi",
        "ell" => "el",
        "ces" => "cs",
        "hun" => "hu",
        "ron" => "ro",
        _ => return None,
    };
    Some(mapped)
}
