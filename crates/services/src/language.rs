use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use lingua_core::model::LanguageCode;

use crate::error::{DetectionError, TranslationError};

/// Result of translating one utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub text: String,
    /// Source language as reported by the translator, if any.
    pub detected_source: Option<LanguageCode>,
}

/// Language detection and translation.
#[async_trait]
pub trait LanguageService: Send + Sync {
    /// Identify the language `text` is written in.
    ///
    /// # Errors
    ///
    /// Returns `DetectionError::EmptyText` for blank input and
    /// `DetectionError::Undetermined` when no language can be identified.
    async fn detect(&self, text: &str) -> Result<LanguageCode, DetectionError>;

    /// Translate `text` into `target`. `source` of `None` lets the service
    /// detect it.
    ///
    /// # Errors
    ///
    /// Returns `TranslationError` when the request fails or the response is
    /// unusable.
    async fn translate(
        &self,
        text: &str,
        source: Option<&LanguageCode>,
        target: &LanguageCode,
    ) -> Result<Translation, TranslationError>;
}

/// Language a practice utterance is translated into.
///
/// A learner writing in the language they study gets a translation into the
/// reference language (English, or Spanish when English is the one studied).
/// Anything else is translated into the studied language.
#[must_use]
pub fn translation_target(
    writes_in: Option<&LanguageCode>,
    studying: &LanguageCode,
) -> LanguageCode {
    if !writes_in.is_some_and(|code| code.same_language(studying)) {
        return studying.clone();
    }
    let reference = LanguageCode::reference();
    if reference.same_language(studying) {
        LanguageCode::default_target()
    } else {
        reference
    }
}

/// Client for the public Google Translate web endpoint (`client=gtx`).
#[derive(Clone, Debug)]
pub struct GoogleTranslateClient {
    client: Client,
    base_url: String,
}

impl GoogleTranslateClient {
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn request(&self, text: &str, source: &str, target: &str) -> Result<Value, reqwest::Error> {
        let url = format!("{}/translate_a/single", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(url)
            .query(&[
                ("client", "gtx"),
                ("sl", source),
                ("tl", target),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?
            .error_for_status()?;
        response.json().await
    }
}

#[async_trait]
impl LanguageService for GoogleTranslateClient {
    async fn detect(&self, text: &str) -> Result<LanguageCode, DetectionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DetectionError::EmptyText);
        }
        let body = self
            .request(text, "auto", "en")
            .await
            .map_err(detection_http_error)?;
        let code = parse_detected_language(&body).ok_or(DetectionError::Undetermined)?;
        debug!(language = %code, "language detected");
        Ok(code)
    }

    async fn translate(
        &self,
        text: &str,
        source: Option<&LanguageCode>,
        target: &LanguageCode,
    ) -> Result<Translation, TranslationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TranslationError::EmptyText);
        }
        let source = source.map_or("auto", LanguageCode::as_str);
        let body = self
            .request(text, source, target.as_str())
            .await
            .map_err(translation_http_error)?;
        let translated = parse_translated_text(&body).ok_or_else(|| {
            TranslationError::Malformed("no translated segments in response".into())
        })?;
        debug!(source, target = %target, "utterance translated");
        Ok(Translation {
            text: translated,
            detected_source: parse_detected_language(&body),
        })
    }
}

fn detection_http_error(err: reqwest::Error) -> DetectionError {
    match err.status() {
        Some(status) => DetectionError::HttpStatus(status),
        None if err.is_decode() => DetectionError::Malformed(err.to_string()),
        None => DetectionError::Http(err),
    }
}

fn translation_http_error(err: reqwest::Error) -> TranslationError {
    match err.status() {
        Some(status) => TranslationError::HttpStatus(status),
        None if err.is_decode() => TranslationError::Malformed(err.to_string()),
        None => TranslationError::Http(err),
    }
}

/// Concatenates the translated segments at `body[0][i][0]`.
fn parse_translated_text(body: &Value) -> Option<String> {
    let segments = body.get(0)?.as_array()?;
    let text: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_owned())
}

/// Reads the source language at `body[2]`; `und` means undetermined.
fn parse_detected_language(body: &Value) -> Option<LanguageCode> {
    let raw = body.get(2)?.as_str()?;
    if raw.eq_ignore_ascii_case("und") {
        return None;
    }
    LanguageCode::new(raw).ok()
}
