use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GeminiConfig;
use crate::error::GenerationError;
use crate::prompts::SessionContext;

/// Free-text generation from a prompt plus session context.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a response for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError` when the request fails or the response is
    /// empty.
    async fn generate(
        &self,
        prompt: &str,
        context: &SessionContext,
    ) -> Result<String, GenerationError>;
}

/// Gemini `generateContent` client.
#[derive(Clone, Debug)]
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    #[must_use]
    pub fn new(client: Client, config: GeminiConfig) -> Self {
        Self { client, config }
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(
        &self,
        prompt: &str,
        context: &SessionContext,
    ) -> Result<String, GenerationError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );
        let payload = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: compose_prompt(prompt, context),
                }],
            }],
            generation_config: GenerationConfig { temperature: 0.2 },
        };

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GenerationError::HttpStatus(response.status()));
        }

        let body: GenerateResponse = response.json().await?;
        let text = first_candidate_text(body).ok_or(GenerationError::EmptyResponse)?;
        debug!(model = %self.config.model, chars = text.len(), "generation complete");
        Ok(text)
    }
}

fn compose_prompt(prompt: &str, context: &SessionContext) -> String {
    format!("{prompt}\n\nSession context (JSON):\n{}", context.to_json())
}

fn first_candidate_text(body: GenerateResponse) -> Option<String> {
    let text: String = body
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .filter_map(|part| part.text)
        .collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_owned())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}
