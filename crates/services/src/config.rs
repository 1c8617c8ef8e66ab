use std::env;
use std::time::Duration;

use lingua_core::model::DEFAULT_MAX_TURNS;

use crate::error::ConfigError;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_TRANSLATE_BASE_URL: &str = "https://translate.googleapis.com";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_QUIZ_QUESTIONS: u32 = 3;
/// Turns of history included in prompt context.
pub const DEFAULT_CONTEXT_TURNS: usize = 5;

/// Credentials and endpoint for the Gemini text generator.
#[derive(Clone)]
pub struct GeminiConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .finish()
    }
}

/// Knobs for the step controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    pub quiz_questions: u32,
    pub max_turns: usize,
    pub context_turns: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            quiz_questions: DEFAULT_QUIZ_QUESTIONS,
            max_turns: DEFAULT_MAX_TURNS,
            context_turns: DEFAULT_CONTEXT_TURNS,
        }
    }
}

/// Everything the services need at process start.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub gemini: GeminiConfig,
    pub translate_base_url: String,
    pub http_timeout: Duration,
    pub controller: ControllerConfig,
}

impl ServiceConfig {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingApiKey` when `GEMINI_API_KEY` is unset or
    /// blank, and `ConfigError::Invalid` for unparsable numeric settings.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env`, reading values through `lookup`.
    ///
    /// # Errors
    ///
    /// See `from_env`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup("GEMINI_API_KEY")
            .map(|k| k.trim().to_owned())
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let gemini = GeminiConfig {
            base_url: lookup("LINGUA_GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.into()),
            api_key,
            model: lookup("LINGUA_GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.into()),
        };

        let http_timeout = parse_or(&lookup, "LINGUA_HTTP_TIMEOUT_SECS", 30_u64)
            .and_then(|secs| positive("LINGUA_HTTP_TIMEOUT_SECS", secs))
            .map(Duration::from_secs)?;
        let quiz_questions = parse_or(&lookup, "LINGUA_QUIZ_QUESTIONS", DEFAULT_QUIZ_QUESTIONS)
            .and_then(|n| positive("LINGUA_QUIZ_QUESTIONS", n))?;
        let max_turns = parse_or(&lookup, "LINGUA_MAX_TURNS", DEFAULT_MAX_TURNS)
            .and_then(|n| positive("LINGUA_MAX_TURNS", n))?;

        Ok(Self {
            gemini,
            translate_base_url: lookup("LINGUA_TRANSLATE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_TRANSLATE_BASE_URL.into()),
            http_timeout,
            controller: ControllerConfig {
                quiz_questions,
                max_turns,
                context_turns: DEFAULT_CONTEXT_TURNS,
            },
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

fn positive<T: Default + PartialOrd + ToString>(key: &'static str, value: T) -> Result<T, ConfigError> {
    if value > T::default() {
        Ok(value)
    } else {
        Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        })
    }
}
