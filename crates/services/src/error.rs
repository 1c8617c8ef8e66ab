//! Shared error types for the services crate.

use thiserror::Error;

use lingua_core::model::{ProfileError, SessionUpdateError, StepId};

/// Learner input the current step cannot accept. Recovered by re-prompting.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("empty goal")]
    EmptyGoal,
    #[error("input cannot be empty")]
    EmptyInput,
    #[error("event targets {got} but the session is at {expected}")]
    StaleStep { expected: StepId, got: StepId },
    #[error("{action} is not available during {step}")]
    UnsupportedAction { step: StepId, action: &'static str },
    #[error("no input is expected during {0}")]
    NoInputExpected(StepId),
    #[error("already at the first step")]
    AtFirstStep,
    #[error("no quiz question is pending")]
    NoPendingQuestion,
    #[error("'{answer}' does not match any of the {options} options")]
    UnknownOption { answer: String, options: usize },
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Session(#[from] SessionUpdateError),
}

/// Language detection failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DetectionError {
    #[error("no text to detect")]
    EmptyText,
    #[error("language could not be determined")]
    Undetermined,
    #[error("detection request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("unexpected detection response: {0}")]
    Malformed(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Translation failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TranslationError {
    #[error("no text to translate")]
    EmptyText,
    #[error("translation request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("unexpected translation response: {0}")]
    Malformed(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Text generation failed, or returned something unusable.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerationError {
    #[error("text generation returned an empty response")]
    EmptyResponse,
    #[error("text generation request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("could not use generated text: {0}")]
    Malformed(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Missing or invalid startup configuration. Fatal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
    #[error("could not build HTTP client: {0}")]
    HttpClient(String),
}

/// Everything a single step can fail with. Session state is unchanged in
/// every case.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StepError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Detection(#[from] DetectionError),
    #[error(transparent)]
    Translation(#[from] TranslationError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

impl From<ProfileError> for StepError {
    fn from(value: ProfileError) -> Self {
        Self::Validation(value.into())
    }
}

impl From<SessionUpdateError> for StepError {
    fn from(value: SessionUpdateError) -> Self {
        Self::Validation(value.into())
    }
}

impl StepError {
    /// Short category label for presenters and logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            StepError::Validation(_) => "validation",
            StepError::Detection(_) => "detection",
            StepError::Translation(_) => "translation",
            StepError::Generation(_) => "generation",
        }
    }
}

/// Failure assembling the application services at startup.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Storage(#[from] storage::sqlite::SqliteInitError),
}
