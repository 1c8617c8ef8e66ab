#![forbid(unsafe_code)]

pub mod app_services;
pub mod config;
pub mod controller;
pub mod error;
pub mod generation;
pub mod history;
pub mod language;
pub mod prompts;
pub mod quiz;

pub use lingua_core::Clock;

pub use app_services::AppServices;
pub use config::{ControllerConfig, GeminiConfig, ServiceConfig};
pub use controller::{Collaborators, StepAction, StepController, StepEvent, StepReport};
pub use error::{
    AppServicesError, ConfigError, DetectionError, GenerationError, StepError, TranslationError,
    ValidationError,
};
pub use generation::{GeminiClient, TextGenerator};
pub use history::{HistoryLogger, NoopHistoryLogger, RepositoryHistoryLogger};
pub use language::{GoogleTranslateClient, LanguageService, Translation};
pub use prompts::SessionContext;
