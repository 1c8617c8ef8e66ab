use std::sync::Arc;

use reqwest::Client;
use tracing::info;

use lingua_core::model::{LearnerProfile, Session, SessionId};
use lingua_core::time::Clock;
use storage::repository::Storage;

use crate::config::{ControllerConfig, ServiceConfig};
use crate::controller::{Collaborators, StepController};
use crate::error::{AppServicesError, ConfigError};
use crate::generation::{GeminiClient, TextGenerator};
use crate::history::{HistoryLogger, RepositoryHistoryLogger};
use crate::language::{GoogleTranslateClient, LanguageService};

/// Assembles the shared services and hands out one controller per session.
#[derive(Clone)]
pub struct AppServices {
    services: Collaborators,
    controller: ControllerConfig,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and the HTTP adapters.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the HTTP client cannot be built or
    /// storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        config: ServiceConfig,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::with_storage(storage, config, clock)
    }

    /// Build the HTTP adapters over an existing storage backend.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Config` if the HTTP client cannot be built.
    pub fn with_storage(
        storage: Storage,
        config: ServiceConfig,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        let language: Arc<dyn LanguageService> = Arc::new(GoogleTranslateClient::new(
            client.clone(),
            config.translate_base_url,
        ));
        let gemini = GeminiClient::new(client, config.gemini);
        info!(model = gemini.model(), "text generator ready");
        let generator: Arc<dyn TextGenerator> = Arc::new(gemini);
        let history: Arc<dyn HistoryLogger> = Arc::new(RepositoryHistoryLogger::new(
            clock,
            Arc::clone(&storage.history),
            Arc::clone(&storage.analytics),
        ));

        Ok(Self::from_parts(
            Collaborators {
                language,
                generator,
                history,
                clock,
            },
            config.controller,
        ))
    }

    #[must_use]
    pub fn from_parts(services: Collaborators, controller: ControllerConfig) -> Self {
        Self {
            services,
            controller,
        }
    }

    /// Start a fresh session at `SetGoal`.
    #[must_use]
    pub fn new_session(&self, profile: LearnerProfile) -> StepController {
        let session = Session::new(SessionId::random(), profile, self.services.clock.now())
            .with_max_turns(self.controller.max_turns);
        StepController::new(session, self.services.clone(), self.controller)
    }
}
