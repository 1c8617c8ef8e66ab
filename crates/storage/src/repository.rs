use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lingua_core::SessionAnalytics;
use lingua_core::model::{LanguageCode, SessionId, SessionMetadata, StepId, Turn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid stored value: {0}")]
    Domain(#[from] lingua_core::Error),
}

/// Persisted shape of one logged turn, flattened with its session context.
///
/// Keeps the storage layout independent from the in-memory `Turn`, which
/// has no public constructor for arbitrary field combinations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub session_id: SessionId,
    pub step: StepId,
    pub goal: Option<String>,
    pub source_language: Option<LanguageCode>,
    pub target_language: Option<LanguageCode>,
    pub raw_input: String,
    pub detected_language: Option<LanguageCode>,
    pub translated_text: Option<String>,
    pub grammar_note: Option<String>,
    pub is_quiz_answer: bool,
    pub is_correct: Option<bool>,
    pub recorded_at: DateTime<Utc>,
}

impl HistoryRecord {
    #[must_use]
    pub fn from_turn(turn: &Turn, metadata: &SessionMetadata) -> Self {
        Self {
            session_id: metadata.session_id,
            step: metadata.step,
            goal: metadata.goal.clone(),
            source_language: metadata.source_language.clone(),
            target_language: metadata.target_language.clone(),
            raw_input: turn.raw_input().to_owned(),
            detected_language: turn.detected_language().cloned(),
            translated_text: turn.translated_text().map(str::to_owned),
            grammar_note: turn.grammar_note().map(str::to_owned),
            is_quiz_answer: turn.is_quiz_answer(),
            is_correct: turn.is_correct(),
            recorded_at: turn.recorded_at(),
        }
    }
}

/// A stored analytics snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsSnapshot {
    pub session_id: SessionId,
    pub captured_at: DateTime<Utc>,
    pub analytics: SessionAnalytics,
}

/// Append-only log of learner turns.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Append one record and return its row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn append_record(&self, record: &HistoryRecord) -> Result<i64, StorageError>;

    /// All records of a session, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn records_for_session(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<HistoryRecord>, StorageError>;
}

/// Analytics snapshots taken when a learner views progress.
#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    /// Persist a snapshot and return its row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be serialized or stored.
    async fn save_snapshot(&self, snapshot: &AnalyticsSnapshot) -> Result<i64, StorageError>;

    /// Most recent snapshot for a session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the session has none.
    async fn latest_snapshot(
        &self,
        session_id: SessionId,
    ) -> Result<AnalyticsSnapshot, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    history: Arc<Mutex<Vec<HistoryRecord>>>,
    snapshots: Arc<Mutex<HashMap<SessionId, Vec<AnalyticsSnapshot>>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryRepository for InMemoryRepository {
    async fn append_record(&self, record: &HistoryRecord) -> Result<i64, StorageError> {
        let mut guard = self
            .history
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.push(record.clone());
        i64::try_from(guard.len()).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    async fn records_for_session(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<HistoryRecord>, StorageError> {
        let guard = self
            .history
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .iter()
            .filter(|r| r.session_id == session_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AnalyticsRepository for InMemoryRepository {
    async fn save_snapshot(&self, snapshot: &AnalyticsSnapshot) -> Result<i64, StorageError> {
        let mut guard = self
            .snapshots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let entries = guard.entry(snapshot.session_id).or_default();
        entries.push(snapshot.clone());
        i64::try_from(entries.len()).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    async fn latest_snapshot(
        &self,
        session_id: SessionId,
    ) -> Result<AnalyticsSnapshot, StorageError> {
        let guard = self
            .snapshots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .get(&session_id)
            .and_then(|entries| entries.last())
            .cloned()
            .ok_or(StorageError::NotFound)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub history: Arc<dyn HistoryRepository>,
    pub analytics: Arc<dyn AnalyticsRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let history: Arc<dyn HistoryRepository> = Arc::new(repo.clone());
        let analytics: Arc<dyn AnalyticsRepository> = Arc::new(repo);
        Self { history, analytics }
    }
}
