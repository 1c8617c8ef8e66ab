use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use lingua_core::SessionAnalytics;
use lingua_core::model::{SessionId, SessionMetadata, Turn};
use lingua_core::time::Clock;
use storage::repository::{AnalyticsRepository, AnalyticsSnapshot, HistoryRecord, HistoryRepository};

/// Durable record of learner activity. Fire-and-forget: implementations log
/// their own failures and never report them to the caller.
#[async_trait]
pub trait HistoryLogger: Send + Sync {
    async fn append(&self, turn: &Turn, metadata: &SessionMetadata);

    /// Persist a progress snapshot. Default does nothing.
    async fn snapshot(&self, _session_id: SessionId, _analytics: &SessionAnalytics) {}
}

/// Logger that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHistoryLogger;

#[async_trait]
impl HistoryLogger for NoopHistoryLogger {
    async fn append(&self, _turn: &Turn, _metadata: &SessionMetadata) {}
}

/// Logger backed by the storage repositories.
#[derive(Clone)]
pub struct RepositoryHistoryLogger {
    clock: Clock,
    history: Arc<dyn HistoryRepository>,
    analytics: Arc<dyn AnalyticsRepository>,
}

impl RepositoryHistoryLogger {
    #[must_use]
    pub fn new(
        clock: Clock,
        history: Arc<dyn HistoryRepository>,
        analytics: Arc<dyn AnalyticsRepository>,
    ) -> Self {
        Self {
            clock,
            history,
            analytics,
        }
    }
}

#[async_trait]
impl HistoryLogger for RepositoryHistoryLogger {
    async fn append(&self, turn: &Turn, metadata: &SessionMetadata) {
        let record = HistoryRecord::from_turn(turn, metadata);
        match self.history.append_record(&record).await {
            Ok(id) => debug!(session = %metadata.session_id, id, "turn logged"),
            Err(err) => warn!(session = %metadata.session_id, error = %err, "failed to log turn"),
        }
    }

    async fn snapshot(&self, session_id: SessionId, analytics: &SessionAnalytics) {
        let snapshot = AnalyticsSnapshot {
            session_id,
            captured_at: self.clock.now(),
            analytics: analytics.clone(),
        };
        if let Err(err) = self.analytics.save_snapshot(&snapshot).await {
            warn!(session = %session_id, error = %err, "failed to save analytics snapshot");
        }
    }
}
