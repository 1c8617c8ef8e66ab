use lingua_core::model::SessionId;
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{ser, session_id_from_str},
};
use crate::repository::{AnalyticsRepository, AnalyticsSnapshot, StorageError};

#[async_trait::async_trait]
impl AnalyticsRepository for SqliteRepository {
    async fn save_snapshot(&self, snapshot: &AnalyticsSnapshot) -> Result<i64, StorageError> {
        let payload = serde_json::to_string(&snapshot.analytics).map_err(ser)?;

        let res = sqlx::query(
            r"
                INSERT INTO analytics_snapshots (session_id, captured_at, payload)
                VALUES (?1, ?2, ?3)
            ",
        )
        .bind(snapshot.session_id.to_string())
        .bind(snapshot.captured_at)
        .bind(payload)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(res.last_insert_rowid())
    }

    async fn latest_snapshot(
        &self,
        session_id: SessionId,
    ) -> Result<AnalyticsSnapshot, StorageError> {
        let row = sqlx::query(
            r"
                SELECT session_id, captured_at, payload
                FROM analytics_snapshots
                WHERE session_id = ?1
                ORDER BY captured_at DESC, id DESC
                LIMIT 1
            ",
        )
        .bind(session_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .ok_or(StorageError::NotFound)?;

        let payload: &str = row.try_get("payload").map_err(ser)?;
        Ok(AnalyticsSnapshot {
            session_id: session_id_from_str(row.try_get::<&str, _>("session_id").map_err(ser)?)?,
            captured_at: row.try_get("captured_at").map_err(ser)?,
            analytics: serde_json::from_str(payload).map_err(ser)?,
        })
    }
}
