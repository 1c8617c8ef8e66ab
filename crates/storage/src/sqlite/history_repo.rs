use lingua_core::model::SessionId;

use super::{
    SqliteRepository,
    mapping::{language_to_opt, map_history_row},
};
use crate::repository::{HistoryRecord, HistoryRepository, StorageError};

#[async_trait::async_trait]
impl HistoryRepository for SqliteRepository {
    async fn append_record(&self, record: &HistoryRecord) -> Result<i64, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO turn_history (
                    session_id, step, goal, source_language, target_language,
                    raw_input, detected_language, translated_text, grammar_note,
                    is_quiz_answer, is_correct, recorded_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ",
        )
        .bind(record.session_id.to_string())
        .bind(record.step.as_str())
        .bind(record.goal.as_deref())
        .bind(language_to_opt(record.source_language.as_ref()))
        .bind(language_to_opt(record.target_language.as_ref()))
        .bind(record.raw_input.as_str())
        .bind(language_to_opt(record.detected_language.as_ref()))
        .bind(record.translated_text.as_deref())
        .bind(record.grammar_note.as_deref())
        .bind(record.is_quiz_answer)
        .bind(record.is_correct)
        .bind(record.recorded_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(res.last_insert_rowid())
    }

    async fn records_for_session(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<HistoryRecord>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    session_id, step, goal, source_language, target_language,
                    raw_input, detected_language, translated_text, grammar_note,
                    is_quiz_answer, is_correct, recorded_at
                FROM turn_history
                WHERE session_id = ?1
                ORDER BY recorded_at ASC, id ASC
            ",
        )
        .bind(session_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_history_row(&row)?);
        }
        Ok(out)
    }
}
