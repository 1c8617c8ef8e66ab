use lingua_core::model::{LanguageCode, SessionId, StepId};
use sqlx::Row;

use crate::repository::{HistoryRecord, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn domain(e: impl Into<lingua_core::Error>) -> StorageError {
    StorageError::Domain(e.into())
}

pub(crate) fn session_id_from_str(raw: &str) -> Result<SessionId, StorageError> {
    raw.parse().map_err(ser)
}

pub(crate) fn step_from_str(raw: &str) -> Result<StepId, StorageError> {
    raw.parse::<StepId>().map_err(domain)
}

fn language_from_opt(raw: Option<String>) -> Result<Option<LanguageCode>, StorageError> {
    raw.map(|code| LanguageCode::new(code).map_err(domain))
        .transpose()
}

pub(crate) fn language_to_opt(code: Option<&LanguageCode>) -> Option<String> {
    code.map(|c| c.as_str().to_owned())
}

pub(crate) fn map_history_row(row: &sqlx::sqlite::SqliteRow) -> Result<HistoryRecord, StorageError> {
    let session_id = session_id_from_str(row.try_get::<&str, _>("session_id").map_err(ser)?)?;
    let step = step_from_str(row.try_get::<&str, _>("step").map_err(ser)?)?;

    Ok(HistoryRecord {
        session_id,
        step,
        goal: row.try_get("goal").map_err(ser)?,
        source_language: language_from_opt(row.try_get("source_language").map_err(ser)?)?,
        target_language: language_from_opt(row.try_get("target_language").map_err(ser)?)?,
        raw_input: row.try_get("raw_input").map_err(ser)?,
        detected_language: language_from_opt(row.try_get("detected_language").map_err(ser)?)?,
        translated_text: row.try_get("translated_text").map_err(ser)?,
        grammar_note: row.try_get("grammar_note").map_err(ser)?,
        is_quiz_answer: row.try_get("is_quiz_answer").map_err(ser)?,
        is_correct: row.try_get("is_correct").map_err(ser)?,
        recorded_at: row.try_get("recorded_at").map_err(ser)?,
    })
}
