use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::language::LanguageCode;

/// One recorded exchange during practice or the quiz.
///
/// Fields are private: a turn cannot change once it has been appended to a
/// session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    raw_input: String,
    detected_language: Option<LanguageCode>,
    translated_text: Option<String>,
    grammar_note: Option<String>,
    is_quiz_answer: bool,
    is_correct: Option<bool>,
    recorded_at: DateTime<Utc>,
}

impl Turn {
    /// A practice utterance with its reference translation and grammar note.
    #[must_use]
    pub fn practice(
        raw_input: impl Into<String>,
        detected_language: Option<LanguageCode>,
        translated_text: impl Into<String>,
        grammar_note: impl Into<String>,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            raw_input: raw_input.into(),
            detected_language,
            translated_text: Some(translated_text.into()),
            grammar_note: Some(grammar_note.into()),
            is_quiz_answer: false,
            is_correct: None,
            recorded_at,
        }
    }

    /// A judged quiz answer.
    #[must_use]
    pub fn quiz_answer(
        raw_input: impl Into<String>,
        is_correct: bool,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            raw_input: raw_input.into(),
            detected_language: None,
            translated_text: None,
            grammar_note: None,
            is_quiz_answer: true,
            is_correct: Some(is_correct),
            recorded_at,
        }
    }

    #[must_use]
    pub fn raw_input(&self) -> &str {
        &self.raw_input
    }

    #[must_use]
    pub fn detected_language(&self) -> Option<&LanguageCode> {
        self.detected_language.as_ref()
    }

    #[must_use]
    pub fn translated_text(&self) -> Option<&str> {
        self.translated_text.as_deref()
    }

    #[must_use]
    pub fn grammar_note(&self) -> Option<&str> {
        self.grammar_note.as_deref()
    }

    #[must_use]
    pub fn is_quiz_answer(&self) -> bool {
        self.is_quiz_answer
    }

    #[must_use]
    pub fn is_correct(&self) -> Option<bool> {
        self.is_correct
    }

    #[must_use]
    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    /// Whitespace-separated word count of the learner's input.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.raw_input.split_whitespace().count()
    }
}
