use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizQuestionError {
    #[error("quiz question text cannot be empty")]
    EmptyQuestion,

    #[error("quiz question needs at least {min} options, got {got}", min = MIN_OPTIONS)]
    TooFewOptions { got: usize },

    #[error("quiz options must be non-empty and distinct")]
    InvalidOptions,

    #[error("answer index {index} out of range for {len} options")]
    AnswerOutOfRange { index: usize, len: usize },
}

pub const MIN_OPTIONS: usize = 2;

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Multiple-choice question with exactly one correct option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuizQuestionDraft")]
pub struct QuizQuestion {
    question: String,
    options: Vec<String>,
    answer_index: usize,
}

/// Unvalidated question shape, as produced by the text generator.
#[derive(Debug, Clone, Deserialize)]
pub struct QuizQuestionDraft {
    pub question: String,
    pub options: Vec<String>,
    pub answer_index: usize,
}

impl QuizQuestionDraft {
    /// Trim and validate into a `QuizQuestion`.
    ///
    /// # Errors
    ///
    /// Returns `QuizQuestionError` if the text is blank, there are fewer than
    /// two options, options repeat, or the answer index is out of range.
    pub fn validate(self) -> Result<QuizQuestion, QuizQuestionError> {
        let question = self.question.trim().to_owned();
        if question.is_empty() {
            return Err(QuizQuestionError::EmptyQuestion);
        }

        let options: Vec<String> = self
            .options
            .into_iter()
            .map(|o| o.trim().to_owned())
            .collect();
        if options.len() < MIN_OPTIONS {
            return Err(QuizQuestionError::TooFewOptions { got: options.len() });
        }
        let mut seen = HashSet::new();
        for option in &options {
            if option.is_empty() || !seen.insert(option.to_lowercase()) {
                return Err(QuizQuestionError::InvalidOptions);
            }
        }
        if self.answer_index >= options.len() {
            return Err(QuizQuestionError::AnswerOutOfRange {
                index: self.answer_index,
                len: options.len(),
            });
        }

        Ok(QuizQuestion {
            question,
            options,
            answer_index: self.answer_index,
        })
    }
}

impl TryFrom<QuizQuestionDraft> for QuizQuestion {
    type Error = QuizQuestionError;

    fn try_from(value: QuizQuestionDraft) -> Result<Self, Self::Error> {
        value.validate()
    }
}

impl QuizQuestion {
    /// Convenience constructor, see `QuizQuestionDraft::validate`.
    ///
    /// # Errors
    ///
    /// Returns `QuizQuestionError` for invalid shapes.
    pub fn new(
        question: impl Into<String>,
        options: Vec<String>,
        answer_index: usize,
    ) -> Result<Self, QuizQuestionError> {
        QuizQuestionDraft {
            question: question.into(),
            options,
            answer_index,
        }
        .validate()
    }

    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn answer_index(&self) -> usize {
        self.answer_index
    }

    #[must_use]
    pub fn correct_option(&self) -> &str {
        &self.options[self.answer_index]
    }

    /// Resolves learner input to an option index.
    ///
    /// Option text (case-insensitive, trimmed) wins; otherwise the input is
    /// read as a 1-based option number.
    #[must_use]
    pub fn match_option(&self, answer: &str) -> Option<usize> {
        let answer = answer.trim();
        let lowered = answer.to_lowercase();
        self.options
            .iter()
            .position(|option| option.to_lowercase() == lowered)
            .or_else(|| {
                answer
                    .parse::<usize>()
                    .ok()
                    .filter(|number| (1..=self.options.len()).contains(number))
                    .map(|number| number - 1)
            })
    }
}

//
// ─── SCORE ─────────────────────────────────────────────────────────────────────
//

/// Running quiz tally. `correct <= total` holds because `record` is the only
/// mutator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuizScore {
    correct: u32,
    total: u32,
}

impl QuizScore {
    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn record(&mut self, is_correct: bool) {
        self.total = self.total.saturating_add(1);
        if is_correct {
            self.correct = self.correct.saturating_add(1).min(self.total);
        }
    }

    /// Fraction of correct answers, `None` before the first answer.
    #[must_use]
    pub fn accuracy(&self) -> Option<f64> {
        (self.total > 0).then(|| f64::from(self.correct) / f64::from(self.total))
    }
}

//
// ─── ROUND ─────────────────────────────────────────────────────────────────────
//

/// Progress through the current quiz round.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuizRound {
    pending: Option<QuizQuestion>,
    answered: u32,
}

impl QuizRound {
    /// Start a round with its first question.
    #[must_use]
    pub fn starting_with(question: QuizQuestion) -> Self {
        Self {
            pending: Some(question),
            answered: 0,
        }
    }

    #[must_use]
    pub fn pending(&self) -> Option<&QuizQuestion> {
        self.pending.as_ref()
    }

    #[must_use]
    pub fn answered(&self) -> u32 {
        self.answered
    }

    /// Round state after one more answer, with `next` as the new pending question.
    #[must_use]
    pub fn advanced(&self, next: Option<QuizQuestion>) -> Self {
        Self {
            pending: next,
            answered: self.answered.saturating_add(1),
        }
    }
}
