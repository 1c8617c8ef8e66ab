//! Turning generator output into validated quiz questions.

use rand::rng;
use rand::seq::SliceRandom;

use lingua_core::model::{QuizQuestion, QuizQuestionDraft};

use crate::error::GenerationError;
use crate::prompts::strip_code_fences;

/// Parse a question from raw model output.
///
/// Code fences and any prose around the outermost JSON object are ignored.
///
/// # Errors
///
/// Returns `GenerationError::Malformed` when no valid question can be read.
pub fn parse_question(raw: &str) -> Result<QuizQuestion, GenerationError> {
    let cleaned = strip_code_fences(raw);
    let json = match (cleaned.find('{'), cleaned.rfind('}')) {
        (Some(start), Some(end)) if start < end => &cleaned[start..=end],
        _ => return Err(GenerationError::Malformed("no JSON object in quiz response".into())),
    };
    let draft: QuizQuestionDraft =
        serde_json::from_str(json).map_err(|e| GenerationError::Malformed(e.to_string()))?;
    draft
        .validate()
        .map_err(|e| GenerationError::Malformed(e.to_string()))
}

/// Same question with its options in random order.
#[must_use]
pub fn shuffled(question: &QuizQuestion) -> QuizQuestion {
    let correct = question.correct_option().to_owned();
    let mut options = question.options().to_vec();
    options.shuffle(&mut rng());
    let answer_index = options
        .iter()
        .position(|option| *option == correct)
        .unwrap_or_default();
    QuizQuestion::new(question.question(), options, answer_index).unwrap_or_else(|_| question.clone())
}
