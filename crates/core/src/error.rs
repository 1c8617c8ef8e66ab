use thiserror::Error;

use crate::model::{
    LanguageCodeError, ProfileError, QuizQuestionError, SessionUpdateError, StepParseError,
};

/// Umbrella for every validation failure the domain model can report.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    LanguageCode(#[from] LanguageCodeError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    QuizQuestion(#[from] QuizQuestionError),
    #[error(transparent)]
    SessionUpdate(#[from] SessionUpdateError),
    #[error(transparent)]
    Step(#[from] StepParseError),
}
