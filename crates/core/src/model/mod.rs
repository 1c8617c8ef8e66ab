mod ids;
mod language;
mod profile;
mod quiz;
mod session;
mod step;
mod turn;

pub use ids::{ParseIdError, SessionId};
pub use language::{LanguageCode, LanguageCodeError};
pub use profile::{
    ConversationStyle, DAILY_MINUTES_MAX, DAILY_MINUTES_MIN, DAILY_MINUTES_STEP, LearnerProfile,
    Level, ProfileError,
};
pub use quiz::{QuizQuestion, QuizQuestionDraft, QuizQuestionError, QuizRound, QuizScore};
pub use session::{
    DEFAULT_MAX_TURNS, Session, SessionMetadata, SessionUpdate, SessionUpdateError,
};
pub use step::{StepId, StepParseError};
pub use turn::Turn;
