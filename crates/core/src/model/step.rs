use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StepParseError {
    #[error("unknown step: {0}")]
    Unknown(String),
}

//
// ─── STEP ID ──────────────────────────────────────────────────────────────────
//

/// One stage of the guided learning flow.
///
/// Variants are declared in flow order, so the derived `Ord` is the default
/// forward progression:
/// - `SetGoal`: learner states a goal and picks a target language
/// - `DetectLanguage`: a sample sentence establishes the source language
/// - `PracticeConversation`: repeated utterances with translation + grammar notes
/// - `Quiz`: a short multiple-choice round built from the practice history
/// - `Analytics`: progress summary, re-enterable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    SetGoal,
    DetectLanguage,
    PracticeConversation,
    Quiz,
    Analytics,
}

impl StepId {
    /// All steps in flow order.
    pub const ALL: [StepId; 5] = [
        StepId::SetGoal,
        StepId::DetectLanguage,
        StepId::PracticeConversation,
        StepId::Quiz,
        StepId::Analytics,
    ];

    /// The initial step of every session.
    #[must_use]
    pub fn first() -> Self {
        Self::SetGoal
    }

    /// Zero-based position in the flow.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            StepId::SetGoal => 0,
            StepId::DetectLanguage => 1,
            StepId::PracticeConversation => 2,
            StepId::Quiz => 3,
            StepId::Analytics => 4,
        }
    }

    /// Next step in the default progression, `None` at the end.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// Previous step, `None` at the start.
    #[must_use]
    pub fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }

    /// Human-readable title used by presenters.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            StepId::SetGoal => "Set Goal & Language",
            StepId::DetectLanguage => "Language Detection Test",
            StepId::PracticeConversation => "Practice Conversation",
            StepId::Quiz => "Learning Mode (Quiz)",
            StepId::Analytics => "Analytics & Progress",
        }
    }

    /// Stable machine name, matches the serde representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StepId::SetGoal => "set_goal",
            StepId::DetectLanguage => "detect_language",
            StepId::PracticeConversation => "practice_conversation",
            StepId::Quiz => "quiz",
            StepId::Analytics => "analytics",
        }
    }

    /// Whether learner input recorded in this step becomes a `Turn`.
    #[must_use]
    pub fn records_turns(self) -> bool {
        matches!(self, StepId::PracticeConversation | StepId::Quiz)
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepId {
    type Err = StepParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|step| step.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| StepParseError::Unknown(needle.to_owned()))
    }
}
