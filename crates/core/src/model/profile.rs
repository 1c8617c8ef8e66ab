use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::language::LanguageCode;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProfileError {
    #[error("daily practice minutes must be between {min} and {max} in steps of {step}", min = DAILY_MINUTES_MIN, max = DAILY_MINUTES_MAX, step = DAILY_MINUTES_STEP)]
    InvalidDailyMinutes(u32),

    #[error("unknown level: {0}")]
    UnknownLevel(String),

    #[error("unknown conversation style: {0}")]
    UnknownStyle(String),
}

pub const DAILY_MINUTES_MIN: u32 = 5;
pub const DAILY_MINUTES_MAX: u32 = 120;
pub const DAILY_MINUTES_STEP: u32 = 5;

//
// ─── LEVEL / STYLE ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Level {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Beginner => "Beginner",
            Level::Intermediate => "Intermediate",
            Level::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Level::Beginner),
            "intermediate" => Ok(Level::Intermediate),
            "advanced" => Ok(Level::Advanced),
            other => Err(ProfileError::UnknownLevel(other.to_owned())),
        }
    }
}

/// Register the tutor should answer in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConversationStyle {
    #[default]
    Casual,
    Formal,
}

impl ConversationStyle {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ConversationStyle::Casual => "Casual",
            ConversationStyle::Formal => "Formal",
        }
    }
}

impl fmt::Display for ConversationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversationStyle {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "casual" => Ok(ConversationStyle::Casual),
            "formal" => Ok(ConversationStyle::Formal),
            other => Err(ProfileError::UnknownStyle(other.to_owned())),
        }
    }
}

//
// ─── PROFILE ───────────────────────────────────────────────────────────────────
//

/// Learner settings chosen alongside the goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnerProfile {
    target_language: LanguageCode,
    level: Level,
    daily_minutes: u32,
    style: ConversationStyle,
}

impl LearnerProfile {
    /// Creates a validated profile.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::InvalidDailyMinutes` if `daily_minutes` is out of
    /// range or not a multiple of five.
    pub fn new(
        target_language: LanguageCode,
        level: Level,
        daily_minutes: u32,
        style: ConversationStyle,
    ) -> Result<Self, ProfileError> {
        let in_range = (DAILY_MINUTES_MIN..=DAILY_MINUTES_MAX).contains(&daily_minutes);
        if !in_range || daily_minutes % DAILY_MINUTES_STEP != 0 {
            return Err(ProfileError::InvalidDailyMinutes(daily_minutes));
        }
        Ok(Self {
            target_language,
            level,
            daily_minutes,
            style,
        })
    }

    #[must_use]
    pub fn target_language(&self) -> &LanguageCode {
        &self.target_language
    }

    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    #[must_use]
    pub fn daily_minutes(&self) -> u32 {
        self.daily_minutes
    }

    #[must_use]
    pub fn style(&self) -> ConversationStyle {
        self.style
    }

    #[must_use]
    pub fn with_target_language(mut self, target_language: LanguageCode) -> Self {
        self.target_language = target_language;
        self
    }
}

impl Default for LearnerProfile {
    /// Spanish, beginner, 15 minutes a day, casual.
    fn default() -> Self {
        Self {
            target_language: LanguageCode::default_target(),
            level: Level::Beginner,
            daily_minutes: 15,
            style: ConversationStyle::Casual,
        }
    }
}
