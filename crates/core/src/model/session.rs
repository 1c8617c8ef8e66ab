use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::ids::SessionId;
use crate::model::language::LanguageCode;
use crate::model::profile::LearnerProfile;
use crate::model::quiz::{QuizRound, QuizScore};
use crate::model::step::StepId;
use crate::model::turn::Turn;

/// Upper bound on recorded turns when none is configured.
pub const DEFAULT_MAX_TURNS: usize = 200;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionUpdateError {
    #[error("turn limit of {limit} reached")]
    TurnLimitReached { limit: usize },

    #[error("turns cannot be recorded during {step}")]
    TurnOutsideRecordingStep { step: StepId },
}

//
// ─── UPDATE ────────────────────────────────────────────────────────────────────
//

/// Every effect a single step transition may have on a session.
///
/// Built up while the step does its fallible work, then committed in one
/// `Session::apply` call.
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use]
pub struct SessionUpdate {
    step: Option<StepId>,
    goal: Option<String>,
    source_language: Option<LanguageCode>,
    profile: Option<LearnerProfile>,
    turn: Option<Turn>,
    grammar_note: Option<String>,
    quiz_round: Option<QuizRound>,
}

impl SessionUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(mut self, step: StepId) -> Self {
        self.step = Some(step);
        self
    }

    pub fn goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = Some(goal.into());
        self
    }

    pub fn source_language(mut self, code: LanguageCode) -> Self {
        self.source_language = Some(code);
        self
    }

    pub fn profile(mut self, profile: LearnerProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Append a turn. Quiz answers also update the score.
    pub fn append_turn(mut self, turn: Turn) -> Self {
        if let Some(note) = turn.grammar_note() {
            self.grammar_note = Some(note.to_owned());
        }
        self.turn = Some(turn);
        self
    }

    pub fn quiz_round(mut self, round: QuizRound) -> Self {
        self.quiz_round = Some(round);
        self
    }

    #[must_use]
    pub fn turn(&self) -> Option<&Turn> {
        self.turn.as_ref()
    }
}

/// Session-level context stored next to each logged turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionMetadata {
    pub session_id: SessionId,
    pub step: StepId,
    pub goal: Option<String>,
    pub source_language: Option<LanguageCode>,
    pub target_language: Option<LanguageCode>,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Full mutable state of one learner's interaction.
///
/// Readers get `&Session`; the only mutator is `apply`, which either commits
/// a whole `SessionUpdate` or leaves the session untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    id: SessionId,
    current_step: StepId,
    goal: Option<String>,
    source_language: Option<LanguageCode>,
    target_language: Option<LanguageCode>,
    turns: Vec<Turn>,
    quiz_score: QuizScore,
    last_grammar_note: Option<String>,
    profile: LearnerProfile,
    quiz_round: QuizRound,
    started_at: DateTime<Utc>,
    #[serde(skip)]
    max_turns: usize,
}

impl Session {
    /// Starts a session at `SetGoal` with the profile's target language.
    #[must_use]
    pub fn new(id: SessionId, profile: LearnerProfile, started_at: DateTime<Utc>) -> Self {
        Self {
            id,
            current_step: StepId::first(),
            goal: None,
            source_language: None,
            target_language: Some(profile.target_language().clone()),
            turns: Vec::new(),
            quiz_score: QuizScore::default(),
            last_grammar_note: None,
            profile,
            quiz_round: QuizRound::default(),
            started_at,
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    #[must_use]
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn current_step(&self) -> StepId {
        self.current_step
    }

    #[must_use]
    pub fn goal(&self) -> Option<&str> {
        self.goal.as_deref()
    }

    #[must_use]
    pub fn source_language(&self) -> Option<&LanguageCode> {
        self.source_language.as_ref()
    }

    #[must_use]
    pub fn target_language(&self) -> Option<&LanguageCode> {
        self.target_language.as_ref()
    }

    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    #[must_use]
    pub fn quiz_score(&self) -> QuizScore {
        self.quiz_score
    }

    #[must_use]
    pub fn last_grammar_note(&self) -> Option<&str> {
        self.last_grammar_note.as_deref()
    }

    #[must_use]
    pub fn profile(&self) -> &LearnerProfile {
        &self.profile
    }

    #[must_use]
    pub fn quiz_round(&self) -> &QuizRound {
        &self.quiz_round
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    #[must_use]
    pub fn metadata(&self) -> SessionMetadata {
        SessionMetadata {
            session_id: self.id,
            step: self.current_step,
            goal: self.goal.clone(),
            source_language: self.source_language.clone(),
            target_language: self.target_language.clone(),
        }
    }

    /// Whether another turn fits under the configured limit.
    #[must_use]
    pub fn has_turn_capacity(&self) -> bool {
        self.turns.len() < self.max_turns
    }

    /// The last `n` turns, oldest first.
    #[must_use]
    pub fn recent_turns(&self, n: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }

    /// Commit an update atomically.
    ///
    /// Turns are only accepted while the session (before the update) is in a
    /// turn-recording step.
    ///
    /// # Errors
    ///
    /// Returns `SessionUpdateError` without touching the session if the turn
    /// limit is reached or a turn is appended outside practice/quiz.
    pub fn apply(&mut self, update: SessionUpdate) -> Result<(), SessionUpdateError> {
        if update.turn.is_some() {
            if !self.current_step.records_turns() {
                return Err(SessionUpdateError::TurnOutsideRecordingStep {
                    step: self.current_step,
                });
            }
            if !self.has_turn_capacity() {
                return Err(SessionUpdateError::TurnLimitReached {
                    limit: self.max_turns,
                });
            }
        }

        let SessionUpdate {
            step,
            goal,
            source_language,
            profile,
            turn,
            grammar_note,
            quiz_round,
        } = update;

        if let Some(goal) = goal {
            self.goal = Some(goal);
        }
        if let Some(code) = source_language {
            self.source_language = Some(code);
        }
        if let Some(profile) = profile {
            self.target_language = Some(profile.target_language().clone());
            self.profile = profile;
        }
        if let Some(turn) = turn {
            if let Some(is_correct) = turn.is_correct() {
                self.quiz_score.record(is_correct);
            }
            self.turns.push(turn);
        }
        if let Some(note) = grammar_note {
            self.last_grammar_note = Some(note);
        }
        if let Some(round) = quiz_round {
            self.quiz_round = round;
        }
        if let Some(step) = step {
            self.current_step = step;
        }
        Ok(())
    }
}
