//! Step-by-step progression of a learning session.
//!
//! `StepController` owns the `Session` and is the only code that mutates it.
//! Each handler does its external calls first and collects the outcome in a
//! `SessionUpdate`, which is committed with a single `Session::apply`.

use std::sync::Arc;

use tracing::{debug, info};

use lingua_core::SessionAnalytics;
use lingua_core::model::{
    LearnerProfile, QuizQuestion, QuizRound, Session, SessionUpdate, SessionUpdateError, StepId,
    Turn,
};
use lingua_core::time::Clock;

use crate::config::ControllerConfig;
use crate::error::{GenerationError, StepError, ValidationError};
use crate::generation::TextGenerator;
use crate::history::HistoryLogger;
use crate::language::{LanguageService, translation_target};
use crate::prompts::{self, SessionContext};
use crate::quiz;

//
// ─── EVENTS ────────────────────────────────────────────────────────────────────
//

/// What the learner did on the current screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    /// Free-text input: goal, language sample, utterance or quiz answer.
    Submit(String),
    ReadyForQuiz,
    Back,
    PracticeAgain,
}

impl StepAction {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            StepAction::Submit(_) => "submit",
            StepAction::ReadyForQuiz => "ready_for_quiz",
            StepAction::Back => "back",
            StepAction::PracticeAgain => "practice_again",
        }
    }
}

/// One learner action, tagged with the step it was made on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepEvent {
    pub step: StepId,
    pub action: StepAction,
}

impl StepEvent {
    #[must_use]
    pub fn new(step: StepId, action: StepAction) -> Self {
        Self { step, action }
    }

    #[must_use]
    pub fn submit(step: StepId, input: impl Into<String>) -> Self {
        Self::new(step, StepAction::Submit(input.into()))
    }
}

/// Outcome of a successfully handled event.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub previous_step: StepId,
    pub current_step: StepId,
    pub appended_turn: Option<Turn>,
    /// Short feedback line for the presenter, e.g. the quiz verdict.
    pub notice: Option<String>,
}

impl StepReport {
    #[must_use]
    pub fn transitioned(&self) -> bool {
        self.previous_step != self.current_step
    }
}

//
// ─── COLLABORATORS ─────────────────────────────────────────────────────────────
//

/// External services a controller calls out to. Shared across sessions.
#[derive(Clone)]
pub struct Collaborators {
    pub language: Arc<dyn LanguageService>,
    pub generator: Arc<dyn TextGenerator>,
    pub history: Arc<dyn HistoryLogger>,
    pub clock: Clock,
}

/// Changes computed by a handler, not yet applied.
struct Outcome {
    update: SessionUpdate,
    notice: Option<String>,
}

impl Outcome {
    fn new(update: SessionUpdate) -> Self {
        Self {
            update,
            notice: None,
        }
    }

    fn with_notice(mut self, notice: impl Into<String>) -> Self {
        self.notice = Some(notice.into());
        self
    }
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

pub struct StepController {
    session: Session,
    services: Collaborators,
    config: ControllerConfig,
    shuffle_options: bool,
}

impl StepController {
    #[must_use]
    pub fn new(session: Session, services: Collaborators, config: ControllerConfig) -> Self {
        Self {
            session,
            services,
            config,
            shuffle_options: true,
        }
    }

    /// Enable or disable shuffling of quiz options (on by default).
    #[must_use]
    pub fn with_shuffle_options(mut self, shuffle: bool) -> Self {
        self.shuffle_options = shuffle;
        self
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn current_step(&self) -> StepId {
        self.session.current_step()
    }

    #[must_use]
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Ends the interaction, handing the session back.
    #[must_use]
    pub fn into_session(self) -> Session {
        self.session
    }

    /// Progress summary of the session so far. No external calls.
    #[must_use]
    pub fn analytics(&self) -> SessionAnalytics {
        SessionAnalytics::from_session(&self.session)
    }

    /// Replace the learner profile. Allowed at any step, never transitions.
    ///
    /// # Errors
    ///
    /// Returns `StepError::Validation` if the session rejects the update.
    pub fn update_profile(&mut self, profile: LearnerProfile) -> Result<(), StepError> {
        self.session.apply(SessionUpdate::new().profile(profile))?;
        debug!(
            session = %self.session.id(),
            target = %self.session.profile().target_language(),
            "profile updated"
        );
        Ok(())
    }

    /// Handle one learner event against the current step.
    ///
    /// On error the session is exactly as it was before the call.
    ///
    /// # Errors
    ///
    /// Returns `StepError::Validation` for input the step cannot accept, or
    /// the error of the external service that failed.
    pub async fn handle(&mut self, event: StepEvent) -> Result<StepReport, StepError> {
        let previous_step = self.session.current_step();
        let action = event.action.label();

        let outcome = match self.plan(event).await {
            Ok(outcome) => outcome,
            Err(err) => {
                debug!(
                    session = %self.session.id(),
                    step = %previous_step,
                    action,
                    kind = err.kind(),
                    error = %err,
                    "step rejected"
                );
                return Err(err);
            }
        };

        let appended_turn = outcome.update.turn().cloned();
        self.session.apply(outcome.update)?;
        let current_step = self.session.current_step();

        if previous_step != current_step {
            info!(
                session = %self.session.id(),
                from = %previous_step,
                to = %current_step,
                "step transition"
            );
        }
        if let Some(turn) = &appended_turn {
            self.services
                .history
                .append(turn, &self.session.metadata())
                .await;
        }
        if current_step == StepId::Analytics && previous_step == StepId::Quiz {
            self.services
                .history
                .snapshot(self.session.id(), &self.analytics())
                .await;
        }

        Ok(StepReport {
            previous_step,
            current_step,
            appended_turn,
            notice: outcome.notice,
        })
    }

    async fn plan(&self, event: StepEvent) -> Result<Outcome, StepError> {
        let current = self.session.current_step();
        if event.step != current {
            return Err(ValidationError::StaleStep {
                expected: current,
                got: event.step,
            }
            .into());
        }

        match (current, event.action) {
            (_, StepAction::Back) => self.go_back(),
            (StepId::SetGoal, StepAction::Submit(goal)) => Self::set_goal(&goal),
            (StepId::DetectLanguage, StepAction::Submit(sample)) => {
                self.detect_language(&sample).await
            }
            (StepId::PracticeConversation, StepAction::Submit(utterance)) => {
                self.practice(&utterance).await
            }
            (StepId::PracticeConversation, StepAction::ReadyForQuiz) => self.start_quiz().await,
            (StepId::Quiz, StepAction::Submit(answer)) => self.answer_quiz(&answer).await,
            (StepId::Analytics, StepAction::PracticeAgain) => Ok(Outcome::new(
                SessionUpdate::new().move_to(StepId::PracticeConversation),
            )),
            (StepId::Analytics, StepAction::Submit(_)) => {
                Err(ValidationError::NoInputExpected(StepId::Analytics).into())
            }
            (step, action) => Err(ValidationError::UnsupportedAction {
                step,
                action: action.label(),
            }
            .into()),
        }
    }

    fn go_back(&self) -> Result<Outcome, StepError> {
        let current = self.session.current_step();
        let mut target = current.previous().ok_or(ValidationError::AtFirstStep)?;
        // A finished round has no question to return to.
        if target == StepId::Quiz && self.session.quiz_round().pending().is_none() {
            target = StepId::PracticeConversation;
        }
        let mut update = SessionUpdate::new().move_to(target);
        if current == StepId::Quiz {
            update = update.quiz_round(QuizRound::default());
        }
        Ok(Outcome::new(update))
    }

    fn set_goal(goal: &str) -> Result<Outcome, StepError> {
        let goal = goal.trim();
        if goal.is_empty() {
            return Err(ValidationError::EmptyGoal.into());
        }
        Ok(Outcome::new(
            SessionUpdate::new()
                .goal(goal)
                .move_to(StepId::DetectLanguage),
        ))
    }

    async fn detect_language(&self, sample: &str) -> Result<Outcome, StepError> {
        let code = self.services.language.detect(sample).await?;
        let notice = format!("Detected language: {} ({code})", code.display_name());
        Ok(Outcome::new(
            SessionUpdate::new()
                .source_language(code)
                .move_to(StepId::PracticeConversation),
        )
        .with_notice(notice))
    }

    async fn practice(&self, utterance: &str) -> Result<Outcome, StepError> {
        let utterance = utterance.trim();
        if utterance.is_empty() {
            return Err(ValidationError::EmptyInput.into());
        }
        self.ensure_turn_capacity()?;

        // Each utterance is detected on its own; the step-two language only
        // picks the translation direction.
        let writes_in = self.session.source_language();
        let studying = self
            .session
            .target_language()
            .unwrap_or_else(|| self.session.profile().target_language());
        let into = translation_target(writes_in, studying);
        let translation = self
            .services
            .language
            .translate(utterance, None, &into)
            .await?;

        let context = self.context();
        let note = self
            .services
            .generator
            .generate(&prompts::grammar_notes(utterance, &context), &context)
            .await?;

        let detected = translation.detected_source.or_else(|| writes_in.cloned());
        let turn = Turn::practice(
            utterance,
            detected,
            translation.text,
            note,
            self.services.clock.now(),
        );
        Ok(Outcome::new(SessionUpdate::new().append_turn(turn)))
    }

    async fn start_quiz(&self) -> Result<Outcome, StepError> {
        let question = self.next_question(1).await?;
        Ok(Outcome::new(
            SessionUpdate::new()
                .quiz_round(QuizRound::starting_with(question))
                .move_to(StepId::Quiz),
        ))
    }

    async fn answer_quiz(&self, answer: &str) -> Result<Outcome, StepError> {
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(ValidationError::EmptyInput.into());
        }
        let round = self.session.quiz_round();
        let question = round.pending().ok_or(ValidationError::NoPendingQuestion)?;
        let chosen = question
            .match_option(answer)
            .ok_or_else(|| ValidationError::UnknownOption {
                answer: answer.to_owned(),
                options: question.options().len(),
            })?;
        self.ensure_turn_capacity()?;

        let is_correct = chosen == question.answer_index();
        let notice = if is_correct {
            "Correct ✅".to_owned()
        } else {
            format!("Wrong. Correct answer: {}", question.correct_option())
        };

        let answered = round.answered().saturating_add(1);
        let mut update = SessionUpdate::new().append_turn(Turn::quiz_answer(
            answer,
            is_correct,
            self.services.clock.now(),
        ));
        update = if answered < self.config.quiz_questions {
            let next = self.next_question(answered + 1).await?;
            update.quiz_round(round.advanced(Some(next)))
        } else {
            update
                .quiz_round(QuizRound::default())
                .move_to(StepId::Analytics)
        };

        Ok(Outcome::new(update).with_notice(notice))
    }

    async fn next_question(&self, number: u32) -> Result<QuizQuestion, GenerationError> {
        let context = self.context();
        let prompt = prompts::quiz_question(number, self.config.quiz_questions, &context);
        let raw = self.services.generator.generate(&prompt, &context).await?;
        let question = quiz::parse_question(&raw)?;
        Ok(if self.shuffle_options {
            quiz::shuffled(&question)
        } else {
            question
        })
    }

    fn ensure_turn_capacity(&self) -> Result<(), SessionUpdateError> {
        if self.session.has_turn_capacity() {
            Ok(())
        } else {
            Err(SessionUpdateError::TurnLimitReached {
                limit: self.session.max_turns(),
            })
        }
    }

    fn context(&self) -> SessionContext {
        SessionContext::from_session(&self.session, self.config.context_turns)
    }
}
