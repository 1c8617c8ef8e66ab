use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lingua_core::model::{
    LanguageCode, LearnerProfile, Level, ConversationStyle, SessionId, SessionMetadata, StepId,
    Turn,
};
use lingua_core::time::fixed_now;
use lingua_core::SessionAnalytics;
use services::{
    AppServices, Clock, Collaborators, ControllerConfig, DetectionError, GenerationError,
    HistoryLogger, LanguageService, RepositoryHistoryLogger, SessionContext, StepAction,
    StepController, StepError, StepEvent, TextGenerator, Translation, TranslationError,
    ValidationError,
};
use storage::repository::{
    AnalyticsRepository, HistoryRecord, HistoryRepository, InMemoryRepository, StorageError,
};

//
// ─── FAKES ─────────────────────────────────────────────────────────────────────
//

/// Guesses the language from a few marker words and records every
/// `(source, target)` pair it is asked to translate with.
#[derive(Default)]
struct FakeLanguage {
    translations: Mutex<Vec<(Option<String>, String)>>,
    fail_translate: bool,
}

impl FakeLanguage {
    fn guess(text: &str) -> LanguageCode {
        let code = if text.starts_with("Bonjour") {
            "fr"
        } else if ["Yo ", "Quiero", "Hola", "Adiós", "Buenos", "¿"]
            .iter()
            .any(|marker| text.starts_with(marker))
        {
            "es"
        } else {
            "en"
        };
        LanguageCode::new(code).unwrap()
    }

    fn translations(&self) -> Vec<(Option<String>, String)> {
        self.translations.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageService for FakeLanguage {
    async fn detect(&self, text: &str) -> Result<LanguageCode, DetectionError> {
        if text.trim().is_empty() {
            return Err(DetectionError::EmptyText);
        }
        Ok(Self::guess(text))
    }

    async fn translate(
        &self,
        text: &str,
        source: Option<&LanguageCode>,
        target: &LanguageCode,
    ) -> Result<Translation, TranslationError> {
        self.translations.lock().unwrap().push((
            source.map(|code| code.as_str().to_owned()),
            target.as_str().to_owned(),
        ));
        if self.fail_translate {
            return Err(TranslationError::Malformed("offline".into()));
        }
        let translated = match (text, target.as_str()) {
            ("Yo va a la tienda", "en") => "I go to the store".to_owned(),
            (other, target) => format!("[{target}] {other}"),
        };
        Ok(Translation {
            text: translated,
            detected_source: Some(source.cloned().unwrap_or_else(|| Self::guess(text))),
        })
    }
}

/// Replays scripted responses in order; `None` fails the call.
#[derive(Default)]
struct ScriptedGenerator {
    responses: Mutex<VecDeque<Option<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    fn push(&self, response: Option<&str>) {
        self.responses
            .lock()
            .unwrap()
            .push_back(response.map(str::to_owned));
    }

    fn push_question(&self, question: &str, options: &[&str], answer_index: usize) {
        let body = serde_json::json!({
            "question": question,
            "options": options,
            "answer_index": answer_index,
        });
        self.push(Some(&format!("```json\n{body}\n```")));
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        prompt: &str,
        _context: &SessionContext,
    ) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_owned());
        match self.responses.lock().unwrap().pop_front() {
            Some(Some(text)) => Ok(text),
            Some(None) => Err(GenerationError::EmptyResponse),
            None => Err(GenerationError::Malformed("script exhausted".into())),
        }
    }
}

#[derive(Default)]
struct RecordingHistory {
    turns: Mutex<Vec<(Turn, SessionMetadata)>>,
    snapshots: Mutex<Vec<SessionAnalytics>>,
}

#[async_trait]
impl HistoryLogger for RecordingHistory {
    async fn append(&self, turn: &Turn, metadata: &SessionMetadata) {
        self.turns
            .lock()
            .unwrap()
            .push((turn.clone(), metadata.clone()));
    }

    async fn snapshot(&self, _session_id: SessionId, analytics: &SessionAnalytics) {
        self.snapshots.lock().unwrap().push(analytics.clone());
    }
}

struct BrokenHistoryRepo;

#[async_trait]
impl HistoryRepository for BrokenHistoryRepo {
    async fn append_record(&self, _record: &HistoryRecord) -> Result<i64, StorageError> {
        Err(StorageError::Connection("database is locked".into()))
    }

    async fn records_for_session(
        &self,
        _session_id: SessionId,
    ) -> Result<Vec<HistoryRecord>, StorageError> {
        Err(StorageError::Connection("database is locked".into()))
    }
}

struct Harness {
    language: Arc<FakeLanguage>,
    generator: Arc<ScriptedGenerator>,
    history: Arc<RecordingHistory>,
}

impl Harness {
    fn new() -> Self {
        Self::with_language(FakeLanguage::default())
    }

    fn with_language(language: FakeLanguage) -> Self {
        Self {
            language: Arc::new(language),
            generator: Arc::new(ScriptedGenerator::default()),
            history: Arc::new(RecordingHistory::default()),
        }
    }

    fn collaborators(&self) -> Collaborators {
        Collaborators {
            language: self.language.clone(),
            generator: self.generator.clone(),
            history: self.history.clone(),
            clock: Clock::fixed(fixed_now()),
        }
    }

    fn services(&self, config: ControllerConfig) -> AppServices {
        AppServices::from_parts(self.collaborators(), config)
    }

    fn controller(&self) -> StepController {
        self.controller_with(ControllerConfig::default())
    }

    fn controller_with(&self, config: ControllerConfig) -> StepController {
        self.services(config)
            .new_session(LearnerProfile::default())
            .with_shuffle_options(false)
    }
}

async fn to_practice(controller: &mut StepController) {
    controller
        .handle(StepEvent::submit(StepId::SetGoal, "learn Spanish basics"))
        .await
        .unwrap();
    controller
        .handle(StepEvent::submit(StepId::DetectLanguage, "Hola, ¿cómo estás?"))
        .await
        .unwrap();
}

//
// ─── SCENARIOS ─────────────────────────────────────────────────────────────────
//

#[tokio::test]
async fn goal_moves_to_detection() {
    let harness = Harness::new();
    let mut controller = harness.controller();

    let report = controller
        .handle(StepEvent::submit(StepId::SetGoal, "learn Spanish basics"))
        .await
        .unwrap();

    assert_eq!(report.previous_step, StepId::SetGoal);
    assert_eq!(report.current_step, StepId::DetectLanguage);
    assert_eq!(controller.session().goal(), Some("learn Spanish basics"));
    assert!(controller.session().turns().is_empty());
}

#[tokio::test]
async fn empty_goal_is_rejected_and_resubmission_wins() {
    let harness = Harness::new();
    let mut controller = harness.controller();

    let err = controller
        .handle(StepEvent::submit(StepId::SetGoal, "   "))
        .await
        .unwrap_err();
    assert!(matches!(err, StepError::Validation(ValidationError::EmptyGoal)));
    assert_eq!(controller.current_step(), StepId::SetGoal);
    assert_eq!(controller.session().goal(), None);

    controller
        .handle(StepEvent::submit(StepId::SetGoal, "order tapas"))
        .await
        .unwrap();
    assert_eq!(controller.session().goal(), Some("order tapas"));
    assert_eq!(controller.current_step(), StepId::DetectLanguage);
}

#[tokio::test]
async fn detection_sets_source_language() {
    let harness = Harness::new();
    let mut controller = harness.controller();
    to_practice(&mut controller).await;

    assert_eq!(controller.current_step(), StepId::PracticeConversation);
    assert_eq!(
        controller.session().source_language().map(LanguageCode::as_str),
        Some("es")
    );
    assert_eq!(
        controller.session().target_language().map(LanguageCode::as_str),
        Some("es")
    );
}

#[tokio::test]
async fn failed_detection_keeps_state() {
    let harness = Harness::new();
    let mut controller = harness.controller();
    controller
        .handle(StepEvent::submit(StepId::SetGoal, "travel"))
        .await
        .unwrap();
    let before = controller.session().clone();

    let err = controller
        .handle(StepEvent::submit(StepId::DetectLanguage, ""))
        .await
        .unwrap_err();

    assert!(matches!(err, StepError::Detection(DetectionError::EmptyText)));
    assert_eq!(err.kind(), "detection");
    assert_eq!(controller.session(), &before);
    assert_eq!(controller.session().source_language(), None);
}

#[tokio::test]
async fn practice_appends_one_turn_with_translation_and_note() {
    let harness = Harness::new();
    let mut controller = harness.controller();
    to_practice(&mut controller).await;
    harness
        .generator
        .push(Some("'va' should be 'voy' for first person"));

    let report = controller
        .handle(StepEvent::submit(
            StepId::PracticeConversation,
            "Yo va a la tienda",
        ))
        .await
        .unwrap();

    assert!(!report.transitioned());
    let turns = controller.session().turns();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].translated_text(), Some("I go to the store"));
    assert_eq!(
        turns[0].grammar_note(),
        Some("'va' should be 'voy' for first person")
    );
    assert_eq!(
        turns[0].detected_language().map(LanguageCode::as_str),
        Some("es")
    );
    // Written in the language being studied, so translated back to English
    // with the source left to detection.
    assert_eq!(harness.language.translations(), vec![(None, "en".to_owned())]);
    assert_eq!(
        controller.session().last_grammar_note(),
        Some("'va' should be 'voy' for first person")
    );
    assert_eq!(report.appended_turn.as_ref(), Some(&turns[0]));

    let logged = harness.history.turns.lock().unwrap();
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].1.goal.as_deref(), Some("learn Spanish basics"));
    assert_eq!(logged[0].1.step, StepId::PracticeConversation);
}

#[tokio::test]
async fn english_writer_is_translated_into_the_target() {
    let harness = Harness::new();
    let mut controller = harness.controller();
    controller
        .handle(StepEvent::submit(StepId::SetGoal, "chat with my in-laws"))
        .await
        .unwrap();
    controller
        .handle(StepEvent::submit(StepId::DetectLanguage, "Hello there"))
        .await
        .unwrap();
    assert_eq!(
        controller.session().source_language().map(LanguageCode::as_str),
        Some("en")
    );
    harness.generator.push(Some("Correct."));

    let report = controller
        .handle(StepEvent::submit(
            StepId::PracticeConversation,
            "Where is the station?",
        ))
        .await
        .unwrap();

    let turn = report.appended_turn.unwrap();
    assert_eq!(turn.translated_text(), Some("[es] Where is the station?"));
    assert_eq!(turn.detected_language().map(LanguageCode::as_str), Some("en"));
    assert_eq!(harness.language.translations(), vec![(None, "es".to_owned())]);
}

#[tokio::test]
async fn each_utterance_is_detected_on_its_own() {
    let harness = Harness::new();
    let mut controller = harness.controller();
    to_practice(&mut controller).await;
    harness.generator.push(Some("Good."));
    harness.generator.push(Some("That is French."));

    controller
        .handle(StepEvent::submit(StepId::PracticeConversation, "Quiero pan"))
        .await
        .unwrap();
    let report = controller
        .handle(StepEvent::submit(
            StepId::PracticeConversation,
            "Bonjour tout le monde",
        ))
        .await
        .unwrap();

    let turn = report.appended_turn.unwrap();
    assert_eq!(turn.detected_language().map(LanguageCode::as_str), Some("fr"));
    let analytics = controller.analytics();
    assert_eq!(analytics.languages_used.get("Spanish"), Some(&1));
    assert_eq!(analytics.languages_used.get("French"), Some(&1));
    assert!(
        harness
            .language
            .translations()
            .iter()
            .all(|(source, _)| source.is_none())
    );
}

#[tokio::test]
async fn generation_failure_leaves_practice_untouched() {
    let harness = Harness::new();
    let mut controller = harness.controller();
    to_practice(&mut controller).await;
    harness.generator.push(None);
    let before = controller.session().clone();

    let err = controller
        .handle(StepEvent::submit(StepId::PracticeConversation, "Quiero pan"))
        .await
        .unwrap_err();

    assert!(matches!(err, StepError::Generation(GenerationError::EmptyResponse)));
    assert_eq!(controller.session(), &before);
    assert!(harness.history.turns.lock().unwrap().is_empty());
}

#[tokio::test]
async fn translation_failure_skips_generation() {
    let harness = Harness::with_language(FakeLanguage {
        fail_translate: true,
        ..FakeLanguage::default()
    });
    let mut controller = harness.controller();
    to_practice(&mut controller).await;

    let err = controller
        .handle(StepEvent::submit(StepId::PracticeConversation, "Quiero pan"))
        .await
        .unwrap_err();

    assert!(matches!(err, StepError::Translation(_)));
    assert!(harness.generator.prompts.lock().unwrap().is_empty());
    assert!(controller.session().turns().is_empty());
}

#[tokio::test]
async fn empty_utterance_makes_no_calls() {
    let harness = Harness::new();
    let mut controller = harness.controller();
    to_practice(&mut controller).await;

    let err = controller
        .handle(StepEvent::submit(StepId::PracticeConversation, "  "))
        .await
        .unwrap_err();

    assert!(matches!(err, StepError::Validation(ValidationError::EmptyInput)));
    assert!(harness.language.translations().is_empty());
}

#[tokio::test]
async fn stale_events_are_rejected() {
    let harness = Harness::new();
    let mut controller = harness.controller();

    let err = controller
        .handle(StepEvent::submit(StepId::PracticeConversation, "Hola"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StepError::Validation(ValidationError::StaleStep {
            expected: StepId::SetGoal,
            got: StepId::PracticeConversation,
        })
    ));
    assert!(harness.language.translations().is_empty());
}

#[tokio::test]
async fn unsupported_actions_are_rejected() {
    let harness = Harness::new();
    let mut controller = harness.controller();

    let err = controller
        .handle(StepEvent::new(StepId::SetGoal, StepAction::ReadyForQuiz))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StepError::Validation(ValidationError::UnsupportedAction {
            step: StepId::SetGoal,
            action: "ready_for_quiz",
        })
    ));

    let err = controller
        .handle(StepEvent::new(StepId::SetGoal, StepAction::Back))
        .await
        .unwrap_err();
    assert!(matches!(err, StepError::Validation(ValidationError::AtFirstStep)));
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

fn two_question_config() -> ControllerConfig {
    ControllerConfig {
        quiz_questions: 2,
        ..ControllerConfig::default()
    }
}

async fn to_quiz(harness: &Harness, controller: &mut StepController) {
    to_practice(controller).await;
    harness.generator.push(Some("Looks good."));
    controller
        .handle(StepEvent::submit(StepId::PracticeConversation, "Quiero pan"))
        .await
        .unwrap();
    harness
        .generator
        .push_question("Translate 'bread'", &["pan", "agua", "leche"], 0);
    let report = controller
        .handle(StepEvent::new(
            StepId::PracticeConversation,
            StepAction::ReadyForQuiz,
        ))
        .await
        .unwrap();
    assert_eq!(report.current_step, StepId::Quiz);
}

#[tokio::test]
async fn wrong_answer_counts_toward_total_only() {
    let harness = Harness::new();
    let mut controller = harness.controller_with(two_question_config());
    to_quiz(&harness, &mut controller).await;
    harness
        .generator
        .push_question("Translate 'water'", &["pan", "agua"], 1);

    let report = controller
        .handle(StepEvent::submit(StepId::Quiz, "agua"))
        .await
        .unwrap();

    let score = controller.session().quiz_score();
    assert_eq!((score.correct(), score.total()), (0, 1));
    assert_eq!(report.current_step, StepId::Quiz);
    assert_eq!(report.notice.as_deref(), Some("Wrong. Correct answer: pan"));
    let turn = report.appended_turn.unwrap();
    assert!(turn.is_quiz_answer());
    assert_eq!(turn.is_correct(), Some(false));
    assert_eq!(
        controller
            .session()
            .quiz_round()
            .pending()
            .map(|q| q.question()),
        Some("Translate 'water'")
    );
}

#[tokio::test]
async fn round_ends_in_analytics_and_snapshots() {
    let harness = Harness::new();
    let mut controller = harness.controller_with(two_question_config());
    to_quiz(&harness, &mut controller).await;
    harness
        .generator
        .push_question("Translate 'water'", &["pan", "agua"], 1);

    controller
        .handle(StepEvent::submit(StepId::Quiz, "1"))
        .await
        .unwrap();
    let report = controller
        .handle(StepEvent::submit(StepId::Quiz, "2"))
        .await
        .unwrap();

    assert_eq!(report.current_step, StepId::Analytics);
    assert_eq!(report.notice.as_deref(), Some("Correct ✅"));
    let score = controller.session().quiz_score();
    assert_eq!((score.correct(), score.total()), (2, 2));
    assert!(controller.session().quiz_round().pending().is_none());

    let analytics = controller.analytics();
    assert_eq!(analytics.turn_count, 3);
    assert_eq!(analytics.accuracy, Some(1.0));
    assert_eq!(harness.history.snapshots.lock().unwrap().len(), 1);
    assert_eq!(harness.history.turns.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn failed_next_question_keeps_answer_unrecorded() {
    let harness = Harness::new();
    let mut controller = harness.controller_with(two_question_config());
    to_quiz(&harness, &mut controller).await;
    harness.generator.push(Some("not a question"));
    let before = controller.session().clone();

    let err = controller
        .handle(StepEvent::submit(StepId::Quiz, "pan"))
        .await
        .unwrap_err();

    assert!(matches!(err, StepError::Generation(GenerationError::Malformed(_))));
    assert_eq!(controller.session(), &before);
    assert_eq!(controller.session().quiz_score().total(), 0);
}

#[tokio::test]
async fn unknown_option_is_a_validation_error() {
    let harness = Harness::new();
    let mut controller = harness.controller_with(two_question_config());
    to_quiz(&harness, &mut controller).await;

    let err = controller
        .handle(StepEvent::submit(StepId::Quiz, "7"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StepError::Validation(ValidationError::UnknownOption { options: 3, .. })
    ));
    assert_eq!(controller.session().quiz_score().total(), 0);
}

#[tokio::test]
async fn quiz_start_failure_stays_in_practice() {
    let harness = Harness::new();
    let mut controller = harness.controller();
    to_practice(&mut controller).await;
    harness.generator.push(None);

    let err = controller
        .handle(StepEvent::new(
            StepId::PracticeConversation,
            StepAction::ReadyForQuiz,
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, StepError::Generation(_)));
    assert_eq!(controller.current_step(), StepId::PracticeConversation);
    assert!(controller.session().quiz_round().pending().is_none());
}

//
// ─── NAVIGATION ────────────────────────────────────────────────────────────────
//

#[tokio::test]
async fn back_keeps_collected_data() {
    let harness = Harness::new();
    let mut controller = harness.controller_with(two_question_config());
    to_quiz(&harness, &mut controller).await;

    let report = controller
        .handle(StepEvent::new(StepId::Quiz, StepAction::Back))
        .await
        .unwrap();

    assert_eq!(report.current_step, StepId::PracticeConversation);
    let session = controller.session();
    assert_eq!(session.turns().len(), 1);
    assert_eq!(session.goal(), Some("learn Spanish basics"));
    assert!(session.source_language().is_some());
    assert!(session.quiz_round().pending().is_none());

    controller
        .handle(StepEvent::new(StepId::PracticeConversation, StepAction::Back))
        .await
        .unwrap();
    assert_eq!(controller.current_step(), StepId::DetectLanguage);
    assert_eq!(controller.session().turns().len(), 1);
}

#[tokio::test]
async fn analytics_accepts_no_input_and_practice_again_reenters() {
    let harness = Harness::new();
    let mut controller = harness.controller_with(ControllerConfig {
        quiz_questions: 1,
        ..ControllerConfig::default()
    });
    to_quiz(&harness, &mut controller).await;
    controller
        .handle(StepEvent::submit(StepId::Quiz, "pan"))
        .await
        .unwrap();
    assert_eq!(controller.current_step(), StepId::Analytics);

    let err = controller
        .handle(StepEvent::submit(StepId::Analytics, "hello"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StepError::Validation(ValidationError::NoInputExpected(StepId::Analytics))
    ));

    controller
        .handle(StepEvent::new(StepId::Analytics, StepAction::PracticeAgain))
        .await
        .unwrap();
    assert_eq!(controller.current_step(), StepId::PracticeConversation);
    assert_eq!(controller.session().quiz_score().total(), 1);
}

#[tokio::test]
async fn back_from_analytics_skips_finished_round() {
    let harness = Harness::new();
    let mut controller = harness.controller_with(ControllerConfig {
        quiz_questions: 1,
        ..ControllerConfig::default()
    });
    to_quiz(&harness, &mut controller).await;
    controller
        .handle(StepEvent::submit(StepId::Quiz, "pan"))
        .await
        .unwrap();

    controller
        .handle(StepEvent::new(StepId::Analytics, StepAction::Back))
        .await
        .unwrap();
    assert_eq!(controller.current_step(), StepId::PracticeConversation);
}

//
// ─── LIMITS, PROFILE, LOGGING ──────────────────────────────────────────────────
//

#[tokio::test]
async fn turn_limit_blocks_before_external_calls() {
    let harness = Harness::new();
    let mut controller = harness.controller_with(ControllerConfig {
        max_turns: 1,
        ..ControllerConfig::default()
    });
    to_practice(&mut controller).await;
    harness.generator.push(Some("Fine."));
    controller
        .handle(StepEvent::submit(StepId::PracticeConversation, "Hola"))
        .await
        .unwrap();

    let err = controller
        .handle(StepEvent::submit(StepId::PracticeConversation, "Adiós"))
        .await
        .unwrap_err();

    assert!(matches!(err, StepError::Validation(ValidationError::Session(_))));
    assert_eq!(harness.language.translations().len(), 1);
    assert_eq!(controller.session().turns().len(), 1);
}

#[tokio::test]
async fn profile_update_changes_target_without_moving() {
    let harness = Harness::new();
    let mut controller = harness.controller();
    let french = LanguageCode::from_name("French").unwrap();
    let profile = LearnerProfile::new(french.clone(), Level::Intermediate, 30, ConversationStyle::Formal)
        .unwrap();

    controller.update_profile(profile).unwrap();

    assert_eq!(controller.current_step(), StepId::SetGoal);
    assert_eq!(controller.session().target_language(), Some(&french));
    assert_eq!(controller.session().profile().daily_minutes(), 30);
}

#[tokio::test]
async fn history_failures_do_not_affect_the_session() {
    let harness = Harness::new();
    let repo = InMemoryRepository::new();
    let analytics: Arc<dyn AnalyticsRepository> = Arc::new(repo);
    let collaborators = Collaborators {
        history: Arc::new(RepositoryHistoryLogger::new(
            Clock::fixed(fixed_now()),
            Arc::new(BrokenHistoryRepo),
            analytics,
        )),
        ..harness.collaborators()
    };
    let session = lingua_core::model::Session::new(
        SessionId::random(),
        LearnerProfile::default(),
        fixed_now(),
    );
    let mut controller = StepController::new(session, collaborators, ControllerConfig::default());
    to_practice(&mut controller).await;
    harness.generator.push(Some("Good."));

    let report = controller
        .handle(StepEvent::submit(StepId::PracticeConversation, "Buenos días"))
        .await
        .unwrap();

    assert!(report.appended_turn.is_some());
    assert_eq!(controller.session().turns().len(), 1);
}

#[tokio::test]
async fn grammar_prompt_names_target_language() {
    let harness = Harness::new();
    let mut controller = harness.controller();
    to_practice(&mut controller).await;
    harness.generator.push(Some("Correct."));

    controller
        .handle(StepEvent::submit(StepId::PracticeConversation, "Hola"))
        .await
        .unwrap();

    let prompts = harness.generator.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Spanish"));
    assert!(prompts[0].contains("\"Hola\""));
}
