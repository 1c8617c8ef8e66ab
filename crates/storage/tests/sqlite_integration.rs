use chrono::Duration;
use lingua_core::SessionAnalytics;
use lingua_core::model::{
    LanguageCode, LearnerProfile, QuizQuestion, QuizRound, Session, SessionId, SessionUpdate,
    StepId, Turn,
};
use lingua_core::time::fixed_now;
use storage::repository::{
    AnalyticsRepository, AnalyticsSnapshot, HistoryRecord, HistoryRepository, StorageError,
};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn practice_session() -> Session {
    let mut session = Session::new(SessionId::random(), LearnerProfile::default(), fixed_now());
    session
        .apply(
            SessionUpdate::new()
                .goal("learn Spanish basics")
                .source_language(LanguageCode::new("es").unwrap())
                .move_to(StepId::PracticeConversation),
        )
        .unwrap();
    session
}

#[tokio::test]
async fn sqlite_roundtrips_practice_and_quiz_turns() {
    let repo = connect("memdb_history_roundtrip").await;
    let session = practice_session();

    let practice = Turn::practice(
        "Yo va a la tienda",
        Some(LanguageCode::new("es").unwrap()),
        "I go to the store",
        "'va' should be 'voy' for first person",
        fixed_now(),
    );
    let quiz = Turn::quiz_answer("Hola", true, fixed_now() + Duration::minutes(1));

    repo.append_record(&HistoryRecord::from_turn(&practice, &session.metadata()))
        .await
        .unwrap();
    repo.append_record(&HistoryRecord::from_turn(&quiz, &session.metadata()))
        .await
        .unwrap();

    let records = repo.records_for_session(session.id()).await.unwrap();
    assert_eq!(records.len(), 2);

    let first = &records[0];
    assert_eq!(first.session_id, session.id());
    assert_eq!(first.step, StepId::PracticeConversation);
    assert_eq!(first.goal.as_deref(), Some("learn Spanish basics"));
    assert_eq!(first.source_language.as_ref().map(LanguageCode::as_str), Some("es"));
    assert_eq!(first.target_language.as_ref().map(LanguageCode::as_str), Some("es"));
    assert_eq!(first.translated_text.as_deref(), Some("I go to the store"));
    assert!(!first.is_quiz_answer);
    assert_eq!(first.is_correct, None);
    assert_eq!(first.recorded_at, fixed_now());

    let second = &records[1];
    assert!(second.is_quiz_answer);
    assert_eq!(second.is_correct, Some(true));
    assert_eq!(second.grammar_note, None);
}

#[tokio::test]
async fn sqlite_history_is_scoped_per_session() {
    let repo = connect("memdb_history_scoped").await;
    let one = practice_session();
    let two = practice_session();
    let turn = Turn::practice("Hola", None, "Hello", "fine", fixed_now());

    repo.append_record(&HistoryRecord::from_turn(&turn, &one.metadata()))
        .await
        .unwrap();
    repo.append_record(&HistoryRecord::from_turn(&turn, &two.metadata()))
        .await
        .unwrap();

    assert_eq!(repo.records_for_session(one.id()).await.unwrap().len(), 1);
    assert!(
        repo.records_for_session(SessionId::random())
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn sqlite_returns_latest_analytics_snapshot() {
    let repo = connect("memdb_analytics_latest").await;
    let mut session = practice_session();

    assert!(matches!(
        repo.latest_snapshot(session.id()).await,
        Err(StorageError::NotFound)
    ));

    repo.save_snapshot(&AnalyticsSnapshot {
        session_id: session.id(),
        captured_at: fixed_now(),
        analytics: SessionAnalytics::from_session(&session),
    })
    .await
    .unwrap();

    let question = QuizQuestion::new("q", vec!["a".into(), "b".into()], 1).unwrap();
    session
        .apply(
            SessionUpdate::new()
                .move_to(StepId::Quiz)
                .quiz_round(QuizRound::starting_with(question)),
        )
        .unwrap();
    session
        .apply(SessionUpdate::new().append_turn(Turn::quiz_answer("b", true, fixed_now())))
        .unwrap();

    repo.save_snapshot(&AnalyticsSnapshot {
        session_id: session.id(),
        captured_at: fixed_now() + Duration::minutes(5),
        analytics: SessionAnalytics::from_session(&session),
    })
    .await
    .unwrap();

    let latest = repo.latest_snapshot(session.id()).await.unwrap();
    assert_eq!(latest.captured_at, fixed_now() + Duration::minutes(5));
    assert_eq!(latest.analytics.quiz_answers, 1);
    assert_eq!(latest.analytics.accuracy, Some(1.0));
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = connect("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
}
