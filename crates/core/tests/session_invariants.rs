use lingua_core::model::{
    LanguageCode, LearnerProfile, QuizQuestion, QuizRound, Session, SessionId, SessionUpdate,
    StepId, Turn,
};
use lingua_core::time::fixed_now;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Move(usize),
    Goal(String),
    Source,
    Practice(String),
    Answer(bool),
    Round,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0_usize..5).prop_map(Op::Move),
        "[a-z ]{0,12}".prop_map(Op::Goal),
        Just(Op::Source),
        "[a-z ]{1,12}".prop_map(Op::Practice),
        any::<bool>().prop_map(Op::Answer),
        Just(Op::Round),
    ]
}

fn update_for(op: &Op) -> SessionUpdate {
    match op {
        Op::Move(i) => SessionUpdate::new().move_to(StepId::ALL[*i]),
        Op::Goal(goal) => SessionUpdate::new().goal(goal.clone()),
        Op::Source => SessionUpdate::new().source_language(LanguageCode::new("es").unwrap()),
        Op::Practice(text) => SessionUpdate::new().append_turn(Turn::practice(
            text.clone(),
            None,
            "translation",
            "note",
            fixed_now(),
        )),
        Op::Answer(correct) => {
            SessionUpdate::new().append_turn(Turn::quiz_answer("1", *correct, fixed_now()))
        }
        Op::Round => {
            let q = QuizQuestion::new("q", vec!["a".into(), "b".into()], 0).unwrap();
            SessionUpdate::new().quiz_round(QuizRound::starting_with(q))
        }
    }
}

proptest! {
    #[test]
    fn invariants_hold_for_any_update_sequence(
        ops in prop::collection::vec(op(), 0..64),
        max_turns in 1_usize..16,
    ) {
        let mut session = Session::new(SessionId::random(), LearnerProfile::default(), fixed_now())
            .with_max_turns(max_turns);

        for op in &ops {
            let before = session.clone();
            let step_before = session.current_step();
            let result = session.apply(update_for(op));

            prop_assert!(StepId::ALL.contains(&session.current_step()));
            prop_assert!(session.quiz_score().correct() <= session.quiz_score().total());
            prop_assert!(session.turns().len() <= max_turns);
            prop_assert!(session.turns().len() >= before.turns().len());
            prop_assert_eq!(&session.turns()[..before.turns().len()], before.turns());

            if session.turns().len() > before.turns().len() {
                prop_assert!(step_before.records_turns());
            }
            if result.is_err() {
                prop_assert_eq!(&session, &before);
            }
        }
    }
}
