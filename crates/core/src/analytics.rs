use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{QuizScore, Session};

/// How many grammar notes the summary keeps.
pub const RECENT_NOTES: usize = 3;

/// Label for turns without a detected language.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// Progress summary derived from a session. Pure, no external calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionAnalytics {
    pub turn_count: usize,
    pub practice_turns: usize,
    pub quiz_answers: usize,
    pub quiz_score: QuizScore,
    pub accuracy: Option<f64>,
    pub total_words: usize,
    pub languages_used: BTreeMap<String, u32>,
    pub percent_in_target: f64,
    /// Newest first.
    pub recent_grammar_notes: Vec<String>,
}

impl SessionAnalytics {
    #[must_use]
    pub fn from_session(session: &Session) -> Self {
        let turns = session.turns();
        let target = session.target_language();

        let mut languages_used = BTreeMap::new();
        let mut practice_turns = 0_usize;
        let mut in_target = 0_usize;
        for turn in turns.iter().filter(|t| !t.is_quiz_answer()) {
            practice_turns += 1;
            let label = turn
                .detected_language()
                .map_or(UNKNOWN_LANGUAGE, |code| code.display_name())
                .to_owned();
            *languages_used.entry(label).or_insert(0_u32) += 1;
            if turn.detected_language().is_some() && turn.detected_language() == target {
                in_target += 1;
            }
        }

        let percent_in_target = if practice_turns == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let pct = in_target as f64 / practice_turns as f64 * 100.0;
            pct
        };

        let recent_grammar_notes = turns
            .iter()
            .rev()
            .filter_map(|t| t.grammar_note())
            .take(RECENT_NOTES)
            .map(str::to_owned)
            .collect();

        let quiz_score = session.quiz_score();
        Self {
            turn_count: turns.len(),
            practice_turns,
            quiz_answers: turns.len() - practice_turns,
            quiz_score,
            accuracy: quiz_score.accuracy(),
            total_words: turns.iter().map(|t| t.word_count()).sum(),
            languages_used,
            percent_in_target,
            recent_grammar_notes,
        }
    }
}
