//! Prompt assembly for the text generator.

use serde::Serialize;

use lingua_core::model::{Session, Turn};

/// The slice of a session a generator needs for a context-aware answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionContext {
    pub goal: Option<String>,
    pub target_language: Option<String>,
    pub source_language: Option<String>,
    pub level: String,
    pub style: String,
    pub recent_turns: Vec<ContextTurn>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextTurn {
    pub learner: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grammar_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiz_correct: Option<bool>,
}

impl From<&Turn> for ContextTurn {
    fn from(turn: &Turn) -> Self {
        Self {
            learner: turn.raw_input().to_owned(),
            translation: turn.translated_text().map(str::to_owned),
            grammar_note: turn.grammar_note().map(str::to_owned),
            quiz_correct: turn.is_correct(),
        }
    }
}

impl SessionContext {
    /// Goal, profile, languages and the last `turns` turns of `session`.
    #[must_use]
    pub fn from_session(session: &Session, turns: usize) -> Self {
        let profile = session.profile();
        Self {
            goal: session.goal().map(str::to_owned),
            target_language: session
                .target_language()
                .map(|code| code.display_name().to_owned()),
            source_language: session
                .source_language()
                .map(|code| code.display_name().to_owned()),
            level: profile.level().to_string(),
            style: profile.style().to_string(),
            recent_turns: session
                .recent_turns(turns)
                .iter()
                .map(ContextTurn::from)
                .collect(),
        }
    }

    /// Compact JSON rendering, falls back to `{}`.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_owned())
    }

    fn target_or_default(&self) -> &str {
        self.target_language.as_deref().unwrap_or("the target language")
    }
}

/// Ask for short grammar feedback on a learner utterance.
#[must_use]
pub fn grammar_notes(utterance: &str, context: &SessionContext) -> String {
    format!(
        "You are a helpful language tutor. The learner is studying {target} at {level} level \
         and wrote: \"{utterance}\".\n\
         Explain grammar points, mistakes, or improvements in 1-3 short bullet points. \
         Keep it simple and learner-friendly. If the sentence is correct, say so briefly.",
        target = context.target_or_default(),
        level = context.level,
    )
}

/// Ask for one multiple-choice question as a bare JSON object.
#[must_use]
pub fn quiz_question(number: u32, total: u32, context: &SessionContext) -> String {
    format!(
        "Create question {number} of {total} of a short quiz for a {level} learner of {target}. \
         Base it on the phrases and mistakes in the learner's recent turns when there are any; \
         otherwise ask them to translate a short everyday English phrase into {target}.\n\
         Return a single JSON object only, like:\n\
         {{\"question\":\"Translate 'Hello' into Spanish\",\"options\":[\"Hola\",\"Adiós\",\"Gracias\"],\"answer_index\":0}}\n\
         Use three or four distinct options and exactly one correct answer.",
        level = context.level,
        target = context.target_or_default(),
    )
}

/// Strip a surrounding Markdown code fence (```json ... ```) from model output.
#[must_use]
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    let body = match rest.split_once('\n') {
        Some((_, body)) => body,
        // One-line fence: drop a leading language tag such as `json`.
        None => match rest.split_once(char::is_whitespace) {
            Some((tag, body)) if !tag.is_empty() && tag.chars().all(char::is_alphanumeric) => body,
            _ => rest,
        },
    };
    body.trim()
}
