//! Line-oriented terminal presenter: renders the session and turns input
//! lines into controller commands.

use std::fmt::Write as _;

use lingua_core::SessionAnalytics;
use lingua_core::model::{
    ConversationStyle, LanguageCode, LearnerProfile, Level, Session, StepId,
};
use services::{StepAction, StepError, StepReport};

/// What one input line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Step(StepAction),
    Profile(ProfileEdit),
    Stats,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileEdit {
    Target(String),
    Level(String),
    Minutes(String),
    Style(String),
}

/// Parse one line. Anything not starting with `:` is submitted as-is.
pub fn parse_line(line: &str) -> Result<Command, String> {
    let trimmed = line.trim();
    let Some(rest) = trimmed.strip_prefix(':') else {
        return Ok(Command::Step(StepAction::Submit(trimmed.to_owned())));
    };
    let (name, arg) = rest
        .split_once(char::is_whitespace)
        .map_or((rest, ""), |(name, arg)| (name, arg.trim()));
    let require = |arg: &str| {
        if arg.is_empty() {
            Err(format!(":{name} needs a value"))
        } else {
            Ok(arg.to_owned())
        }
    };

    match name.to_ascii_lowercase().as_str() {
        "back" | "b" => Ok(Command::Step(StepAction::Back)),
        "quiz" => Ok(Command::Step(StepAction::ReadyForQuiz)),
        "practice" => Ok(Command::Step(StepAction::PracticeAgain)),
        "stats" => Ok(Command::Stats),
        "help" | "h" | "?" => Ok(Command::Help),
        "quit" | "q" | "exit" => Ok(Command::Quit),
        "target" => require(arg).map(|v| Command::Profile(ProfileEdit::Target(v))),
        "level" => require(arg).map(|v| Command::Profile(ProfileEdit::Level(v))),
        "minutes" => require(arg).map(|v| Command::Profile(ProfileEdit::Minutes(v))),
        "style" => require(arg).map(|v| Command::Profile(ProfileEdit::Style(v))),
        other => Err(format!("unknown command :{other} (try :help)")),
    }
}

/// Apply one edit to a copy of `current`.
pub fn edited_profile(current: &LearnerProfile, edit: &ProfileEdit) -> Result<LearnerProfile, String> {
    let mut target = current.target_language().clone();
    let mut level = current.level();
    let mut minutes = current.daily_minutes();
    let mut style = current.style();

    match edit {
        ProfileEdit::Target(raw) => {
            target = LanguageCode::resolve(raw).ok_or_else(|| {
                let names: Vec<String> = LanguageCode::known()
                    .map(|code| code.display_name().to_owned())
                    .collect();
                format!("unknown language: {raw} (try {})", names.join(", "))
            })?;
        }
        ProfileEdit::Level(raw) => level = raw.parse::<Level>().map_err(|e| e.to_string())?,
        ProfileEdit::Minutes(raw) => {
            minutes = raw
                .trim()
                .parse()
                .map_err(|_| format!("not a number: {raw}"))?;
        }
        ProfileEdit::Style(raw) => {
            style = raw.parse::<ConversationStyle>().map_err(|e| e.to_string())?;
        }
    }

    LearnerProfile::new(target, level, minutes, style).map_err(|e| e.to_string())
}

pub fn help() -> &'static str {
    "Type your answer and press Enter.\n\
     :back       previous step\n\
     :quiz       start the quiz (practice step)\n\
     :practice   practice again (analytics step)\n\
     :stats      show progress\n\
     :target X   learning language (name or code)\n\
     :level X    beginner | intermediate | advanced\n\
     :minutes N  daily minutes (5-120, steps of 5)\n\
     :style X    casual | formal\n\
     :quit       leave"
}

/// Heading plus the prompt for the current step. `quiz_questions` is the
/// round length.
#[must_use]
pub fn render_step(session: &Session, quiz_questions: u32) -> String {
    let step = session.current_step();
    let mut out = format!(
        "\n== Step {}/{}: {} ==\n",
        step.index() + 1,
        StepId::ALL.len(),
        step.title()
    );
    let target = session
        .target_language()
        .map_or("your target language", LanguageCode::display_name);

    let prompt = match step {
        StepId::SetGoal => {
            let profile = session.profile();
            format!(
                "Profile: {} | {} | {} min/day | {}\nWhat is your learning goal?",
                profile.target_language().display_name(),
                profile.level(),
                profile.daily_minutes(),
                profile.style()
            )
        }
        StepId::DetectLanguage => "Write a sentence in the language you speak.".to_owned(),
        StepId::PracticeConversation => format!(
            "Write something in {target}. Type :quiz when you are ready for the quiz."
        ),
        StepId::Quiz => session.quiz_round().pending().map_or_else(
            || "No question pending. Type :back.".to_owned(),
            |question| {
                let mut text = format!(
                    "Question {} of {quiz_questions}: {}\n",
                    session.quiz_round().answered() + 1,
                    question.question()
                );
                for (i, option) in question.options().iter().enumerate() {
                    let _ = writeln!(text, "  {}. {option}", i + 1);
                }
                text.push_str("Answer with a number or the option text.");
                text
            },
        ),
        StepId::Analytics => {
            "Type :practice to keep practicing, :back to go back, :quit to finish.".to_owned()
        }
    };
    out.push_str(&prompt);
    out
}

/// Feedback for a handled event.
#[must_use]
pub fn render_report(report: &StepReport) -> String {
    let mut out = String::new();
    if let Some(notice) = &report.notice {
        out.push_str(notice);
        out.push('\n');
    }
    if let Some(turn) = report.appended_turn.as_ref().filter(|t| !t.is_quiz_answer()) {
        if let Some(translation) = turn.translated_text() {
            let _ = writeln!(out, "Translation: {translation}");
        }
        if let Some(note) = turn.grammar_note() {
            let _ = writeln!(out, "Grammar notes:\n{note}");
        }
    }
    out.trim_end().to_owned()
}

#[must_use]
pub fn render_error(err: &StepError) -> String {
    match err {
        StepError::Validation(inner) => format!("! {inner}"),
        other => format!("! {} failed: {other}. Try again.", other.kind()),
    }
}

#[must_use]
pub fn render_analytics(analytics: &SessionAnalytics) -> String {
    let mut out = String::from("-- Progress --\n");
    let _ = writeln!(
        out,
        "Turns: {} ({} practice, {} quiz)",
        analytics.turn_count, analytics.practice_turns, analytics.quiz_answers
    );
    let _ = writeln!(
        out,
        "Quiz: {}/{}{}",
        analytics.quiz_score.correct(),
        analytics.quiz_score.total(),
        analytics
            .accuracy
            .map(|a| format!(" ({:.0}%)", a * 100.0))
            .unwrap_or_default()
    );
    let _ = writeln!(out, "Words written: {}", analytics.total_words);
    let _ = writeln!(
        out,
        "In target language: {:.0}%",
        analytics.percent_in_target
    );
    if !analytics.languages_used.is_empty() {
        let used: Vec<String> = analytics
            .languages_used
            .iter()
            .map(|(name, count)| format!("{name} x{count}"))
            .collect();
        let _ = writeln!(out, "Languages: {}", used.join(", "));
    }
    for note in &analytics.recent_grammar_notes {
        let _ = writeln!(out, "* {note}");
    }
    out.trim_end().to_owned()
}
