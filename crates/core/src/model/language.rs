use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LanguageCodeError {
    #[error("language code cannot be empty")]
    Empty,

    #[error("invalid language code: {0}")]
    Invalid(String),
}

/// Languages offered when picking a target, as `(code, display name)`.
const KNOWN_LANGUAGES: &[(&str, &str)] = &[
    ("es", "Spanish"),
    ("fr", "French"),
    ("hi", "Hindi"),
    ("ar", "Arabic"),
    ("en", "English"),
    ("de", "German"),
    ("ur", "Urdu"),
    ("ja", "Japanese"),
    ("zh-CN", "Chinese (Simplified)"),
    ("pt", "Portuguese"),
    ("ru", "Russian"),
];

/// BCP-47-ish language code such as `es` or `zh-CN`.
///
/// The primary subtag is stored lowercase; an optional region subtag keeps the
/// case the translator expects (`zh-CN`).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageCode(String);

impl LanguageCode {
    /// Parses and normalizes a language code.
    ///
    /// # Errors
    ///
    /// Returns `LanguageCodeError` if the code is empty or not of the form
    /// `xx`, `xxx`, `xx-YY`.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, LanguageCodeError> {
        let raw = raw.as_ref().trim();
        if raw.is_empty() {
            return Err(LanguageCodeError::Empty);
        }

        let mut parts = raw.splitn(2, ['-', '_']);
        let primary = parts.next().unwrap_or_default();
        let region = parts.next();

        let primary_ok =
            (2..=3).contains(&primary.len()) && primary.chars().all(|c| c.is_ascii_alphabetic());
        let region_ok = region.is_none_or(|r| {
            (2..=4).contains(&r.len()) && r.chars().all(|c| c.is_ascii_alphanumeric())
        });
        if !primary_ok || !region_ok {
            return Err(LanguageCodeError::Invalid(raw.to_owned()));
        }

        let mut code = primary.to_ascii_lowercase();
        if let Some(region) = region {
            code.push('-');
            code.push_str(&region.to_ascii_uppercase());
        }
        Ok(Self(code))
    }

    /// Looks up a code by its display name (`"spanish"`, `"Chinese (Simplified)"`).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let needle = name.trim();
        KNOWN_LANGUAGES
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(needle))
            .map(|(code, _)| Self((*code).to_owned()))
    }

    /// Accepts either a code or a display name.
    #[must_use]
    pub fn resolve(input: &str) -> Option<Self> {
        Self::from_name(input).or_else(|| Self::new(input).ok())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display name for known languages, the raw code otherwise.
    #[must_use]
    pub fn display_name(&self) -> &str {
        KNOWN_LANGUAGES
            .iter()
            .find(|(code, _)| code.eq_ignore_ascii_case(&self.0))
            .map_or(self.0.as_str(), |(_, name)| *name)
    }

    /// Codes selectable as a learning target.
    pub fn known() -> impl Iterator<Item = LanguageCode> {
        KNOWN_LANGUAGES
            .iter()
            .map(|(code, _)| LanguageCode((*code).to_owned()))
    }

    /// Language the flow defaults to when no profile is chosen.
    #[must_use]
    pub fn default_target() -> Self {
        Self("es".to_owned())
    }

    /// Language practice text is translated back into.
    #[must_use]
    pub fn reference() -> Self {
        Self("en".to_owned())
    }

    /// Primary subtag, `zh` for `zh-CN`.
    #[must_use]
    pub fn primary(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }

    /// Same language ignoring region (`pt` and `pt-BR`).
    #[must_use]
    pub fn same_language(&self, other: &LanguageCode) -> bool {
        self.primary() == other.primary()
    }
}

impl fmt::Debug for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LanguageCode({})", self.0)
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LanguageCode {
    type Err = LanguageCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for LanguageCode {
    type Error = LanguageCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LanguageCode> for String {
    fn from(value: LanguageCode) -> Self {
        value.0
    }
}
