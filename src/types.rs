//! Core value types shared by the store, the engine and the front end

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{timing, window};

/// One vocabulary entry: a source word and two translations
///
/// Identity is the three text fields. The `seen` flag is not part of it:
/// a hand-edited file may flip it without turning the entry into another one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    #[serde(alias = "serbian")]
    pub source: String,
    #[serde(rename = "translationA", alias = "russian", default)]
    pub translation_a: String,
    #[serde(rename = "translationB", alias = "english", default)]
    pub translation_b: String,
    #[serde(alias = "shown", default)]
    pub seen: bool,
}

impl VocabularyEntry {
    pub fn new(
        source: impl Into<String>,
        translation_a: impl Into<String>,
        translation_b: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            translation_a: translation_a.into(),
            translation_b: translation_b.into(),
            seen: false,
        }
    }

    /// Copy of this entry with a different seen flag
    pub fn with_seen(&self, seen: bool) -> Self {
        Self {
            seen,
            ..self.clone()
        }
    }

    /// Same word, ignoring case and the seen flag
    pub fn same_word(&self, other: &VocabularyEntry) -> bool {
        eq_ignore_case(&self.source, &other.source)
            && eq_ignore_case(&self.translation_a, &other.translation_a)
            && eq_ignore_case(&self.translation_b, &other.translation_b)
    }
}

impl fmt::Display for VocabularyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)?;
        match (self.translation_a.is_empty(), self.translation_b.is_empty()) {
            (true, true) => Ok(()),
            (false, true) => write!(f, " | {}", self.translation_a),
            (true, false) => write!(f, " | {}", self.translation_b),
            (false, false) => write!(f, " | {} | {}", self.translation_a, self.translation_b),
        }
    }
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// Top-left corner of the widget window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(window::DEFAULT_X, window::DEFAULT_Y)
    }
}

/// How often the timer rotates to a new entry
///
/// Persisted as an integer: 1..=6 are hours, 7 (or anything else) is never.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum RotationInterval {
    Hours1,
    Hours2,
    Hours3,
    Hours4,
    Hours5,
    Hours6,
    Never,
}

impl RotationInterval {
    /// Time between rotations, `None` when rotation is off
    pub fn duration(self) -> Option<TimeDelta> {
        match u8::from(self) {
            hours @ 1..=6 => Some(TimeDelta::hours(i64::from(hours))),
            _ => None,
        }
    }
}

impl Default for RotationInterval {
    fn default() -> Self {
        Self::from(timing::DEFAULT_OPTION)
    }
}

impl From<u8> for RotationInterval {
    fn from(option: u8) -> Self {
        match option {
            1 => Self::Hours1,
            2 => Self::Hours2,
            3 => Self::Hours3,
            4 => Self::Hours4,
            5 => Self::Hours5,
            6 => Self::Hours6,
            _ => Self::Never,
        }
    }
}

impl From<RotationInterval> for u8 {
    fn from(interval: RotationInterval) -> Self {
        match interval {
            RotationInterval::Hours1 => 1,
            RotationInterval::Hours2 => 2,
            RotationInterval::Hours3 => 3,
            RotationInterval::Hours4 => 4,
            RotationInterval::Hours5 => 5,
            RotationInterval::Hours6 => 6,
            RotationInterval::Never => timing::NEVER_OPTION,
        }
    }
}

impl fmt::Display for RotationInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RotationInterval::Never => write!(f, "never"),
            other => write!(f, "{}h", u8::from(*other)),
        }
    }
}

impl FromStr for RotationInterval {
    type Err = String;

    /// Accepts `1h`..`6h`, bare `1`..`7` and `never`/`off`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if s == "never" || s == "off" {
            return Ok(Self::Never);
        }
        let digits = s.strip_suffix('h').unwrap_or(&s);
        match digits.parse::<u8>() {
            Ok(option @ 1..=6) => Ok(Self::from(option)),
            Ok(timing::NEVER_OPTION) if !s.ends_with('h') => Ok(Self::Never),
            _ => Err(format!("invalid interval '{s}', expected 1h..6h or never")),
        }
    }
}
