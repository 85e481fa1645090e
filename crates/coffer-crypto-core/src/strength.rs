//! Heuristic password strength score in `0..=100`.
//!
//! One point each for: length ≥ 8, ≥ 12, ≥ 16; an ASCII uppercase letter;
//! an ASCII lowercase letter; a digit; a symbol (anything else); not being
//! letters only; not being digits only. The point total is multiplied by ten
//! and capped at 100, so the best reachable score is 90.
//!
//! Length is measured in UTF-16 code units, so a character outside the
//! Basic Multilingual Plane (most emoji) counts twice.
//!
//! This is not an entropy estimate. The rules and scaling are fixed because
//! stored labels and thresholds depend on them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Display label derived from a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StrengthLabel {
    Weak,
    Moderate,
    Strong,
    VeryStrong,
}

impl StrengthLabel {
    /// `< 30` Weak, `< 60` Moderate, `< 80` Strong, otherwise Very Strong.
    #[must_use]
    pub const fn from_score(score: u8) -> Self {
        match score {
            0..=29 => Self::Weak,
            30..=59 => Self::Moderate,
            60..=79 => Self::Strong,
            _ => Self::VeryStrong,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Weak => "Weak",
            Self::Moderate => "Moderate",
            Self::Strong => "Strong",
            Self::VeryStrong => "Very Strong",
        }
    }
}

impl fmt::Display for StrengthLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score `password`. The empty string scores 0.
#[must_use]
#[allow(clippy::arithmetic_side_effects)]
pub fn score(password: &str) -> u8 {
    if password.is_empty() {
        return 0;
    }

    let length = password.encode_utf16().count();
    let rules = [
        length >= 8,
        length >= 12,
        length >= 16,
        password.chars().any(|c| c.is_ascii_uppercase()),
        password.chars().any(|c| c.is_ascii_lowercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| !c.is_ascii_alphanumeric()),
        !password.chars().all(|c| c.is_ascii_alphabetic()),
        !password.chars().all(|c| c.is_ascii_digit()),
    ];

    // At most 9 points, so the product fits comfortably in a u8.
    let points = rules.iter().filter(|&&hit| hit).count() as u8;
    (points * 10).min(100)
}

/// Score and label in one call.
#[must_use]
pub fn assess(password: &str) -> (u8, StrengthLabel) {
    let s = score(password);
    (s, StrengthLabel::from_score(s))
}
