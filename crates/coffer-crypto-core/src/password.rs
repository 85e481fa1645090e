//! Random password generation from a character-class policy.
//!
//! Every character is drawn uniformly from the union of the enabled classes
//! using `OsRng`. A draw that misses an enabled class is discarded and
//! redrawn, up to [`MAX_GENERATION_ATTEMPTS`] times, so the output stays
//! uniform over all passwords that satisfy the policy.

use rand::rngs::OsRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

/// Upper bound on `PasswordPolicy::length`.
pub const MAX_POLICY_LENGTH: usize = 128;

/// Lower end of the length range offered to users.
pub const SUGGESTED_MIN_LENGTH: usize = 8;

/// Upper end of the length range offered to users.
pub const SUGGESTED_MAX_LENGTH: usize = 32;

/// Default generated length.
pub const DEFAULT_LENGTH: usize = 16;

/// Redraw budget before giving up on class coverage.
pub const MAX_GENERATION_ATTEMPTS: usize = 1024;

const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";
const SYMBOLS: &[u8] = b"!@#$%^&*()_-+=<>?/";

/// One of the four selectable character classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharClass {
    Uppercase,
    Lowercase,
    Digit,
    Symbol,
}

impl CharClass {
    /// The characters belonging to this class.
    #[must_use]
    pub const fn alphabet(self) -> &'static [u8] {
        match self {
            Self::Uppercase => UPPERCASE,
            Self::Lowercase => LOWERCASE,
            Self::Digit => DIGITS,
            Self::Symbol => SYMBOLS,
        }
    }

    #[must_use]
    pub fn contains(self, c: char) -> bool {
        u8::try_from(c).is_ok_and(|b| self.alphabet().contains(&b))
    }
}

/// Which classes to draw from, and how many characters.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordPolicy {
    /// Number of characters to generate.
    pub length: usize,
    pub include_uppercase: bool,
    pub include_lowercase: bool,
    pub include_numbers: bool,
    pub include_symbols: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            length: DEFAULT_LENGTH,
            include_uppercase: true,
            include_lowercase: true,
            include_numbers: true,
            include_symbols: true,
        }
    }
}

impl PasswordPolicy {
    /// Enabled classes in a fixed order. Empty when nothing is selected.
    #[must_use]
    pub fn enabled_classes(&self) -> Vec<CharClass> {
        [
            (self.include_uppercase, CharClass::Uppercase),
            (self.include_lowercase, CharClass::Lowercase),
            (self.include_numbers, CharClass::Digit),
            (self.include_symbols, CharClass::Symbol),
        ]
        .into_iter()
        .filter_map(|(on, class)| on.then_some(class))
        .collect()
    }

    /// The characters the generator draws from.
    ///
    /// Falls back to lowercase + digits when no class is enabled.
    #[must_use]
    pub fn alphabet(&self) -> Vec<u8> {
        let classes = self.enabled_classes();
        if classes.is_empty() {
            return [LOWERCASE, DIGITS].concat();
        }
        classes.iter().flat_map(|c| c.alphabet().iter().copied()).collect()
    }

    /// Smallest length this policy can satisfy.
    #[must_use]
    pub fn min_length(&self) -> usize {
        self.enabled_classes().len().max(1)
    }
}

/// Generate a password satisfying `policy`.
///
/// The result contains at least one character of every enabled class and
/// nothing outside [`PasswordPolicy::alphabet`].
///
/// # Errors
///
/// - [`PolicyError::LengthTooShort`] if `length` is zero or smaller than the
///   number of enabled classes
/// - [`PolicyError::LengthTooLong`] if `length` exceeds [`MAX_POLICY_LENGTH`]
/// - [`PolicyError::RetriesExhausted`] if no draw covered every class
///   within [`MAX_GENERATION_ATTEMPTS`]
pub fn generate(policy: &PasswordPolicy) -> Result<String, PolicyError> {
    let required = policy.min_length();
    if policy.length < required {
        return Err(PolicyError::LengthTooShort {
            length: policy.length,
            required,
        });
    }
    if policy.length > MAX_POLICY_LENGTH {
        return Err(PolicyError::LengthTooLong {
            length: policy.length,
            max: MAX_POLICY_LENGTH,
        });
    }

    let alphabet = policy.alphabet();
    let classes = policy.enabled_classes();
    let mut rng = OsRng;

    for _ in 0..MAX_GENERATION_ATTEMPTS {
        let candidate: String = (0..policy.length)
            .map(|_| char::from(alphabet[rng.gen_range(0..alphabet.len())]))
            .collect();

        if covers_classes(&candidate, &classes) {
            return Ok(candidate);
        }
    }

    Err(PolicyError::RetriesExhausted(MAX_GENERATION_ATTEMPTS))
}

fn covers_classes(candidate: &str, classes: &[CharClass]) -> bool {
    classes
        .iter()
        .all(|class| candidate.chars().any(|c| class.contains(c)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn policy(length: usize, upper: bool, lower: bool, digits: bool, symbols: bool) -> PasswordPolicy {
        PasswordPolicy {
            length,
            include_uppercase: upper,
            include_lowercase: lower,
            include_numbers: digits,
            include_symbols: symbols,
        }
    }

    #[test]
    fn default_policy_generates_default_length() {
        let pw = generate(&PasswordPolicy::default()).unwrap();
        assert_eq!(pw.len(), DEFAULT_LENGTH);
    }

    #[test]
    fn every_enabled_class_present() {
        let p = policy(12, true, true, true, true);
        for _ in 0..200 {
            let pw = generate(&p).unwrap();
            assert!(pw.chars().any(|c| c.is_ascii_uppercase()), "no uppercase: {pw}");
            assert!(pw.chars().any(|c| c.is_ascii_lowercase()), "no lowercase: {pw}");
            assert!(pw.chars().any(|c| c.is_ascii_digit()), "no digit: {pw}");
            assert!(pw.chars().any(|c| CharClass::Symbol.contains(c)), "no symbol: {pw}");
        }
    }

    #[test]
    fn length_equal_to_class_count_is_satisfiable() {
        let p = policy(4, true, true, true, true);
        for _ in 0..50 {
            let pw = generate(&p).unwrap();
            assert_eq!(pw.len(), 4);
            let seen: HashSet<_> = pw
                .chars()
                .filter_map(|c| {
                    [CharClass::Uppercase, CharClass::Lowercase, CharClass::Digit, CharClass::Symbol]
                        .into_iter()
                        .find(|class| class.contains(c))
                })
                .collect();
            assert_eq!(seen.len(), 4, "missing class in {pw}");
        }
    }

    #[test]
    fn single_class_stays_in_alphabet() {
        let pw = generate(&policy(20, false, false, true, false)).unwrap();
        assert!(pw.chars().all(|c| c.is_ascii_digit()), "not all digits: {pw}");

        let pw = generate(&policy(20, false, false, false, true)).unwrap();
        assert!(pw.chars().all(|c| CharClass::Symbol.contains(c)), "not all symbols: {pw}");
    }

    #[test]
    fn no_class_falls_back_to_lowercase_and_digits() {
        let p = policy(24, false, false, false, false);
        let pw = generate(&p).unwrap();
        assert_eq!(pw.len(), 24);
        assert!(pw
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn length_below_class_count_is_rejected() {
        let err = generate(&policy(3, true, true, true, true)).unwrap_err();
        assert_eq!(
            err,
            PolicyError::LengthTooShort {
                length: 3,
                required: 4
            }
        );
    }

    #[test]
    fn zero_length_is_rejected_even_without_classes() {
        let err = generate(&policy(0, false, false, false, false)).unwrap_err();
        assert!(matches!(err, PolicyError::LengthTooShort { required: 1, .. }));
    }

    #[test]
    fn overlong_length_is_rejected() {
        let err = generate(&policy(MAX_POLICY_LENGTH + 1, true, true, true, true)).unwrap_err();
        assert!(matches!(err, PolicyError::LengthTooLong { .. }));
        assert!(generate(&policy(MAX_POLICY_LENGTH, true, true, true, true)).is_ok());
    }

    #[test]
    fn outputs_are_unique() {
        let p = PasswordPolicy::default();
        let set: HashSet<String> = (0..100).map(|_| generate(&p).unwrap()).collect();
        assert_eq!(set.len(), 100);
    }

    #[test]
    fn alphabet_is_union_of_enabled_classes() {
        assert_eq!(policy(8, true, false, true, false).alphabet().len(), 36);
        assert_eq!(PasswordPolicy::default().alphabet().len(), 26 + 26 + 10 + 18);
    }

    #[test]
    fn policy_serde_uses_camel_case() {
        let json = serde_json::to_string(&PasswordPolicy::default()).unwrap();
        assert!(json.contains("includeUppercase"));
        assert!(json.contains("includeNumbers"));
    }
}
