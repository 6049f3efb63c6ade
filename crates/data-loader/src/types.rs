//! Core domain types for final-pairing.
//!
//! - `DigitPattern`: a canonical (sorted) 5-digit multiset of tens or ones digits
//! - `Combination`: a sorted 5-tuple of distinct numbers in 1..=69
//! - `Vocabulary`: which digits a pattern may use

use crate::error::{InputError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Constants
// =============================================================================

/// Numbers drawn per combination.
pub const PICK: usize = 5;

/// Smallest valid number.
pub const MIN_NUMBER: u8 = 1;

/// Largest valid number.
pub const MAX_NUMBER: u8 = 69;

/// Upper bound of the "low" half; 35..=69 counts as high.
pub const LOW_MAX: u8 = 34;

// =============================================================================
// Digit patterns
// =============================================================================

/// The digit alphabet a pattern is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Vocabulary {
    /// Tens digits: 0-6
    Tens,
    /// Ones digits: 0-9
    Ones,
}

impl Vocabulary {
    /// Largest digit allowed in this vocabulary.
    pub fn max_digit(self) -> u8 {
        match self {
            Vocabulary::Tens => 6,
            Vocabulary::Ones => 9,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Vocabulary::Tens => "tens",
            Vocabulary::Ones => "ones",
        }
    }
}

/// A canonical 5-digit pattern (digits sorted ascending).
///
/// Two tokens with the same multiset of digits produce equal patterns,
/// so `"65611"` and `"11566"` collapse to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DigitPattern {
    digits: [u8; PICK],
}

impl DigitPattern {
    /// Parse a raw token against a vocabulary.
    ///
    /// Only the token's ASCII digit characters are considered, so
    /// separators like `1-1-5-6-6` are tolerated.
    pub fn parse(token: &str, vocabulary: Vocabulary) -> Result<Self> {
        let raw: Vec<u8> = token
            .chars()
            .filter(|c| c.is_ascii_digit())
            .map(|c| c as u8 - b'0')
            .collect();

        if raw.len() != PICK {
            return Err(InputError::DigitCount {
                token: token.to_string(),
                found: raw.len(),
            });
        }

        let max = vocabulary.max_digit();
        if let Some(&digit) = raw.iter().find(|&&d| d > max) {
            return Err(InputError::DigitOutOfRange {
                token: token.to_string(),
                digit,
                vocabulary: vocabulary.label(),
                max,
            });
        }

        let mut digits = [0u8; PICK];
        digits.copy_from_slice(&raw);
        digits.sort_unstable();
        Ok(Self { digits })
    }

    /// The canonical digits, ascending.
    pub fn digits(&self) -> [u8; PICK] {
        self.digits
    }
}

impl fmt::Display for DigitPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in self.digits {
            write!(f, "{}", d)?;
        }
        Ok(())
    }
}

// =============================================================================
// Combinations
// =============================================================================

/// A candidate draw: five distinct numbers in 1..=69, sorted ascending.
///
/// The sorted form is the identity used for set membership, so two
/// combinations are equal exactly when they hold the same numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Combination {
    numbers: [u8; PICK],
}

impl Combination {
    /// Build a combination from five numbers in any order.
    ///
    /// Returns `None` if a number is out of range or repeated.
    pub fn new(mut numbers: [u8; PICK]) -> Option<Self> {
        numbers.sort_unstable();
        let in_range = numbers
            .iter()
            .all(|&n| (MIN_NUMBER..=MAX_NUMBER).contains(&n));
        let distinct = numbers.windows(2).all(|w| w[0] != w[1]);
        (in_range && distinct).then_some(Self { numbers })
    }

    /// Build a combination from parsed integers, reporting why it failed.
    pub fn from_values(values: &[u32], token: &str) -> Result<Self> {
        if values.len() != PICK {
            return Err(InputError::NumberCount {
                token: token.to_string(),
                found: values.len(),
            });
        }

        let mut numbers = [0u8; PICK];
        for (slot, &value) in numbers.iter_mut().zip(values) {
            if !(u32::from(MIN_NUMBER)..=u32::from(MAX_NUMBER)).contains(&value) {
                return Err(InputError::NumberOutOfRange {
                    token: token.to_string(),
                    number: value,
                });
            }
            *slot = value as u8;
        }

        numbers.sort_unstable();
        if let Some(w) = numbers.windows(2).find(|w| w[0] == w[1]) {
            return Err(InputError::DuplicateNumber {
                token: token.to_string(),
                number: w[0],
            });
        }
        Ok(Self { numbers })
    }

    /// The numbers, ascending.
    pub fn numbers(&self) -> [u8; PICK] {
        self.numbers
    }

    pub fn sum(&self) -> u32 {
        self.numbers.iter().map(|&n| n as u32).sum()
    }

    pub fn lowest(&self) -> u8 {
        self.numbers[0]
    }

    pub fn highest(&self) -> u8 {
        self.numbers[PICK - 1]
    }
}

impl fmt::Display for Combination {
    /// Zero-padded and dash-joined: `01-16-21-47-60`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, n) in self.numbers.iter().enumerate() {
            if i > 0 {
                f.write_str("-")?;
            }
            write!(f, "{:02}", n)?;
        }
        Ok(())
    }
}

impl FromStr for Combination {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self> {
        let values = crate::parser::extract_numbers(s);
        Combination::from_values(&values, s)
    }
}

impl Serialize for Combination {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Combination {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_is_canonical() {
        let a = DigitPattern::parse("65611", Vocabulary::Tens).unwrap();
        let b = DigitPattern::parse("11566", Vocabulary::Tens).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "11566");
    }

    #[test]
    fn test_pattern_canonicalization_is_idempotent() {
        let once = DigitPattern::parse("97950", Vocabulary::Ones).unwrap();
        let twice = DigitPattern::parse(&once.to_string(), Vocabulary::Ones).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_pattern_rejects_out_of_vocabulary_digit() {
        let err = DigitPattern::parse("11567", Vocabulary::Tens).unwrap_err();
        assert!(matches!(err, InputError::DigitOutOfRange { digit: 7, .. }));
        assert!(DigitPattern::parse("11567", Vocabulary::Ones).is_ok());
    }

    #[test]
    fn test_pattern_rejects_wrong_length() {
        let err = DigitPattern::parse("1156", Vocabulary::Ones).unwrap_err();
        assert_eq!(
            err,
            InputError::DigitCount {
                token: "1156".to_string(),
                found: 4
            }
        );
    }

    #[test]
    fn test_combination_new_validates() {
        assert!(Combination::new([5, 4, 3, 2, 1]).is_some());
        assert!(Combination::new([0, 1, 2, 3, 4]).is_none());
        assert!(Combination::new([1, 2, 3, 4, 70]).is_none());
        assert!(Combination::new([1, 1, 2, 3, 4]).is_none());
    }

    #[test]
    fn test_combination_display_and_parse() {
        let combo: Combination = "60-1-47-21-16".parse().unwrap();
        assert_eq!(combo.to_string(), "01-16-21-47-60");
        assert_eq!(combo.sum(), 145);
        assert_eq!(combo.lowest(), 1);
        assert_eq!(combo.highest(), 60);
    }

    #[test]
    fn test_combination_serializes_as_label() {
        let combo = Combination::new([11, 15, 16, 57, 69]).unwrap();
        let json = serde_json::to_string(&combo).unwrap();
        assert_eq!(json, "\"11-15-16-57-69\"");
        let back: Combination = serde_json::from_str(&json).unwrap();
        assert_eq!(back, combo);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn token(digits: [u8; PICK]) -> String {
            digits.iter().map(|&d| char::from(b'0' + d)).collect()
        }

        fn check_canonical(digits: [u8; PICK], vocabulary: Vocabulary) -> std::result::Result<(), TestCaseError> {
            let once = DigitPattern::parse(&token(digits), vocabulary).unwrap();
            let twice = DigitPattern::parse(&once.to_string(), vocabulary).unwrap();
            prop_assert_eq!(once, twice);

            let mut sorted = digits;
            sorted.sort_unstable();
            prop_assert_eq!(once.digits(), sorted);

            let mut reversed = digits;
            reversed.reverse();
            prop_assert_eq!(DigitPattern::parse(&token(reversed), vocabulary).unwrap(), once);
            Ok(())
        }

        proptest! {
            #[test]
            fn tens_canonicalization_is_idempotent(digits in proptest::array::uniform5(0u8..=6)) {
                check_canonical(digits, Vocabulary::Tens)?;
            }

            #[test]
            fn ones_canonicalization_is_idempotent(digits in proptest::array::uniform5(0u8..=9)) {
                check_canonical(digits, Vocabulary::Ones)?;
            }

            #[test]
            fn combination_is_sorted_and_distinct(numbers in proptest::array::uniform5(1u8..=69)) {
                let mut sorted = numbers;
                sorted.sort_unstable();
                let distinct = sorted.windows(2).all(|w| w[0] != w[1]);
                match Combination::new(numbers) {
                    Some(combo) => {
                        prop_assert!(distinct);
                        prop_assert_eq!(combo.numbers(), sorted);
                        prop_assert_eq!(combo.lowest(), sorted[0]);
                        prop_assert_eq!(combo.highest(), sorted[PICK - 1]);
                    }
                    None => prop_assert!(!distinct),
                }
            }
        }
    }
}
