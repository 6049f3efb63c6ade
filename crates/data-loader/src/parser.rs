//! Normalizers for the raw text inputs.
//!
//! - tens / ones survivor lists: one pattern per token, tokens separated by
//!   newlines, commas, or whitespace
//! - final sets (tracked combinations): one 5-number set per token, numbers
//!   joined by any non-digit separator such as `01-16-21-47-60`
//! - seed / previous seed: the whole text is one 5-number set; numbers
//!   outside 1-69 in it are skipped
//!
//! Normalizers never fail. Bad tokens are returned next to the good ones,
//! in their original order, so the caller can report them.

use crate::error::{InputError, Result};
use crate::types::{Combination, DigitPattern, MAX_NUMBER, MIN_NUMBER, Vocabulary};
use regex::Regex;
use std::collections::HashSet;
use std::hash::Hash;
use std::sync::LazyLock;
use tracing::debug;

static DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

/// Outcome of normalizing one text input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized<T> {
    /// Unique accepted values, in order of first appearance
    pub accepted: Vec<T>,
    /// Rejected tokens, in original order
    pub rejected: Vec<InputError>,
}

impl<T> Normalized<T> {
    /// Raw text of every rejected token.
    pub fn rejected_tokens(&self) -> Vec<&str> {
        self.rejected.iter().map(InputError::token).collect()
    }
}

/// Split raw text into tokens on newlines, commas, and whitespace.
fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .flat_map(|line| line.split(|c: char| c == ',' || c.is_whitespace()))
        .map(str::trim)
        .filter(|tok| !tok.is_empty())
}

/// Parse every token, keeping the first occurrence of each accepted value.
fn normalize_with<T, F>(text: &str, parse: F) -> Normalized<T>
where
    T: Copy + Eq + Hash,
    F: Fn(&str) -> Result<T>,
{
    let mut seen = HashSet::new();
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();

    for token in tokens(text) {
        match parse(token) {
            Ok(value) => {
                if seen.insert(value) {
                    accepted.push(value);
                }
            }
            Err(e) => rejected.push(e),
        }
    }

    Normalized { accepted, rejected }
}

/// Normalize a list of digit patterns for the given vocabulary.
pub fn normalize_patterns(text: &str, vocabulary: Vocabulary) -> Normalized<DigitPattern> {
    let out = normalize_with(text, |tok| DigitPattern::parse(tok, vocabulary));
    debug!(
        "Normalized {} patterns: {} accepted, {} rejected",
        vocabulary.label(),
        out.accepted.len(),
        out.rejected.len()
    );
    out
}

/// Normalize tens survivors (digits 0-6).
pub fn normalize_tens(text: &str) -> Normalized<DigitPattern> {
    normalize_patterns(text, Vocabulary::Tens)
}

/// Normalize ones survivors (digits 0-9).
pub fn normalize_ones(text: &str) -> Normalized<DigitPattern> {
    normalize_patterns(text, Vocabulary::Ones)
}

/// Normalize free-form final sets such as tracked combinations.
///
/// Each token must yield exactly five distinct numbers in 1..=69.
pub fn normalize_finals(text: &str) -> Normalized<Combination> {
    let out = normalize_with(text, |tok| tok.parse::<Combination>());
    debug!(
        "Normalized final sets: {} accepted, {} rejected",
        out.accepted.len(),
        out.rejected.len()
    );
    out
}

/// Parse a seed-style input where the whole text is a single set.
///
/// Digit runs outside 1-69, such as a draw year, are ignored and exactly
/// five numbers must remain. Blank text means "no seed" and yields `Ok(None)`.
pub fn parse_number_set(text: &str) -> Result<Option<Combination>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    let in_range = u32::from(MIN_NUMBER)..=u32::from(MAX_NUMBER);
    let values: Vec<u32> = extract_numbers(text)
        .into_iter()
        .filter(|n| in_range.contains(n))
        .collect();
    Combination::from_values(&values, text).map(Some)
}

/// Extract every run of ASCII digits as an integer.
///
/// Runs too large for `u32` saturate so they are later rejected as out of range.
pub fn extract_numbers(text: &str) -> Vec<u32> {
    DIGIT_RUN
        .find_iter(text)
        .map(|m| m.as_str().parse().unwrap_or(u32::MAX))
        .collect()
}
