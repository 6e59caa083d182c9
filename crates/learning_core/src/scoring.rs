//! crates/learning_core/src/scoring.rs
//!
//! Compares what a learner said against the expected phrase. Tokens are matched
//! through small English/Telugu synonym groups so "two", "rendu" and "2" count as
//! the same word.

use std::collections::HashSet;

use serde::Serialize;

const NUMBER_SYNONYMS: &[&[&str]] = &[
    &["1", "one", "okati", "ఒకటి"],
    &["2", "two", "rendu", "రెండు"],
    &["3", "three", "mūḍu", "మూడు"],
    &["4", "four", "nālugu", "నాలుగు"],
    &["5", "five", "aidu", "ఐదు"],
    &["6", "six", "āru", "ఆరు"],
    &["7", "seven", "ēḍu", "ఏడు"],
    &["8", "eight", "enimidi", "ఎనిమిది"],
    &["9", "nine", "tommidi", "తొమ్మిది"],
    &["10", "ten", "padi", "పది"],
];

const COLOR_SYNONYMS: &[&[&str]] = &[
    &["red", "ఎరుపు", "erupu"],
    &["blue", "నీలం", "neelam"],
    &["green", "ఆకుపచ్చ", "aakupacha", "akupacha"],
];

/// Overlap between the expected phrase and the transcript, as rounded percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TranscriptScore {
    pub score: u32,
    pub precision: u32,
    pub recall: u32,
}

/// Scores `transcript` against `expected` with a synonym-expanded token F1.
pub fn evaluate(expected: &str, transcript: &str) -> TranscriptScore {
    let expected = normalize(expected);
    let said = normalize(transcript);
    let expected = expand(&expected);
    let said = expand(&said);

    let overlap = expected.intersection(&said).count() as f64;
    let precision = overlap / said.len().max(1) as f64;
    let recall = overlap / expected.len().max(1) as f64;
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    TranscriptScore {
        score: percent(f1),
        precision: percent(precision),
        recall: percent(recall),
    }
}

/// Lowercases and drops everything except letters, digits and whitespace.
fn normalize(phrase: &str) -> String {
    phrase
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .trim()
        .to_string()
}

fn expand(phrase: &str) -> HashSet<&str> {
    phrase
        .split_whitespace()
        .flat_map(|token| match synonyms_of(token) {
            Some(group) => group.to_vec(),
            None => vec![token],
        })
        .collect()
}

/// Table entries are compared in normalized form, since normalizing drops the
/// Telugu virama.
fn synonyms_of(token: &str) -> Option<&'static [&'static str]> {
    NUMBER_SYNONYMS
        .iter()
        .chain(COLOR_SYNONYMS)
        .find(|group| group.iter().any(|synonym| normalize(synonym) == token))
        .copied()
}

fn percent(ratio: f64) -> u32 {
    (ratio * 100.0).round() as u32
}
