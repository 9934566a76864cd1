//! Word-overlap similarity between a claimant's answers and an item's secret
//!
//! The score is advisory: admins see it next to the claim, it never decides
//! the claim on its own.

use crate::core::types::ConfidenceBand;
use std::collections::BTreeSet;

/// Words of this length or shorter carry no signal and are dropped
const MIN_WORD_LEN: usize = 2;

/// Credit for a word that also appears verbatim in the reference
const EXACT_MATCH_WEIGHT: f64 = 1.0;

/// Credit for each reference word that contains, or is contained by, the word
const PARTIAL_MATCH_WEIGHT: f64 = 0.5;

/// Lowercase and split `text` into its set of informative words
pub fn tokenize(text: &str) -> BTreeSet<String> {
    text.trim()
        .to_lowercase()
        .split_whitespace()
        .filter(|word| word.chars().count() > MIN_WORD_LEN)
        .map(str::to_string)
        .collect()
}

/// Match percentage (0-100) of `candidate` against `reference`
///
/// Exact and substring credit are counted independently, so a word that
/// matches exactly also earns partial credit against itself.
pub fn score(candidate: &str, reference: &str) -> u8 {
    if candidate.trim().is_empty() || reference.trim().is_empty() {
        return 0;
    }

    let candidate_words = tokenize(candidate);
    let reference_words = tokenize(reference);
    if candidate_words.is_empty() || reference_words.is_empty() {
        return 0;
    }

    let mut total = 0.0;
    for w1 in &candidate_words {
        if reference_words.contains(w1) {
            total += EXACT_MATCH_WEIGHT;
        }
        for w2 in &reference_words {
            if w1.contains(w2.as_str()) || w2.contains(w1.as_str()) {
                total += PARTIAL_MATCH_WEIGHT;
            }
        }
    }

    let denominator = candidate_words.len().max(reference_words.len()) as f64;
    let raw = total / denominator * 100.0;
    raw.min(100.0).round() as u8
}

/// Score a set of answers against an item's secret and description
pub fn score_answers<'a>(
    answers: impl IntoIterator<Item = &'a str>,
    secret_message: &str,
    description: &str,
) -> u8 {
    let combined = answers.into_iter().collect::<Vec<_>>().join(" ");
    let reference = format!("{} {}", secret_message, description);
    score(&combined, &reference)
}

/// Local confidence band for a match percentage
pub fn confidence_band(percentage: u8) -> ConfidenceBand {
    ConfidenceBand::from_percentage(percentage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_inputs_score_zero() {
        assert_eq!(score("", "x"), 0);
        assert_eq!(score("x", ""), 0);
        assert_eq!(score("   ", "hello world"), 0);
    }

    #[test]
    fn test_identical_text_scores_full() {
        assert_eq!(score("hello world", "hello world"), 100);
    }

    #[test]
    fn test_short_words_only_score_zero() {
        // Every token is two characters or fewer
        assert_eq!(score("it is on", "it is on"), 0);
    }

    #[test]
    fn test_tokenize_collapses_duplicates_and_case() {
        let words = tokenize("  Red red RED case ok ");
        assert_eq!(words.len(), 2);
        assert!(words.contains("red"));
        assert!(words.contains("case"));
    }

    #[test]
    fn test_unrelated_text_scores_zero() {
        assert_eq!(score("purple umbrella", "black laptop"), 0);
    }

    #[test]
    fn test_substring_match_gives_partial_credit() {
        // "sticker" contains "stick": 0.5 / 1 word
        assert_eq!(score("stick", "sticker"), 50);
    }

    #[test]
    fn test_exact_match_double_counts_itself() {
        // "scratch" exact (+1) and self-substring (+0.5) over max(1, 2) words
        assert_eq!(score("scratch", "scratch lid"), 75);
    }

    #[test]
    fn test_score_answers_joins_reference() {
        let answers = [
            "It's a black Dell laptop",
            "has a scratch and red sticker on lid",
            "lost near the library entrance yesterday",
        ];
        let pct = score_answers(
            answers.iter().copied(),
            "has a deep scratch on the lid and a red sticker",
            "Black Dell laptop with a sticker",
        );
        assert!(pct >= 40, "got {}", pct);
        assert_eq!(confidence_band(pct), ConfidenceBand::High);
    }
}
