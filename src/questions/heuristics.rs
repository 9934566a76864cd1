//! Deterministic verification questions built from an item's own fields
//!
//! Used whenever the remote generator is unavailable or misbehaves.

use crate::questions::{ItemContext, VerificationQuestions};

/// Descriptions at or below this many characters are too thin to quote
const MIN_DESCRIPTION_LEN: usize = 10;

/// Words quoted from the description in the feature probe
const DESCRIPTION_PREVIEW_WORDS: usize = 5;

/// Secrets shorter than this get the generic uniqueness probe
const MIN_SECRET_LEN: usize = 20;

/// Hint families checked against the secret message, highest priority first
const SECRET_HINT_FAMILIES: &[(&[&str], &str)] = &[
    (
        &["scratch", "mark", "damage"],
        "Does your item have any scratches, marks or damage? Describe exactly where they are and what they look like.",
    ),
    (
        &["sticker", "cover", "case"],
        "Does your item have any stickers, a cover or a case on it? Describe their color, design and position.",
    ),
    (
        &["name", "written", "label"],
        "Is there a name, some writing or a label on your item? What does it say and where is it?",
    ),
];

const GENERIC_FEATURE_QUESTION: &str =
    "Please describe your item in detail. What color, brand or model is it, and which features would help us recognise it?";

const GENERIC_SECRET_QUESTION: &str =
    "What makes this item uniquely yours? Mention anything that only the owner would know about it.";

const GENERIC_CONTEXT_QUESTION: &str =
    "When and where do you think you lost it? Describe what you were doing at the time.";

/// Build all three fallback questions for an item
pub fn fallback_questions(item: &ItemContext) -> VerificationQuestions {
    VerificationQuestions::new([
        feature_probe(&item.description),
        secret_hint_probe(&item.secret_message),
        context_probe(&item.location),
    ])
}

/// Q1: ask for distinguishing features, quoting the description when useful
///
/// The length threshold applies to the description as stored, padding
/// included; a description with no words at all still gets the generic
/// question.
pub fn feature_probe(description: &str) -> String {
    if description.chars().count() <= MIN_DESCRIPTION_LEN {
        return GENERIC_FEATURE_QUESTION.to_string();
    }

    let preview = description
        .split_whitespace()
        .take(DESCRIPTION_PREVIEW_WORDS)
        .collect::<Vec<_>>()
        .join(" ");
    if preview.is_empty() {
        return GENERIC_FEATURE_QUESTION.to_string();
    }
    format!(
        "The finder described this item as \"{}...\". What distinguishing features does yours have (color, brand, visible marks)?",
        preview
    )
}

/// Q2: probe whatever kind of detail the secret message hints at
pub fn secret_hint_probe(secret_message: &str) -> String {
    let secret = secret_message.to_lowercase();
    if secret.chars().count() < MIN_SECRET_LEN {
        return GENERIC_SECRET_QUESTION.to_string();
    }

    SECRET_HINT_FAMILIES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| secret.contains(k)))
        .map(|(_, question)| question.to_string())
        .unwrap_or_else(|| GENERIC_SECRET_QUESTION.to_string())
}

/// Q3: ask about the circumstances of the loss
pub fn context_probe(location: &str) -> String {
    let location = location.trim();
    if location.is_empty() {
        return GENERIC_CONTEXT_QUESTION.to_string();
    }
    format!(
        "When and where did you lose it? This item was found at {}, so tell us when you were last there and what you were doing.",
        location
    )
}
