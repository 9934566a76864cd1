//! Answer scoring against an item's private proof phrase

pub mod similarity;

pub use similarity::{confidence_band, score, score_answers, tokenize};
