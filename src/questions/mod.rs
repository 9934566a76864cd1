//! Verification question generation
//!
//! Questions come from the portal's remote generator when it answers with
//! exactly three of them; otherwise they are built locally from the item.

pub mod heuristics;

use crate::core::config::QUESTION_COUNT;
use crate::core::error::Result;
use crate::core::types::Item;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub use heuristics::fallback_questions;

/// The item fields a question generator is allowed to see
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemContext {
    pub item_keyword: String,
    pub description: String,
    pub location: String,
    pub secret_message: String,
}

impl From<&Item> for ItemContext {
    fn from(item: &Item) -> Self {
        Self {
            item_keyword: item.item_keyword.clone(),
            description: item.description.clone(),
            location: item.location.clone(),
            secret_message: item.secret_message.clone(),
        }
    }
}

/// Exactly three questions, fixed once generated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationQuestions([String; QUESTION_COUNT]);

impl VerificationQuestions {
    pub fn new(questions: [String; QUESTION_COUNT]) -> Self {
        Self(questions)
    }

    /// Accept a remote list only if it has the right length and no blanks
    pub fn from_remote(questions: Vec<String>) -> Option<Self> {
        if questions.iter().any(|q| q.trim().is_empty()) {
            return None;
        }
        let questions: [String; QUESTION_COUNT] = questions.try_into().ok()?;
        Some(Self(questions))
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        QUESTION_COUNT
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Where generated questions come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionOrigin {
    Remote,
    Fallback,
}

/// A remote question generator
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Ask the remote side for questions; any error triggers the fallback
    async fn fetch_questions(&self, item: &ItemContext) -> Result<Vec<String>>;
}

/// Produces the three questions for a claim attempt; never fails
#[derive(Clone)]
pub struct QuestionGenerator {
    source: Option<Arc<dyn QuestionSource>>,
    timeout: Duration,
}

impl QuestionGenerator {
    pub fn new(source: Arc<dyn QuestionSource>, timeout: Duration) -> Self {
        Self {
            source: Some(source),
            timeout,
        }
    }

    /// A generator that only uses local heuristics
    pub fn offline() -> Self {
        Self {
            source: None,
            timeout: Duration::ZERO,
        }
    }

    pub async fn generate(&self, item: &ItemContext) -> VerificationQuestions {
        self.generate_with_origin(item).await.0
    }

    /// Generate questions and report whether the fallback was used
    pub async fn generate_with_origin(
        &self,
        item: &ItemContext,
    ) -> (VerificationQuestions, QuestionOrigin) {
        let Some(source) = &self.source else {
            return (fallback_questions(item), QuestionOrigin::Fallback);
        };

        match tokio::time::timeout(self.timeout, source.fetch_questions(item)).await {
            Ok(Ok(questions)) => {
                let count = questions.len();
                if let Some(questions) = VerificationQuestions::from_remote(questions) {
                    tracing::debug!("Using remote verification questions");
                    return (questions, QuestionOrigin::Remote);
                }
                tracing::warn!(
                    "Remote generator returned {} usable questions, using fallback",
                    count
                );
            }
            Ok(Err(e)) => {
                tracing::warn!("Remote question generation failed, using fallback: {}", e);
            }
            Err(_) => {
                tracing::warn!(
                    "Remote question generation timed out after {:?}, using fallback",
                    self.timeout
                );
            }
        }

        (fallback_questions(item), QuestionOrigin::Fallback)
    }
}
