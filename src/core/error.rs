use crate::core::types::Ineligibility;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClaimError {
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("No item was selected for this claim")]
    MissingItemId,

    #[error("{0}")]
    Ineligible(#[from] Ineligibility),

    #[error("Invalid answer: {0}")]
    InvalidAnswer(String),

    #[error("Proof image is too large ({size} bytes, limit {limit})")]
    ProofTooLarge { size: usize, limit: usize },

    #[error("Conversation is not accepting answers")]
    NotAcceptingAnswers,

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Session expired, please log in again")]
    Unauthorized,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

impl ClaimError {
    /// Validation errors are shown as transient notices and leave the
    /// conversation untouched.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ClaimError::InvalidAnswer(_)
                | ClaimError::MissingItemId
                | ClaimError::ProofTooLarge { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ClaimError>;
