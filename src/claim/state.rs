//! Claim conversation states

use crate::api::ClaimOutcome;
use crate::core::types::ConfidenceBand;

/// Final result of a submitted claim
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimResult {
    /// Local similarity score that was sent with the claim
    pub match_percentage: u8,
    /// Server band when provided, otherwise derived from the score
    pub band: ConfidenceBand,
    pub outcome: ClaimOutcome,
}

/// Where a claim conversation is
///
/// ```text
/// Loading -> Error(reason)                 (terminal)
/// Loading -> Asking{0} -> Asking{1} -> Asking{2} -> Submitting
/// Submitting -> Submitted                  (terminal)
/// Submitting -> Submitting                 (failed; retry_submission)
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimState {
    Loading,
    Error(String),
    Asking { index: usize },
    Submitting,
    Submitted(ClaimResult),
}

impl ClaimState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Error(_) => "error",
            Self::Asking { .. } => "asking",
            Self::Submitting => "submitting",
            Self::Submitted(_) => "submitted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Error(_) | Self::Submitted(_))
    }

    pub fn error_reason(&self) -> Option<&str> {
        match self {
            Self::Error(reason) => Some(reason),
            _ => None,
        }
    }
}
