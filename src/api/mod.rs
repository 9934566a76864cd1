//! Portal backend access
//!
//! `PortalClient` talks HTTP; the claim conversation only depends on the
//! `ClaimsBackend` trait so it can run against any implementation.

pub mod client;
pub mod error_payload;
pub mod mock;
pub mod models;

use crate::core::error::Result;
use crate::core::types::Item;
use async_trait::async_trait;

pub use client::PortalClient;
pub use error_payload::ErrorPayload;
pub use mock::MockBackend;
pub use models::{AiAnalysis, ClaimOutcome, ClaimSubmission, ProofImage};

/// Backend operations used by a claim conversation
#[async_trait]
pub trait ClaimsBackend: Send + Sync {
    /// All items currently listed publicly
    async fn public_items(&self) -> Result<Vec<Item>>;

    /// Submit a finished claim
    async fn submit_claim(&self, submission: &ClaimSubmission) -> Result<ClaimOutcome>;
}
