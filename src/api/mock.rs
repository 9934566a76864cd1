//! In-memory claims backend
//!
//! Serves a fixed item list and records submissions. Used by the `--demo`
//! mode of the CLI and by tests.

use crate::api::{ClaimOutcome, ClaimSubmission, ClaimsBackend};
use crate::core::error::{ClaimError, Result};
use crate::core::types::Item;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

/// Mock backend with configurable failures
pub struct MockBackend {
    items: Vec<Item>,
    items_available: AtomicBool,
    /// Number of upcoming submissions that fail before one succeeds
    failing_submissions: AtomicU32,
    outcome: ClaimOutcome,
    item_calls: AtomicU32,
    submissions: Mutex<Vec<ClaimSubmission>>,
}

impl MockBackend {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items,
            items_available: AtomicBool::new(true),
            failing_submissions: AtomicU32::new(0),
            outcome: ClaimOutcome {
                claim_id: Some("mock-claim".into()),
                message: Some("Claim submitted successfully".into()),
                ai_analysis: None,
            },
            item_calls: AtomicU32::new(0),
            submissions: Mutex::new(Vec::new()),
        }
    }

    /// Set the response returned by successful submissions
    pub fn with_outcome(mut self, outcome: ClaimOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    /// Make the item listing fail
    pub fn with_items_available(self, available: bool) -> Self {
        self.items_available.store(available, Ordering::SeqCst);
        self
    }

    /// Fail the next `count` submissions
    pub fn with_failing_submissions(self, count: u32) -> Self {
        self.failing_submissions.store(count, Ordering::SeqCst);
        self
    }

    /// Number of times the item list was requested
    pub fn item_calls(&self) -> u32 {
        self.item_calls.load(Ordering::SeqCst)
    }

    /// Every submission received so far, failed ones included
    pub fn submissions(&self) -> Vec<ClaimSubmission> {
        self.submissions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl ClaimsBackend for MockBackend {
    async fn public_items(&self) -> Result<Vec<Item>> {
        self.item_calls.fetch_add(1, Ordering::SeqCst);
        if !self.items_available.load(Ordering::SeqCst) {
            return Err(ClaimError::Api {
                status: 503,
                message: "Item service unavailable".into(),
            });
        }
        Ok(self.items.clone())
    }

    async fn submit_claim(&self, submission: &ClaimSubmission) -> Result<ClaimOutcome> {
        self.submissions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(submission.clone());

        let remaining = self.failing_submissions.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_submissions.store(remaining - 1, Ordering::SeqCst);
            return Err(ClaimError::Api {
                status: 400,
                message: "You already have a pending claim for this item".into(),
            });
        }
        Ok(self.outcome.clone())
    }
}
