//! Claim verification flow
//!
//! Item validation -> three questions -> scoring -> submission, driven by a
//! single explicit state.

pub mod conversation;
pub mod state;

pub use conversation::{ClaimConversation, ConversationSettings};
pub use state::{ClaimResult, ClaimState};
