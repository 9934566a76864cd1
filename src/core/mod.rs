pub mod config;
pub mod error;
pub mod types;

pub use config::PortalConfig;
pub use error::{ClaimError, Result};
pub use types::{
    Answer, ConfidenceBand, ConversationMessage, Item, ItemStatus, ItemType, MessageFlags,
    MessageRole,
};
