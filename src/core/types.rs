//! Shared data model for items, answers and the claim transcript

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether an item was reported lost or found
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ItemType {
    Lost,
    Found,
    Other(String),
}

impl From<String> for ItemType {
    fn from(raw: String) -> Self {
        match raw.to_lowercase().as_str() {
            "lost" => Self::Lost,
            "found" => Self::Found,
            _ => Self::Other(raw),
        }
    }
}

impl From<ItemType> for String {
    fn from(kind: ItemType) -> Self {
        match kind {
            ItemType::Lost => "lost".into(),
            ItemType::Found => "found".into(),
            ItemType::Other(raw) => raw,
        }
    }
}

/// Lifecycle status of a reported item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ItemStatus {
    Active,
    Reported,
    Claimed,
    Returned,
    /// Anything the backend sends that this crate does not know about
    Other(String),
}

impl ItemStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::Reported => "reported",
            Self::Claimed => "claimed",
            Self::Returned => "returned",
            Self::Other(raw) => raw,
        }
    }

    /// Claimed and returned items are closed to new claims
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Claimed | Self::Returned)
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::Active | Self::Reported)
    }
}

impl Default for ItemStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl From<String> for ItemStatus {
    fn from(raw: String) -> Self {
        match raw.to_lowercase().as_str() {
            "active" => Self::Active,
            "reported" => Self::Reported,
            "claimed" => Self::Claimed,
            "returned" => Self::Returned,
            _ => Self::Other(raw),
        }
    }
}

impl From<ItemStatus> for String {
    fn from(status: ItemStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An item as served by the portal backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub item_type: ItemType,
    #[serde(default)]
    pub item_keyword: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    /// Private proof phrase from the reporter, never displayed
    #[serde(default)]
    pub secret_message: String,
    #[serde(default)]
    pub status: ItemStatus,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub is_owner: bool,
}

/// Why an item cannot be claimed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ineligibility {
    NotAFoundItem,
    AlreadyResolved(ItemStatus),
    OwnItem,
    NotOpen(ItemStatus),
}

impl std::error::Error for Ineligibility {}

impl fmt::Display for Ineligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAFoundItem => f.write_str("Only found items can be claimed"),
            Self::AlreadyResolved(status) => {
                write!(f, "This item has already been {} and can no longer be claimed", status)
            }
            Self::OwnItem => f.write_str("You cannot claim an item that you reported yourself"),
            Self::NotOpen(status) => write!(f, "Items with status '{}' cannot be claimed", status),
        }
    }
}

impl Item {
    /// True when the item was reported by `actor` (or the backend says so)
    pub fn is_owned_by(&self, actor: Option<&str>) -> bool {
        if self.is_owner {
            return true;
        }
        match (self.student_id.as_deref(), actor) {
            (Some(owner), Some(actor)) => owner == actor,
            _ => false,
        }
    }

    /// Check whether `actor` may open a claim for this item
    pub fn claimability(&self, actor: Option<&str>) -> Result<(), Ineligibility> {
        if self.item_type != ItemType::Found {
            return Err(Ineligibility::NotAFoundItem);
        }
        if self.status.is_resolved() {
            return Err(Ineligibility::AlreadyResolved(self.status.clone()));
        }
        if self.is_owned_by(actor) {
            return Err(Ineligibility::OwnItem);
        }
        if !self.status.is_open() {
            return Err(Ineligibility::NotOpen(self.status.clone()));
        }
        Ok(())
    }

    pub fn is_claimable_by(&self, actor: Option<&str>) -> bool {
        self.claimability(actor).is_ok()
    }
}

/// One answered verification question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question: String,
    pub answer: String,
}

/// Who produced a transcript line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    Bot,
    User,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageFlags {
    pub is_error: bool,
    pub is_success: bool,
}

/// A display-only line of the claim chat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: MessageRole,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<MessageFlags>,
}

impl ConversationMessage {
    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Bot,
            text: text.into(),
            flags: None,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            text: text.into(),
            flags: None,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Bot,
            text: text.into(),
            flags: Some(MessageFlags {
                is_error: true,
                is_success: false,
            }),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Bot,
            text: text.into(),
            flags: Some(MessageFlags {
                is_error: false,
                is_success: true,
            }),
        }
    }

    pub fn is_error(&self) -> bool {
        self.flags.map(|f| f.is_error).unwrap_or(false)
    }

    pub fn is_success(&self) -> bool {
        self.flags.map(|f| f.is_success).unwrap_or(false)
    }
}

/// Coarse bucket for a match percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
    /// Only reported by the server when its analysis was unavailable
    Insufficient,
}

impl ConfidenceBand {
    pub fn from_percentage(percentage: u8) -> Self {
        if percentage >= 70 {
            Self::High
        } else if percentage >= 40 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Parse a band label, ignoring case; unknown labels yield `None`
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_uppercase().as_str() {
            "HIGH" => Some(Self::High),
            "MEDIUM" => Some(Self::Medium),
            "LOW" => Some(Self::Low),
            "INSUFFICIENT" => Some(Self::Insufficient),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
            Self::Insufficient => "INSUFFICIENT",
        }
    }
}

impl fmt::Display for ConfidenceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
