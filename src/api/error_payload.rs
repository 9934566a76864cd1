//! Normalization of the backend's error bodies
//!
//! The portal answers failures with a bare string, `{"detail": ...}` (FastAPI),
//! or `{"msg": ...}`. `detail` may also be a list of validation entries.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorPayload {
    Str(String),
    Detail(String),
    Msg(String),
    Unknown,
}

impl ErrorPayload {
    /// Classify a raw response body
    pub fn parse(body: &str) -> Self {
        let body = body.trim();
        if body.is_empty() {
            return Self::Unknown;
        }
        match serde_json::from_str::<Value>(body) {
            Ok(value) => Self::from_value(&value),
            // Plain-text bodies are shown as they are
            Err(_) => Self::Str(body.to_string()),
        }
    }

    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) if !s.trim().is_empty() => Self::Str(s.clone()),
            Value::Object(map) => {
                if let Some(detail) = map.get("detail").and_then(flatten_detail) {
                    return Self::Detail(detail);
                }
                match map.get("msg") {
                    Some(Value::String(msg)) if !msg.trim().is_empty() => Self::Msg(msg.clone()),
                    _ => Self::Unknown,
                }
            }
            _ => Self::Unknown,
        }
    }

    /// Display string, or `fallback` when the body said nothing useful
    pub fn message_or(&self, fallback: &str) -> String {
        match self {
            Self::Str(s) | Self::Detail(s) | Self::Msg(s) => s.clone(),
            Self::Unknown => fallback.to_string(),
        }
    }

    pub fn message(&self) -> String {
        self.message_or("Request failed")
    }
}

fn flatten_detail(detail: &Value) -> Option<String> {
    match detail {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(entries) => {
            let parts: Vec<String> = entries
                .iter()
                .filter_map(|entry| match entry {
                    Value::String(s) => Some(s.clone()),
                    Value::Object(map) => map
                        .get("msg")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    _ => None,
                })
                .collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join("; "))
            }
        }
        Value::Object(map) => map.get("msg").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}
