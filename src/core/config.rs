//! Portal configuration with documented constants
//!
//! Every tunable of the claim workflow lives here, together with the reason
//! for its default value.

use crate::core::error::{ClaimError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Number of verification questions in every claim attempt
pub const QUESTION_COUNT: usize = 3;

/// Configuration for talking to the portal backend and pacing the chat
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    // === BACKEND ===
    /// Base URL of the REST API, including the `/api` prefix
    pub api_url: String,

    /// Upper bound for every HTTP call, in seconds
    ///
    /// Question generation falls back to local heuristics once this expires,
    /// so it also bounds how long a claimant waits for the first question.
    pub request_timeout_secs: u64,

    /// Student id of the person using this client, if known
    ///
    /// The public item listing strips `student_id`, so ownership checks rely
    /// on `is_owner` from the backend first and this value second.
    pub student_id: Option<String>,

    // === CONVERSATION ===
    /// Pause before the assistant posts the next question, in milliseconds
    ///
    /// Purely cosmetic. Zero disables it (tests do this).
    pub display_delay_ms: u64,

    /// Minimum trimmed length of an accepted answer
    ///
    /// Answers shorter than this carry too little signal to score.
    pub min_answer_len: usize,

    /// Largest proof-of-ownership image accepted, in bytes (5 MiB)
    pub max_proof_image_bytes: usize,

    // === SESSION ===
    /// File backing the session store (token, viewed counts)
    ///
    /// `None` keeps the session in memory only.
    pub session_file: Option<PathBuf>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000/api".into(),
            request_timeout_secs: 10,
            student_id: None,
            display_delay_ms: 600,
            min_answer_len: 5,
            max_proof_image_bytes: 5 * 1024 * 1024,
            session_file: None,
        }
    }
}

impl PortalConfig {
    /// Load a config from a TOML file; missing keys keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&raw).map_err(|e| {
            ClaimError::Config(format!("{}: {}", path.as_ref().display(), e))
        })
    }

    /// Apply `LOSTFOUND_*` environment overrides
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(url) = std::env::var("LOSTFOUND_API_URL") {
            self.api_url = url;
        }
        if let Ok(secs) = std::env::var("LOSTFOUND_TIMEOUT_SECS") {
            self.request_timeout_secs = secs.parse().map_err(|_| {
                ClaimError::Config(format!("LOSTFOUND_TIMEOUT_SECS is not a number: {}", secs))
            })?;
        }
        if let Ok(id) = std::env::var("LOSTFOUND_STUDENT_ID") {
            self.student_id = Some(id);
        }
        Ok(self)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn display_delay(&self) -> Duration {
        Duration::from_millis(self.display_delay_ms)
    }

    /// API url without a trailing slash, ready for path joins
    pub fn base_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(format!("api_url must be an http(s) URL, got '{}'", self.api_url));
        }

        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be positive".into());
        }

        if self.min_answer_len == 0 {
            return Err("min_answer_len must be at least 1".into());
        }

        if self.max_proof_image_bytes == 0 {
            return Err("max_proof_image_bytes must be positive".into());
        }

        Ok(())
    }
}

// === GLOBAL CONFIG ACCESS ===

use std::sync::OnceLock;

static CONFIG: OnceLock<PortalConfig> = OnceLock::new();

/// Get the global portal config (initializes with defaults if not set)
pub fn config() -> &'static PortalConfig {
    CONFIG.get_or_init(PortalConfig::default)
}

/// Set the global portal config (can only be called once)
///
/// Returns Err if config was already set.
pub fn set_config(config: PortalConfig) -> std::result::Result<(), PortalConfig> {
    CONFIG.set(config)
}
