//! Key-value session storage
//!
//! Holds the bearer token and the "already seen" counters behind sidebar
//! badges. The claim workflow only sees the `SessionStore` trait.

use crate::core::error::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Key under which the bearer token is stored
pub const TOKEN_KEY: &str = "token";

const VIEWED_PREFIX: &str = "viewed_count:";

/// String key-value storage injected into the client
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;

    fn token(&self) -> Option<String> {
        self.get(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    fn set_token(&self, token: &str) -> Result<()> {
        self.set(TOKEN_KEY, token)
    }

    fn clear_token(&self) -> Result<()> {
        self.remove(TOKEN_KEY)
    }
}

/// Process-local store, lost on exit
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        let store = Self::new();
        store.lock().insert(TOKEN_KEY.to_string(), token.to_string());
        store
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a valid map
        self.values.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock().remove(key);
        Ok(())
    }
}

/// Store persisted as a JSON object, rewritten on every change
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str(&raw)?
            }
        } else {
            HashMap::new()
        };
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn update(&self, apply: impl FnOnce(&mut HashMap<String, String>)) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        apply(&mut values);
        let json = serde_json::to_string_pretty(&*values)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|values| {
            values.remove(key);
        })
    }
}

/// Unseen-count badges backed by persisted "viewed" totals
pub struct BadgeCounter {
    store: Arc<dyn SessionStore>,
}

impl BadgeCounter {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Total the user had seen when they last opened `badge`
    pub fn viewed(&self, badge: &str) -> u64 {
        self.store
            .get(&format!("{}{}", VIEWED_PREFIX, badge))
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    /// How many of `total` are new since the last visit
    pub fn unseen(&self, badge: &str, total: u64) -> u64 {
        total.saturating_sub(self.viewed(badge))
    }

    /// Record that the user has now seen `total` entries
    pub fn mark_viewed(&self, badge: &str, total: u64) -> Result<()> {
        self.store
            .set(&format!("{}{}", VIEWED_PREFIX, badge), &total.to_string())
    }

    /// Open `badge`: returns the unseen count, then marks everything seen
    pub fn visit(&self, badge: &str, total: u64) -> Result<u64> {
        let unseen = self.unseen(badge, total);
        self.mark_viewed(badge, total)?;
        Ok(unseen)
    }
}
