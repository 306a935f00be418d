//! In-process TTL cache for API payloads.
//!
//! Values are stored JSON-serialized so the cache stays type-erased; expired
//! entries are dropped on read. Nothing is persisted to disk.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

struct CacheEntry {
    payload: String,
    expires_at: Instant,
}

pub struct ApiCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    default_ttl: Duration,
}

impl Default for ApiCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl ApiCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            default_ttl,
        }
    }

    /// Returns the cached value for `key`, dropping it when expired.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) if entry.expires_at <= Instant::now() => {
                entries.remove(key);
                log::debug!("Cache expired for key {}", key);
                None
            }
            Some(entry) => {
                log::debug!("Cache hit for key {}", key);
                serde_json::from_str(&entry.payload).ok()
            }
            None => {
                log::debug!("Cache miss for key {}", key);
                None
            }
        }
    }

    /// Stores `value` under `key`; a serialization failure is logged and the
    /// entry is skipped, never surfaced.
    pub fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) {
        let payload = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Failed to cache {}: {}", key, e);
                return;
            }
        };
        let ttl = ttl.unwrap_or(self.default_ttl);
        self.entries.lock().unwrap().insert(
            key.to_string(),
            CacheEntry {
                payload,
                expires_at: Instant::now() + ttl,
            },
        );
        log::debug!("Cached {} for {:?}", key, ttl);
    }

    pub fn remove(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }

    pub fn clear(&self) {
        let mut entries = self.entries.lock().unwrap();
        let count = entries.len();
        entries.clear();
        log::info!("Cleared cache ({} items removed)", count);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
