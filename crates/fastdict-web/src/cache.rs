// In-memory lookup cache. Entries live forever unless a TTL is configured.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use serde::Serialize;

#[derive(Debug, Clone)]
struct CachedLookup {
    text: String,
    cached_at: Instant,
    ttl: Option<Duration>,
}

impl CachedLookup {
    fn is_expired(&self) -> bool {
        self.ttl
            .map(|ttl| self.cached_at.elapsed() > ttl)
            .unwrap_or(false)
    }
}

/// Finished lookup texts keyed by model and normalized query
pub struct ResponseCache {
    store: RwLock<HashMap<String, CachedLookup>>,
    default_ttl: Option<Duration>,
    max_entries: Option<usize>,
}

impl ResponseCache {
    /// `None` for `default_ttl` caches forever
    pub fn new(default_ttl: Option<Duration>) -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
            default_ttl,
            max_entries: None,
        }
    }

    /// Stop admitting new keys once `max_entries` are stored
    pub fn with_max_entries(mut self, max_entries: Option<usize>) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Get cached text (if not expired)
    pub fn get(&self, key: &str) -> Option<String> {
        {
            let store = self.store.read().ok()?;
            let cached = store.get(key)?;
            if !cached.is_expired() {
                return Some(cached.text.clone());
            }
        }

        self.remove_if_expired(key);
        None
    }

    // Another writer may have refreshed the key between the two locks
    fn remove_if_expired(&self, key: &str) {
        if let Ok(mut store) = self.store.write() {
            if store.get(key).is_some_and(CachedLookup::is_expired) {
                store.remove(key);
            }
        }
    }

    /// Store with the default TTL. Returns false if the cache was full.
    pub fn set(&self, key: String, text: String) -> bool {
        self.set_with_ttl(key, text, self.default_ttl)
    }

    pub fn set_with_ttl(&self, key: String, text: String, ttl: Option<Duration>) -> bool {
        let Ok(mut store) = self.store.write() else {
            return false;
        };

        if let Some(max) = self.max_entries {
            if store.len() >= max && !store.contains_key(&key) {
                store.retain(|_, v| !v.is_expired());
                if store.len() >= max {
                    tracing::debug!(max, "lookup cache full, not storing");
                    return false;
                }
            }
        }

        store.insert(
            key,
            CachedLookup {
                text,
                cached_at: Instant::now(),
                ttl,
            },
        );
        true
    }

    pub fn invalidate(&self, key: &str) {
        if let Ok(mut store) = self.store.write() {
            store.remove(key);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut store) = self.store.write() {
            store.clear();
        }
    }

    /// Remove expired entries (periodic cleanup)
    pub fn cleanup_expired(&self) {
        if let Ok(mut store) = self.store.write() {
            store.retain(|_, v| !v.is_expired());
        }
    }

    pub fn stats(&self) -> CacheStats {
        if let Ok(store) = self.store.read() {
            let total = store.len();
            let expired = store.values().filter(|v| v.is_expired()).count();

            CacheStats {
                total_entries: total,
                expired_entries: expired,
                active_entries: total - expired,
            }
        } else {
            CacheStats::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub active_entries: usize,
}

/// Trimmed and whitespace-collapsed. Case is kept: `Polish` and `polish`
/// are different lookups.
pub fn normalize_query(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn cache_key(model: &str, query: &str) -> String {
    format!("{}:{}", model, normalize_query(query))
}
