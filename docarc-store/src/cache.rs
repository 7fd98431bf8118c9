//! Short-TTL in-memory license status cache.
//!
//! Avoids a database round-trip on every authenticated request. The cache
//! is an optimization, never a source of truth: every license mutation
//! must invalidate the affected key, otherwise a deleted license would
//! appear valid (or a fresh one invalid) for up to the TTL window.
//!
//! The clock is injected so tests can cross the TTL boundary without
//! sleeping.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Time source, unix seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Cache TTL: entries older than this are treated as absent.
pub const DEFAULT_TTL_SECS: i64 = 300;

/// Cache key used when the caller supplies no device code.
pub const DEFAULT_KEY: &str = "__default__";

/// A cached validity decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedStatus {
    pub valid: bool,
    pub expire_time: Option<i64>,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    status: CachedStatus,
    cached_at: i64,
}

/// Per-device-key TTL cache of validity decisions.
pub struct StatusCache {
    ttl_secs: i64,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, Entry>>,
}

impl StatusCache {
    /// Creates a cache with the given TTL and clock.
    #[must_use]
    pub fn new(ttl_secs: i64, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl_secs,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached status for `key` if its age is below the TTL.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<CachedStatus> {
        let entries = self.entries.lock().expect("cache mutex poisoned");
        let entry = entries.get(key)?;
        if self.clock.now() - entry.cached_at < self.ttl_secs {
            Some(entry.status)
        } else {
            None
        }
    }

    /// Writes a status through for `key`, stamped with the current time.
    pub fn put(&self, key: &str, status: CachedStatus) {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.insert(
            key.to_string(),
            Entry {
                status,
                cached_at: self.clock.now(),
            },
        );
    }

    /// Drops the entry for `key`, if any.
    pub fn invalidate(&self, key: &str) {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.remove(key);
    }

    /// Drops every entry.
    pub fn clear(&self) {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.clear();
    }
}
