//! Keyed TTL cache for expensive aggregate computations
//!
//! Read endpoints cache whale-transaction listings (2 minute TTL) and
//! on-chain metrics (5 minute TTL) to avoid recomputation on every request.
//! Entries are keyed by the normalized filter parameters so concurrent
//! requests with different filters never alias each other's results.
//! Expiry is purely time-based; there is no invalidation on write.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::hash::Hash;

/// Cached value with its insertion timestamp
#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    cached_at: DateTime<Utc>,
}

/// A TTL cache keyed by normalized query parameters
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, Entry<V>>>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a cache with the given TTL in seconds
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: Duration::seconds(ttl_secs),
        }
    }

    /// Get the cached value for a key if it has not expired
    pub fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.read();
        let entry = entries.get(key)?;

        let age = Utc::now().signed_duration_since(entry.cached_at);
        if age >= self.ttl {
            return None;
        }

        Some(entry.value.clone())
    }

    /// Store a value with a fresh timestamp
    ///
    /// Expired entries are reclaimed on every write, so the map never
    /// outgrows the set of keys queried inside one TTL window even when
    /// callers send arbitrary filter values. Concurrent refreshes race
    /// benignly: last write wins.
    pub fn set(&self, key: K, value: V) {
        let now = Utc::now();
        let mut entries = self.entries.write();
        entries.retain(|_, entry| now.signed_duration_since(entry.cached_at) < self.ttl);
        entries.insert(
            key,
            Entry {
                value,
                cached_at: now,
            },
        );
    }

    /// Drop expired entries
    pub fn prune_expired(&self) {
        let now = Utc::now();
        let mut entries = self.entries.write();
        entries.retain(|_, entry| now.signed_duration_since(entry.cached_at) < self.ttl);
    }

    /// Number of entries currently held, expired or not
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
