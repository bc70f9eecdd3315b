//! Memory Store Module
//!
//! Bounded RAM-resident tier: a HashMap of entries plus the eviction tracker
//! of the configured policy, all guarded by one lock.

use std::collections::HashMap;

use chrono::Utc;
use parking_lot::RwLock;
use tracing::debug;

use crate::cache::stats::Counters;
use crate::cache::{
    CacheEntry, CacheStatistics, CacheTier, EvictionPolicy, EvictionTracker, KeyPattern, Tier,
};
use crate::config::MemoryStoreConfig;
use crate::error::{CacheError, Result};

// == Inner State ==
/// Everything the lock guards. Get mutates the tracker, so reads take the
/// write side too.
#[derive(Debug)]
struct Inner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    tracker: Box<dyn EvictionTracker>,
    current_size: u64,
    counters: Counters,
}

impl<V> Inner<V> {
    /// Drops `key` from the map, the tracker and the size total.
    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.tracker.remove(key);
        self.current_size -= entry.size_bytes;
        Some(entry)
    }
}

// == Memory Store ==
/// RAM-resident cache bounded by the sum of entry sizes.
#[derive(Debug)]
pub struct MemoryStore<V> {
    inner: RwLock<Inner<V>>,
    max_size: u64,
    policy: EvictionPolicy,
}

impl<V> MemoryStore<V>
where
    V: Clone + Send + Sync,
{
    // == Constructor ==
    /// Creates an empty store holding at most `max_size` bytes.
    pub fn new(max_size: u64, policy: EvictionPolicy) -> Self {
        Self {
            inner: RwLock::new(Inner {
                entries: HashMap::new(),
                tracker: policy.tracker(),
                current_size: 0,
                counters: Counters::default(),
            }),
            max_size,
            policy,
        }
    }

    pub fn from_config(config: &MemoryStoreConfig) -> Self {
        Self::new(config.max_size, config.policy)
    }

    // == Get ==
    /// Returns a copy of the live entry for `key`.
    ///
    /// An expired entry is removed on the spot and reported as a miss. A hit
    /// refreshes `last_access` and informs the tracker.
    pub fn get(&self, key: &str) -> Option<CacheEntry<V>> {
        let now = Utc::now();
        let mut guard = self.inner.write();
        let inner = &mut *guard;

        let expired = match inner.entries.get(key) {
            Some(entry) => entry.is_expired_at(now),
            None => {
                inner.counters.record_miss();
                return None;
            }
        };

        if expired {
            if let Some(entry) = inner.remove_entry(key) {
                debug!(key, size = entry.size_bytes, "Expired memory entry removed on read");
            }
            inner.counters.record_expiration();
            inner.counters.record_miss();
            return None;
        }

        let entry = inner.entries.get_mut(key)?;
        entry.last_access = now;
        let found = entry.clone();
        inner.tracker.record_access(key);
        inner.counters.record_hit();
        Some(found)
    }

    // == Set ==
    /// Stores `entry` under `key`.
    ///
    /// A previous entry for the key is released first. Other entries are then
    /// evicted one at a time until the new entry fits. An entry larger than
    /// the whole store is rejected without touching any state.
    pub fn set(&self, key: &str, mut entry: CacheEntry<V>) -> Result<()> {
        let size = entry.size_bytes;
        if size > self.max_size {
            return Err(CacheError::CapacityExceeded {
                key: key.to_string(),
                size,
                max_size: self.max_size,
            });
        }

        let mut guard = self.inner.write();
        let inner = &mut *guard;

        inner.remove_entry(key);

        while inner.current_size + size > self.max_size {
            let Some(victim) = inner.tracker.evict() else {
                return Err(CacheError::CapacityExceeded {
                    key: key.to_string(),
                    size,
                    max_size: self.max_size,
                });
            };
            if let Some(evicted) = inner.entries.remove(&victim) {
                inner.current_size -= evicted.size_bytes;
                inner.counters.record_eviction();
                debug!(
                    key = %victim,
                    size = evicted.size_bytes,
                    policy = %self.policy,
                    "Evicted memory entry"
                );
            }
        }

        entry.stamp_tier(Tier::Memory);
        inner.entries.insert(key.to_string(), entry);
        inner.current_size += size;
        inner.tracker.record_insert(key);

        Ok(())
    }

    // == Delete ==
    /// Removes `key`. Returns false when it was not present.
    pub fn delete(&self, key: &str) -> bool {
        self.inner.write().remove_entry(key).is_some()
    }

    // == Clear ==
    /// Empties the store and its tracker and resets the counters.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.entries.clear();
        inner.tracker.clear();
        inner.current_size = 0;
        inner.counters = Counters::default();
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStatistics {
        let inner = self.inner.read();
        CacheStatistics::snapshot(
            Tier::Memory,
            self.policy,
            inner.entries.len(),
            inner.current_size,
            self.max_size,
            inner.counters,
        )
    }

    // == Purge Expired ==
    /// Removes all expired entries. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut inner = self.inner.write();

        let expired: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            inner.remove_entry(key);
            inner.counters.record_expiration();
        }

        expired.len()
    }

    // == Invalidate ==
    /// Removes every entry whose key matches `pattern`.
    pub fn invalidate_matching(&self, pattern: &KeyPattern) -> usize {
        let mut inner = self.inner.write();

        let matched: Vec<String> = inner
            .entries
            .keys()
            .filter(|key| pattern.matches(key))
            .cloned()
            .collect();

        for key in &matched {
            inner.remove_entry(key);
        }
        if !matched.is_empty() {
            debug!(%pattern, removed = matched.len(), "Invalidated memory entries");
        }

        matched.len()
    }

    // == Accessors ==
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes currently charged against capacity.
    pub fn current_size(&self) -> u64 {
        self.inner.read().current_size
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    /// Whether `key` is held, expired or not, without touching bookkeeping.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.read().entries.contains_key(key)
    }
}

impl<V> CacheTier for MemoryStore<V>
where
    V: Clone + Send + Sync,
{
    type Value = V;

    fn get(&self, key: &str) -> Option<CacheEntry<V>> {
        MemoryStore::get(self, key)
    }

    fn set(&self, key: &str, entry: CacheEntry<V>) -> Result<()> {
        MemoryStore::set(self, key, entry)
    }

    fn delete(&self, key: &str) -> bool {
        MemoryStore::delete(self, key)
    }

    fn clear(&self) {
        MemoryStore::clear(self)
    }

    fn stats(&self) -> CacheStatistics {
        MemoryStore::stats(self)
    }

    fn purge_expired(&self) -> usize {
        MemoryStore::purge_expired(self)
    }

    fn invalidate_matching(&self, pattern: &KeyPattern) -> usize {
        MemoryStore::invalidate_matching(self, pattern)
    }
}
