//! Durable Store Module
//!
//! Placeholder for a tier backed by a relational table. It honours the shared
//! contract so callers can be written against it today, but nothing is
//! persisted: every read misses and every write is accepted and dropped.

use std::marker::PhantomData;

use parking_lot::Mutex;
use tracing::debug;

use crate::cache::stats::Counters;
use crate::cache::{CacheEntry, CacheStatistics, CacheTier, EvictionPolicy, KeyPattern, Tier};
use crate::config::DurableStoreConfig;
use crate::error::Result;

// == Durable Store ==
#[derive(Debug)]
pub struct DurableStore<V> {
    table: String,
    max_size: u64,
    policy: EvictionPolicy,
    counters: Mutex<Counters>,
    _value: PhantomData<fn() -> V>,
}

impl<V> DurableStore<V> {
    pub fn new(table: impl Into<String>, max_size: u64, policy: EvictionPolicy) -> Self {
        Self {
            table: table.into(),
            max_size,
            policy,
            counters: Mutex::new(Counters::default()),
            _value: PhantomData,
        }
    }

    pub fn from_config(config: &DurableStoreConfig) -> Self {
        Self::new(config.table.clone(), config.max_size, config.policy)
    }

    /// Table the entries would be stored in.
    pub fn table(&self) -> &str {
        &self.table
    }
}

impl<V> CacheTier for DurableStore<V> {
    type Value = V;

    fn get(&self, key: &str) -> Option<CacheEntry<V>> {
        debug!(key, table = %self.table, "Durable tier is not backed yet, reporting a miss");
        self.counters.lock().record_miss();
        None
    }

    fn set(&self, key: &str, _entry: CacheEntry<V>) -> Result<()> {
        debug!(key, table = %self.table, "Durable tier is not backed yet, dropping write");
        Ok(())
    }

    fn delete(&self, _key: &str) -> bool {
        false
    }

    fn clear(&self) {
        *self.counters.lock() = Counters::default();
    }

    fn stats(&self) -> CacheStatistics {
        CacheStatistics::snapshot(
            Tier::Durable,
            self.policy,
            0,
            0,
            self.max_size,
            *self.counters.lock(),
        )
    }

    fn purge_expired(&self) -> usize {
        0
    }

    fn invalidate_matching(&self, pattern: &KeyPattern) -> usize {
        debug!(
            %pattern,
            table = %self.table,
            "Durable tier is not backed yet, nothing to invalidate"
        );
        0
    }
}
