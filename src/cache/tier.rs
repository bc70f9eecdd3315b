//! Tier Contract Module
//!
//! The operation set every store exposes to collaborators.

use crate::cache::{CacheEntry, CacheStatistics, KeyPattern};
use crate::error::Result;

// == Cache Tier ==
/// Get/Set/Delete/Clear/Stats contract shared by the memory, disk and durable
/// stores.
///
/// All operations are blocking and take `&self`; implementations guard their
/// state internally so a store can be shared across threads behind an `Arc`.
pub trait CacheTier: Send + Sync {
    /// Payload type the store accepts.
    type Value;

    /// Returns a copy of the live entry for `key`.
    ///
    /// Not side-effect free: expired entries are removed and the eviction
    /// bookkeeping records the access.
    fn get(&self, key: &str) -> Option<CacheEntry<Self::Value>>;

    /// Stores `entry` under `key`, replacing any previous entry and evicting
    /// others as needed to fit.
    fn set(&self, key: &str, entry: CacheEntry<Self::Value>) -> Result<()>;

    /// Removes `key`, returning whether anything was removed.
    fn delete(&self, key: &str) -> bool;

    /// Removes every entry and resets the counters.
    fn clear(&self);

    /// Read-only snapshot; never touches eviction bookkeeping.
    fn stats(&self) -> CacheStatistics;

    /// Removes every expired entry in one pass, returning how many went.
    fn purge_expired(&self) -> usize;

    /// Removes every entry whose key matches `pattern`, returning how many
    /// went. Not counted as evictions.
    fn invalidate_matching(&self, pattern: &KeyPattern) -> usize;
}

/// Shared handle to a byte-valued tier.
pub type SharedTier = std::sync::Arc<dyn CacheTier<Value = Vec<u8>>>;

