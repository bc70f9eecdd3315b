//! Cache Module
//!
//! Bounded cache tiers (memory, disk, durable) sharing one entry model,
//! eviction-policy contract and statistics surface.

mod disk;
mod durable;
mod entry;
mod memory;
mod pattern;
mod policy;
mod stats;
mod tier;
mod tracker;


// Re-export public types
pub use disk::{DiskIndexRecord, DiskStore, INDEX_FILE_NAME};
pub use durable::DurableStore;
pub use entry::{CacheEntry, Tier};
pub use memory::MemoryStore;
pub use pattern::KeyPattern;
pub use policy::{EvictionPolicy, UnknownPolicy};
pub use stats::{utilization, CacheStatistics, OverallStatistics};
pub use tier::{CacheTier, SharedTier};
pub use tracker::{EvictionTracker, FifoTracker, LfuTracker, LruTracker};
