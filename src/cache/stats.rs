//! Cache Statistics Module
//!
//! Read-only snapshot of a store's occupancy plus its hit/miss counters.

use serde::Serialize;

use crate::cache::{EvictionPolicy, Tier};

// == Counters ==
/// Running counters kept by every store. Reset by Clear.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Counters {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
}

impl Counters {
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }
}

// == Cache Statistics ==
/// Snapshot of a single store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStatistics {
    /// Store class the snapshot was taken from
    pub tier: Tier,
    /// Number of live entries
    pub entry_count: usize,
    /// Bytes currently charged against capacity
    pub current_size: u64,
    /// Configured capacity
    pub max_size: u64,
    /// `current_size / max_size * 100`, 0 when `max_size` is 0
    pub utilization_percent: f64,
    /// Active eviction policy name
    pub policy: String,
    pub hits: u64,
    pub misses: u64,
    /// Entries removed to make room
    pub evictions: u64,
    /// Entries removed because their expiry passed
    pub expirations: u64,
    /// hits / (hits + misses), 0.0 before any read
    pub hit_rate: f64,
}

impl CacheStatistics {
    // == Constructor ==
    pub(crate) fn snapshot(
        tier: Tier,
        policy: EvictionPolicy,
        entry_count: usize,
        current_size: u64,
        max_size: u64,
        counters: Counters,
    ) -> Self {
        Self {
            tier,
            entry_count,
            current_size,
            max_size,
            utilization_percent: utilization(current_size, max_size),
            policy: policy.as_str().to_string(),
            hits: counters.hits,
            misses: counters.misses,
            evictions: counters.evictions,
            expirations: counters.expirations,
            hit_rate: hit_rate(counters.hits, counters.misses),
        }
    }
}

// == Overall Statistics ==
/// Aggregate over several stores, with the per-store snapshots attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallStatistics {
    pub total_hits: u64,
    pub total_misses: u64,
    /// hits + misses across all stores
    pub total_requests: u64,
    pub overall_hit_rate: f64,
    pub total_entries: usize,
    pub total_size: u64,
    pub tiers: Vec<CacheStatistics>,
}

impl OverallStatistics {
    pub fn aggregate(tiers: Vec<CacheStatistics>) -> Self {
        let total_hits: u64 = tiers.iter().map(|t| t.hits).sum();
        let total_misses: u64 = tiers.iter().map(|t| t.misses).sum();
        Self {
            total_hits,
            total_misses,
            total_requests: total_hits + total_misses,
            overall_hit_rate: hit_rate(total_hits, total_misses),
            total_entries: tiers.iter().map(|t| t.entry_count).sum(),
            total_size: tiers.iter().map(|t| t.current_size).sum(),
            tiers,
        }
    }
}

/// Percentage of `max_size` in use, 0 when nothing is allowed.
pub fn utilization(current_size: u64, max_size: u64) -> f64 {
    if max_size == 0 {
        0.0
    } else {
        current_size as f64 / max_size as f64 * 100.0
    }
}

fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utilization_zero_max() {
        assert_eq!(utilization(10, 0), 0.0);
    }

    #[test]
    fn test_utilization_half() {
        assert!((utilization(50, 100) - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(hit_rate(0, 0), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        assert_eq!(hit_rate(1, 1), 0.5);
        assert_eq!(hit_rate(3, 0), 1.0);
    }

    #[test]
    fn test_snapshot_fields() {
        let mut counters = Counters::default();
        counters.record_hit();
        counters.record_hit();
        counters.record_miss();
        counters.record_eviction();
        counters.record_expiration();

        let stats = CacheStatistics::snapshot(Tier::Memory, EvictionPolicy::Fifo, 3, 80, 100, counters);

        assert_eq!(stats.entry_count, 3);
        assert_eq!(stats.policy, "fifo");
        assert!((stats.utilization_percent - 80.0).abs() < 1e-9);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.expirations, 1);
        assert!((stats.hit_rate - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_overall_aggregates_tiers() {
        let mut memory = Counters::default();
        memory.record_hit();
        memory.record_hit();
        memory.record_miss();
        let mut disk = Counters::default();
        disk.record_hit();
        disk.record_miss();

        let overall = OverallStatistics::aggregate(vec![
            CacheStatistics::snapshot(Tier::Memory, EvictionPolicy::Lru, 2, 30, 100, memory),
            CacheStatistics::snapshot(Tier::Disk, EvictionPolicy::Lfu, 1, 10, 100, disk),
        ]);

        assert_eq!(overall.total_hits, 3);
        assert_eq!(overall.total_misses, 2);
        assert_eq!(overall.total_requests, 5);
        assert!((overall.overall_hit_rate - 0.6).abs() < 1e-9);
        assert_eq!(overall.total_entries, 3);
        assert_eq!(overall.total_size, 40);
        assert_eq!(overall.tiers.len(), 2);
    }

    #[test]
    fn test_overall_empty() {
        let overall = OverallStatistics::aggregate(Vec::new());
        assert_eq!(overall.total_requests, 0);
        assert_eq!(overall.overall_hit_rate, 0.0);
    }

    #[test]
    fn test_statistics_serialize() {
        let stats = CacheStatistics::snapshot(
            Tier::Disk,
            EvictionPolicy::Lru,
            0,
            0,
            0,
            Counters::default(),
        );
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["tier"], "disk");
        assert_eq!(json["policy"], "lru");
        assert_eq!(json["utilization_percent"], 0.0);
    }
}
