//! Eviction Tracker Module
//!
//! Policy-specific bookkeeping used by the memory store to pick eviction
//! victims: a recency order for LRU, an insertion order for FIFO and access
//! counters for LFU.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Debug;

// == Eviction Tracker ==
/// Bookkeeping contract between a store and its eviction policy.
///
/// A tracker holds exactly the live keys of its store. The store calls
/// `record_insert` after a successful Set, `record_access` after a successful
/// Get and `remove` whenever a key leaves the store for any other reason.
pub trait EvictionTracker: Debug + Send + Sync {
    /// Registers a newly inserted key as the newest entry.
    fn record_insert(&mut self, key: &str);

    /// Registers a successful read of `key`.
    fn record_access(&mut self, key: &str);

    /// Forgets `key`. Unknown keys are ignored.
    fn remove(&mut self, key: &str);

    /// Removes and returns the next victim, or None when empty.
    fn evict(&mut self) -> Option<String>;

    /// Returns the next victim without removing it.
    fn peek(&self) -> Option<&str>;

    fn clear(&mut self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, key: &str) -> bool;
}

// == Ordered Keys ==
/// Keys ordered by a monotonically increasing sequence number.
///
/// Oldest sequence = first in line for eviction.
#[derive(Debug, Default)]
struct OrderedKeys {
    order: BTreeMap<u64, String>,
    positions: HashMap<String, u64>,
    next_seq: u64,
}

impl OrderedKeys {
    /// Places `key` at the newest end, removing any earlier position first.
    fn push_newest(&mut self, key: &str) {
        self.remove(key);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, key.to_string());
        self.positions.insert(key.to_string(), seq);
    }

    fn remove(&mut self, key: &str) {
        if let Some(seq) = self.positions.remove(key) {
            self.order.remove(&seq);
        }
    }

    fn pop_oldest(&mut self) -> Option<String> {
        let (_, key) = self.order.pop_first()?;
        self.positions.remove(&key);
        Some(key)
    }

    fn oldest(&self) -> Option<&str> {
        self.order.values().next().map(String::as_str)
    }

    fn clear(&mut self) {
        self.order.clear();
        self.positions.clear();
    }

    fn len(&self) -> usize {
        self.positions.len()
    }

    fn contains(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }
}

// == LRU Tracker ==
/// Tracks access order for LRU eviction.
///
/// Every insert and every read moves the key to the most-recent end.
#[derive(Debug, Default)]
pub struct LruTracker {
    recency: OrderedKeys,
}

impl LruTracker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EvictionTracker for LruTracker {
    fn record_insert(&mut self, key: &str) {
        self.recency.push_newest(key);
    }

    fn record_access(&mut self, key: &str) {
        if self.recency.contains(key) {
            self.recency.push_newest(key);
        }
    }

    fn remove(&mut self, key: &str) {
        self.recency.remove(key);
    }

    fn evict(&mut self) -> Option<String> {
        self.recency.pop_oldest()
    }

    fn peek(&self) -> Option<&str> {
        self.recency.oldest()
    }

    fn clear(&mut self) {
        self.recency.clear();
    }

    fn len(&self) -> usize {
        self.recency.len()
    }

    fn contains(&self, key: &str) -> bool {
        self.recency.contains(key)
    }
}

// == FIFO Tracker ==
/// Tracks insertion order only. Reads never reorder it.
#[derive(Debug, Default)]
pub struct FifoTracker {
    insertion: OrderedKeys,
}

impl FifoTracker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EvictionTracker for FifoTracker {
    fn record_insert(&mut self, key: &str) {
        self.insertion.push_newest(key);
    }

    fn record_access(&mut self, _key: &str) {}

    fn remove(&mut self, key: &str) {
        self.insertion.remove(key);
    }

    fn evict(&mut self) -> Option<String> {
        self.insertion.pop_oldest()
    }

    fn peek(&self) -> Option<&str> {
        self.insertion.oldest()
    }

    fn clear(&mut self) {
        self.insertion.clear();
    }

    fn len(&self) -> usize {
        self.insertion.len()
    }

    fn contains(&self, key: &str) -> bool {
        self.insertion.contains(key)
    }
}

// == LFU Tracker ==
/// Tracks access counts for LFU eviction.
///
/// Victims are chosen by `(count, insertion sequence)`: among keys with the
/// same count, the one inserted earliest goes first.
#[derive(Debug, Default)]
pub struct LfuTracker {
    /// key -> (count, insertion sequence)
    counts: HashMap<String, (u64, u64)>,
    /// Ordered view of `counts` used for victim selection
    ranking: BTreeSet<(u64, u64, String)>,
    next_seq: u64,
}

impl LfuTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current access count for `key`.
    pub fn count(&self, key: &str) -> Option<u64> {
        self.counts.get(key).map(|(count, _)| *count)
    }
}

impl EvictionTracker for LfuTracker {
    fn record_insert(&mut self, key: &str) {
        self.remove(key);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.counts.insert(key.to_string(), (1, seq));
        self.ranking.insert((1, seq, key.to_string()));
    }

    fn record_access(&mut self, key: &str) {
        let Some((count, seq)) = self.counts.get_mut(key) else {
            return;
        };
        self.ranking.remove(&(*count, *seq, key.to_string()));
        *count = count.saturating_add(1);
        self.ranking.insert((*count, *seq, key.to_string()));
    }

    fn remove(&mut self, key: &str) {
        if let Some((count, seq)) = self.counts.remove(key) {
            self.ranking.remove(&(count, seq, key.to_string()));
        }
    }

    fn evict(&mut self) -> Option<String> {
        let (_, _, key) = self.ranking.pop_first()?;
        self.counts.remove(&key);
        Some(key)
    }

    fn peek(&self) -> Option<&str> {
        self.ranking.first().map(|(_, _, key)| key.as_str())
    }

    fn clear(&mut self) {
        self.counts.clear();
        self.ranking.clear();
    }

    fn len(&self) -> usize {
        self.counts.len()
    }

    fn contains(&self, key: &str) -> bool {
        self.counts.contains_key(key)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn drain(tracker: &mut dyn EvictionTracker) -> Vec<String> {
        std::iter::from_fn(|| tracker.evict()).collect()
    }

    #[test]
    fn test_lru_new() {
        let lru = LruTracker::new();
        assert!(lru.is_empty());
        assert_eq!(lru.len(), 0);
    }

    #[test]
    fn test_lru_insert_order() {
        let mut lru = LruTracker::new();

        lru.record_insert("key1");
        lru.record_insert("key2");
        lru.record_insert("key3");

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.peek(), Some("key1"));
    }

    #[test]
    fn test_lru_access_moves_to_back() {
        let mut lru = LruTracker::new();

        lru.record_insert("a");
        lru.record_insert("b");
        lru.record_insert("c");
        lru.record_access("a");

        assert_eq!(drain(&mut lru), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_lru_reinsert_does_not_duplicate() {
        let mut lru = LruTracker::new();

        lru.record_insert("key1");
        lru.record_insert("key1");
        lru.record_insert("key1");

        assert_eq!(lru.len(), 1);
        assert_eq!(lru.evict(), Some("key1".to_string()));
        assert!(lru.is_empty());
    }

    #[test]
    fn test_lru_access_unknown_key_is_ignored() {
        let mut lru = LruTracker::new();
        lru.record_access("ghost");
        assert!(lru.is_empty());
    }

    #[test]
    fn test_lru_remove() {
        let mut lru = LruTracker::new();

        lru.record_insert("key1");
        lru.record_insert("key2");
        lru.record_insert("key3");
        lru.remove("key2");
        lru.remove("nonexistent");

        assert_eq!(lru.len(), 2);
        assert!(!lru.contains("key2"));
        assert_eq!(drain(&mut lru), vec!["key1", "key3"]);
    }

    #[test]
    fn test_lru_evict_empty() {
        let mut lru = LruTracker::new();
        assert_eq!(lru.evict(), None);
    }

    #[test]
    fn test_fifo_ignores_access() {
        let mut fifo = FifoTracker::new();

        fifo.record_insert("a");
        fifo.record_insert("b");
        fifo.record_insert("c");
        fifo.record_access("a");
        fifo.record_access("a");

        assert_eq!(drain(&mut fifo), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_fifo_reinsert_moves_to_newest() {
        let mut fifo = FifoTracker::new();

        fifo.record_insert("a");
        fifo.record_insert("b");
        fifo.record_insert("a");

        assert_eq!(fifo.len(), 2);
        assert_eq!(drain(&mut fifo), vec!["b", "a"]);
    }

    #[test]
    fn test_lfu_evicts_least_counted() {
        let mut lfu = LfuTracker::new();

        lfu.record_insert("a");
        lfu.record_insert("b");
        lfu.record_insert("c");
        lfu.record_access("a");
        lfu.record_access("c");
        lfu.record_access("c");

        assert_eq!(lfu.count("a"), Some(2));
        assert_eq!(lfu.count("c"), Some(3));
        assert_eq!(drain(&mut lfu), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_lfu_ties_break_by_insertion_order() {
        let mut lfu = LfuTracker::new();

        lfu.record_insert("zeta");
        lfu.record_insert("alpha");
        lfu.record_insert("mid");

        assert_eq!(lfu.peek(), Some("zeta"));
        assert_eq!(drain(&mut lfu), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_lfu_reinsert_resets_count() {
        let mut lfu = LfuTracker::new();

        lfu.record_insert("a");
        lfu.record_access("a");
        lfu.record_access("a");
        lfu.record_insert("a");

        assert_eq!(lfu.count("a"), Some(1));
        assert_eq!(lfu.len(), 1);
    }

    #[test]
    fn test_clear_empties_every_tracker() {
        let mut trackers: Vec<Box<dyn EvictionTracker>> = vec![
            Box::new(LruTracker::new()),
            Box::new(LfuTracker::new()),
            Box::new(FifoTracker::new()),
        ];

        for tracker in trackers.iter_mut() {
            tracker.record_insert("a");
            tracker.record_insert("b");
            tracker.clear();
            assert!(tracker.is_empty());
            assert_eq!(tracker.evict(), None);
        }
    }
}
