//! Eviction Policy Module
//!
//! Names the victim-selection rule a store is configured with.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cache::tracker::{EvictionTracker, FifoTracker, LfuTracker, LruTracker};

// == Eviction Policy ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    /// Least recently used
    #[default]
    Lru,
    /// Least frequently used, ties broken by insertion order
    Lfu,
    /// First in, first out; reads never reorder
    Fifo,
}

impl EvictionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvictionPolicy::Lru => "lru",
            EvictionPolicy::Lfu => "lfu",
            EvictionPolicy::Fifo => "fifo",
        }
    }

    // == From Name ==
    /// Parses a configured policy name, falling back to LRU when the name is
    /// empty or unrecognized.
    pub fn from_name(name: &str) -> Self {
        if name.trim().is_empty() {
            return Self::default();
        }
        name.parse().unwrap_or_else(|_| {
            warn!(policy = name, "Unrecognized eviction policy, falling back to lru");
            Self::default()
        })
    }

    /// Builds the bookkeeping structure for this policy.
    pub(crate) fn tracker(&self) -> Box<dyn EvictionTracker> {
        match self {
            EvictionPolicy::Lru => Box::new(LruTracker::new()),
            EvictionPolicy::Lfu => Box::new(LfuTracker::new()),
            EvictionPolicy::Fifo => Box::new(FifoTracker::new()),
        }
    }
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a policy name is not one of `lru`, `lfu`, `fifo`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown eviction policy: {0}")]
pub struct UnknownPolicy(pub String);

impl FromStr for EvictionPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lru" => Ok(EvictionPolicy::Lru),
            "lfu" => Ok(EvictionPolicy::Lfu),
            "fifo" => Ok(EvictionPolicy::Fifo),
            _ => Err(UnknownPolicy(s.to_string())),
        }
    }
}
