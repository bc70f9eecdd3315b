//! Cache Entry Module
//!
//! Defines the value wrapper shared by every tier, with expiry support.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// == Tier ==
/// Which store class produced an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Memory,
    Disk,
    Durable,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Memory => "memory",
            Tier::Disk => "disk",
            Tier::Durable => "durable",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Cache Entry ==
/// A single cached value with its accounting and timing metadata.
///
/// `size_bytes` is the unit charged against a store's capacity. It is taken
/// as given at insertion and never recomputed by the memory tier.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Capacity charge for this entry
    pub size_bytes: u64,
    /// When the entry was created
    pub created_at: DateTime<Utc>,
    /// Last successful read (or creation)
    pub last_access: DateTime<Utc>,
    /// Absolute expiry, None = never expires
    pub expires_at: Option<DateTime<Utc>>,
    /// Payload encoding flag, not interpreted by the stores
    pub compressed: bool,
    tier: Tier,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry charged at `size_bytes` with no expiry.
    pub fn new(value: V, size_bytes: u64) -> Self {
        let now = Utc::now();
        Self {
            value,
            size_bytes,
            created_at: now,
            last_access: now,
            expires_at: None,
            compressed: false,
            tier: Tier::Memory,
        }
    }

    /// Sets the expiry to `ttl` from now.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        let expires = self
            .created_at
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.expires_at = Some(expires);
        self
    }

    /// Sets an absolute expiry. `None` clears it.
    pub fn with_expiry(mut self, expires_at: Option<DateTime<Utc>>) -> Self {
        self.expires_at = expires_at;
        self
    }

    pub fn with_compressed(mut self, compressed: bool) -> Self {
        self.compressed = compressed;
        self
    }

    // == Tier ==
    /// The store class that accepted this entry.
    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub(crate) fn stamp_tier(&mut self, tier: Tier) {
        self.tier = tier;
    }

    // == Is Expired ==
    /// Checks whether the entry is logically dead at `now`.
    ///
    /// Expiry is strict: an entry whose `expires_at` equals `now` is still live.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        expired_at(self.expires_at, now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

impl CacheEntry<Vec<u8>> {
    /// Creates a byte entry charged at its payload length.
    pub fn from_bytes(value: impl Into<Vec<u8>>) -> Self {
        let value = value.into();
        let size = value.len() as u64;
        Self::new(value, size)
    }
}

/// Returns true when an optional expiry has passed at `now`.
pub(crate) fn expired_at(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    matches!(expires_at, Some(expires) if now > expires)
}
