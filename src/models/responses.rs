//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::{CacheEntry, Tier};

/// Response body for the GET operation (GET /cache/:tier/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored value, lossily decoded as UTF-8
    pub value: String,
    pub tier: Tier,
    pub size_bytes: u64,
    pub compressed: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl GetResponse {
    /// Builds the response from an entry returned by a tier
    pub fn from_entry(key: impl Into<String>, entry: &CacheEntry<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: String::from_utf8_lossy(&entry.value).into_owned(),
            tier: entry.tier(),
            size_bytes: entry.size_bytes,
            compressed: entry.compressed,
            created_at: entry.created_at,
            expires_at: entry.expires_at,
        }
    }
}

/// Response body for the SET operation (PUT /cache/:tier/:key)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
    pub tier: Tier,
}

impl SetResponse {
    /// Creates a new SetResponse
    pub fn new(key: impl Into<String>, tier: Tier) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully in {} tier", key, tier),
            key,
            tier,
        }
    }
}

/// Response body for the DELETE operation (DELETE /cache/:tier/:key)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key,
        }
    }
}

/// Response body for the CLEAR operation (DELETE /cache/:tier)
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
    pub tier: Tier,
}

impl ClearResponse {
    pub fn new(tier: Tier) -> Self {
        Self {
            message: format!("{} tier cleared", tier),
            tier,
        }
    }
}

/// Response body for clearing every tier (DELETE /cache)
#[derive(Debug, Clone, Serialize)]
pub struct ClearAllResponse {
    pub message: String,
    pub tiers: Vec<Tier>,
}

impl ClearAllResponse {
    pub fn new(tiers: Vec<Tier>) -> Self {
        Self {
            message: "All cache tiers cleared".to_string(),
            tiers,
        }
    }
}

/// Entries one tier dropped during an invalidation
#[derive(Debug, Clone, Serialize)]
pub struct TierRemoval {
    pub tier: Tier,
    pub removed: usize,
}

/// Response body for pattern invalidation (POST /invalidate)
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub pattern: String,
    /// Total across all tiers
    pub removed: usize,
    pub tiers: Vec<TierRemoval>,
}

impl InvalidateResponse {
    pub fn new(pattern: impl Into<String>, tiers: Vec<TierRemoval>) -> Self {
        Self {
            pattern: pattern.into(),
            removed: tiers.iter().map(|t| t.removed).sum(),
            tiers,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
