//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint. Store calls are
//! synchronous and may touch the filesystem, so they run on the blocking pool.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use crate::cache::{
    CacheEntry, CacheStatistics, CacheTier, DiskStore, DurableStore, KeyPattern, MemoryStore,
    OverallStatistics, SharedTier, Tier,
};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    validate_key, ClearAllResponse, ClearResponse, DeleteResponse, GetResponse, HealthResponse,
    InvalidateRequest, InvalidateResponse, SetRequest, SetResponse, TierRemoval,
};

/// Application state shared across all handlers.
///
/// Holds one handle per tier. Each store locks internally, so the state
/// itself is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub memory: SharedTier,
    pub disk: SharedTier,
    pub durable: SharedTier,
}

impl AppState {
    /// Creates a new AppState from already constructed tiers.
    pub fn new(memory: SharedTier, disk: SharedTier, durable: SharedTier) -> Self {
        Self {
            memory,
            disk,
            durable,
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Opening the disk tier reloads its index and can fail.
    pub fn from_config(config: &Config) -> Result<Self> {
        let memory = MemoryStore::<Vec<u8>>::from_config(&config.memory);
        let disk = DiskStore::from_config(&config.disk)?;
        let durable = DurableStore::<Vec<u8>>::from_config(&config.durable);

        info!(
            memory_max = config.memory.max_size,
            disk_dir = %config.disk.dir.display(),
            disk_entries = disk.len(),
            "Cache tiers initialized"
        );

        Ok(Self::new(
            Arc::new(memory),
            Arc::new(disk),
            Arc::new(durable),
        ))
    }

    /// Returns the handle for `tier`.
    pub fn tier(&self, tier: Tier) -> SharedTier {
        match tier {
            Tier::Memory => self.memory.clone(),
            Tier::Disk => self.disk.clone(),
            Tier::Durable => self.durable.clone(),
        }
    }

    /// All tiers, in lookup order.
    pub fn tiers(&self) -> Vec<SharedTier> {
        vec![self.memory.clone(), self.disk.clone(), self.durable.clone()]
    }

    fn named_tiers(&self) -> [(Tier, &SharedTier); 3] {
        [
            (Tier::Memory, &self.memory),
            (Tier::Disk, &self.disk),
            (Tier::Durable, &self.durable),
        ]
    }

    // == Cross-tier Operations ==
    /// Removes every key matching `pattern` from every tier.
    pub fn invalidate_matching(&self, pattern: &KeyPattern) -> Vec<TierRemoval> {
        self.named_tiers()
            .into_iter()
            .map(|(tier, store)| TierRemoval {
                tier,
                removed: store.invalidate_matching(pattern),
            })
            .collect()
    }

    /// Clears every tier, returning the tiers in the order they were cleared.
    pub fn clear_all(&self) -> Vec<Tier> {
        self.named_tiers()
            .into_iter()
            .map(|(tier, store)| {
                store.clear();
                tier
            })
            .collect()
    }

    /// Hit/miss totals across the tiers plus each tier's own snapshot.
    pub fn overall_stats(&self) -> OverallStatistics {
        OverallStatistics::aggregate(
            self.named_tiers()
                .into_iter()
                .map(|(_, store)| store.stats())
                .collect(),
        )
    }
}

/// Runs a store call on the blocking pool.
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CacheError::Internal(format!("store task failed: {}", e)))
}

fn checked_key(key: &str) -> Result<()> {
    match validate_key(key) {
        Some(error_msg) => Err(CacheError::InvalidRequest(error_msg)),
        None => Ok(()),
    }
}

/// Handler for PUT /cache/:tier/:key
///
/// Stores a value in the given tier with optional TTL.
pub async fn set_handler(
    State(state): State<AppState>,
    Path((tier, key)): Path<(Tier, String)>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    checked_key(&key)?;

    let mut entry = CacheEntry::from_bytes(req.value.into_bytes()).with_compressed(req.compressed);
    if let Some(ttl) = req.ttl {
        entry = entry.with_ttl(Duration::from_secs(ttl));
    }

    let store = state.tier(tier);
    let task_key = key.clone();
    run_blocking(move || store.set(&task_key, entry)).await??;

    Ok(Json(SetResponse::new(key, tier)))
}

/// Handler for GET /cache/:tier/:key
///
/// Retrieves a live entry from the given tier.
pub async fn get_handler(
    State(state): State<AppState>,
    Path((tier, key)): Path<(Tier, String)>,
) -> Result<Json<GetResponse>> {
    let store = state.tier(tier);
    let task_key = key.clone();
    let entry = run_blocking(move || store.get(&task_key))
        .await?
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::from_entry(key, &entry)))
}

/// Handler for DELETE /cache/:tier/:key
///
/// Removes a key from the given tier. Absent keys are a 404.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path((tier, key)): Path<(Tier, String)>,
) -> Result<Json<DeleteResponse>> {
    let store = state.tier(tier);
    let task_key = key.clone();
    if !run_blocking(move || store.delete(&task_key)).await? {
        return Err(CacheError::NotFound(key));
    }

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for DELETE /cache/:tier
///
/// Drops every entry in the given tier and resets its counters.
pub async fn clear_handler(
    State(state): State<AppState>,
    Path(tier): Path<Tier>,
) -> Result<Json<ClearResponse>> {
    let store = state.tier(tier);
    run_blocking(move || store.clear()).await?;

    info!(%tier, "Tier cleared");
    Ok(Json(ClearResponse::new(tier)))
}

/// Handler for GET /stats/:tier
///
/// Returns the statistics snapshot of the given tier.
pub async fn stats_handler(
    State(state): State<AppState>,
    Path(tier): Path<Tier>,
) -> Result<Json<CacheStatistics>> {
    let store = state.tier(tier);
    let stats = run_blocking(move || store.stats()).await?;

    Ok(Json(stats))
}

/// Handler for DELETE /cache
///
/// Clears every tier.
pub async fn clear_all_handler(State(state): State<AppState>) -> Result<Json<ClearAllResponse>> {
    let tiers = run_blocking(move || state.clear_all()).await?;

    info!("All tiers cleared");
    Ok(Json(ClearAllResponse::new(tiers)))
}

/// Handler for POST /invalidate
///
/// Removes keys matching a wildcard pattern from every tier.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidateRequest>,
) -> Result<Json<InvalidateResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let pattern = KeyPattern::new(req.pattern);
    let task_pattern = pattern.clone();
    let tiers = run_blocking(move || state.invalidate_matching(&task_pattern)).await?;

    let response = InvalidateResponse::new(pattern.as_str(), tiers);
    info!(%pattern, removed = response.removed, "Invalidated matching keys");
    Ok(Json(response))
}

/// Handler for GET /stats
///
/// Returns totals across every tier.
pub async fn overall_stats_handler(
    State(state): State<AppState>,
) -> Result<Json<OverallStatistics>> {
    let stats = run_blocking(move || state.overall_stats()).await?;

    Ok(Json(stats))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::EvictionPolicy;

    fn test_state(dir: &std::path::Path) -> AppState {
        AppState::new(
            Arc::new(MemoryStore::<Vec<u8>>::new(100, EvictionPolicy::Lru)),
            Arc::new(DiskStore::open(dir, 100, EvictionPolicy::Lru).unwrap()),
            Arc::new(DurableStore::<Vec<u8>>::new("t", 100, EvictionPolicy::Lru)),
        )
    }

    fn set_request(value: &str) -> SetRequest {
        SetRequest {
            value: value.to_string(),
            ttl: None,
            compressed: false,
        }
    }

    fn path(tier: Tier, key: &str) -> Path<(Tier, String)> {
        Path((tier, key.to_string()))
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        for tier in [Tier::Memory, Tier::Disk] {
            let result = set_handler(
                State(state.clone()),
                path(tier, "test_key"),
                Json(set_request("test_value")),
            )
            .await;
            assert!(result.is_ok());

            let response = get_handler(State(state.clone()), path(tier, "test_key"))
                .await
                .unwrap();
            assert_eq!(response.value, "test_value");
            assert_eq!(response.tier, tier);
            assert_eq!(response.size_bytes, 10);
        }
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let result = get_handler(State(state), path(Tier::Memory, "nonexistent")).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_durable_write_is_not_readable() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        set_handler(
            State(state.clone()),
            path(Tier::Durable, "k"),
            Json(set_request("v")),
        )
        .await
        .unwrap();

        let result = get_handler(State(state), path(Tier::Durable, "k")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_delete_handler() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        set_handler(
            State(state.clone()),
            path(Tier::Disk, "to_delete"),
            Json(set_request("value")),
        )
        .await
        .unwrap();

        let result = delete_handler(State(state.clone()), path(Tier::Disk, "to_delete")).await;
        assert!(result.is_ok());

        let result = delete_handler(State(state.clone()), path(Tier::Disk, "to_delete")).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));

        let result = get_handler(State(state), path(Tier::Disk, "to_delete")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_set_oversized_value() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let result = set_handler(
            State(state),
            path(Tier::Memory, "big"),
            Json(set_request(&"x".repeat(101))),
        )
        .await;
        assert!(matches!(result, Err(CacheError::CapacityExceeded { .. })));
    }

    #[tokio::test]
    async fn test_clear_and_stats_handler() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        set_handler(
            State(state.clone()),
            path(Tier::Memory, "a"),
            Json(set_request("12345")),
        )
        .await
        .unwrap();

        let stats = stats_handler(State(state.clone()), Path(Tier::Memory))
            .await
            .unwrap();
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.current_size, 5);
        assert_eq!(stats.utilization_percent, 5.0);

        clear_handler(State(state.clone()), Path(Tier::Memory))
            .await
            .unwrap();

        let stats = stats_handler(State(state), Path(Tier::Memory)).await.unwrap();
        assert_eq!(stats.entry_count, 0);
        assert_eq!(stats.current_size, 0);
    }

    #[tokio::test]
    async fn test_invalidate_handler_spans_tiers() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        for (tier, key) in [
            (Tier::Memory, "user:1"),
            (Tier::Memory, "user:2"),
            (Tier::Disk, "user:3"),
            (Tier::Disk, "post:1"),
        ] {
            set_handler(State(state.clone()), path(tier, key), Json(set_request("v")))
                .await
                .unwrap();
        }

        let response = invalidate_handler(
            State(state.clone()),
            Json(InvalidateRequest {
                pattern: "user:*".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.removed, 3);
        assert_eq!(response.tiers[0].removed, 2);
        assert_eq!(response.tiers[1].removed, 1);
        assert!(get_handler(State(state), path(Tier::Disk, "post:1")).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalidate_handler_rejects_empty_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let result = invalidate_handler(
            State(state),
            Json(InvalidateRequest {
                pattern: String::new(),
            }),
        )
        .await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_clear_all_and_overall_stats() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        set_handler(State(state.clone()), path(Tier::Memory, "a"), Json(set_request("1")))
            .await
            .unwrap();
        set_handler(State(state.clone()), path(Tier::Disk, "b"), Json(set_request("22")))
            .await
            .unwrap();
        get_handler(State(state.clone()), path(Tier::Memory, "a"))
            .await
            .unwrap();
        let _ = get_handler(State(state.clone()), path(Tier::Disk, "missing")).await;

        let stats = overall_stats_handler(State(state.clone())).await.unwrap();
        assert_eq!(stats.total_hits, 1);
        assert_eq!(stats.total_misses, 1);
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.total_size, 3);
        assert_eq!(stats.tiers.len(), 3);

        let cleared = clear_all_handler(State(state.clone())).await.unwrap();
        assert_eq!(cleared.tiers, vec![Tier::Memory, Tier::Disk, Tier::Durable]);

        let stats = overall_stats_handler(State(state)).await.unwrap();
        assert_eq!(stats.total_entries, 0);
        assert_eq!(stats.total_requests, 0);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }

    #[tokio::test]
    async fn test_set_invalid_key() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let long_key = "k".repeat(crate::models::MAX_KEY_LENGTH + 1);
        let result = set_handler(
            State(state),
            path(Tier::Memory, &long_key),
            Json(set_request("value")),
        )
        .await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }
}
