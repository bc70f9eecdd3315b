//! Configuration Module
//!
//! Handles loading store and server configuration from environment variables.

use std::env;
use std::path::PathBuf;

use serde::Deserialize;

use crate::cache::EvictionPolicy;

/// Construction parameters for a [`MemoryStore`](crate::cache::MemoryStore).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MemoryStoreConfig {
    /// Capacity in bytes
    pub max_size: u64,
    #[serde(default)]
    pub policy: EvictionPolicy,
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self {
            max_size: 64 * 1024 * 1024,
            policy: EvictionPolicy::Lru,
        }
    }
}

/// Construction parameters for a [`DiskStore`](crate::cache::DiskStore).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DiskStoreConfig {
    /// Directory holding the data files and the index
    pub dir: PathBuf,
    /// Capacity in bytes
    pub max_size: u64,
    #[serde(default)]
    pub policy: EvictionPolicy,
}

impl Default for DiskStoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./cache_data"),
            max_size: 1024 * 1024 * 1024,
            policy: EvictionPolicy::Lru,
        }
    }
}

/// Construction parameters for a [`DurableStore`](crate::cache::DurableStore).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DurableStoreConfig {
    /// Relational table the entries would live in
    pub table: String,
    pub max_size: u64,
    #[serde(default)]
    pub policy: EvictionPolicy,
}

impl Default for DurableStoreConfig {
    fn default() -> Self {
        Self {
            table: "cache_entries".to_string(),
            max_size: 0,
            policy: EvictionPolicy::Lru,
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub memory: MemoryStoreConfig,
    pub disk: DiskStoreConfig,
    pub durable: DurableStoreConfig,
    /// HTTP server port
    pub server_port: u16,
    /// Expiry sweep interval in seconds, 0 disables the sweep
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MEMORY_MAX_BYTES` - Memory tier capacity (default: 64 MiB)
    /// - `MEMORY_POLICY` - `lru`, `lfu` or `fifo` (default: lru)
    /// - `DISK_CACHE_DIR` - Disk tier directory (default: ./cache_data)
    /// - `DISK_MAX_BYTES` - Disk tier capacity (default: 1 GiB)
    /// - `DISK_POLICY` - `lru`, `lfu` or `fifo` (default: lru)
    /// - `DURABLE_TABLE` - Durable tier table name (default: cache_entries)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Expiry sweep frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            memory: MemoryStoreConfig {
                max_size: parse_var("MEMORY_MAX_BYTES").unwrap_or(defaults.memory.max_size),
                policy: policy_var("MEMORY_POLICY"),
            },
            disk: DiskStoreConfig {
                dir: env::var("DISK_CACHE_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.disk.dir),
                max_size: parse_var("DISK_MAX_BYTES").unwrap_or(defaults.disk.max_size),
                policy: policy_var("DISK_POLICY"),
            },
            durable: DurableStoreConfig {
                table: env::var("DURABLE_TABLE").unwrap_or(defaults.durable.table),
                ..defaults.durable
            },
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            cleanup_interval: parse_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            memory: MemoryStoreConfig::default(),
            disk: DiskStoreConfig::default(),
            durable: DurableStoreConfig::default(),
            server_port: 3000,
            cleanup_interval: 60,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

fn policy_var(name: &str) -> EvictionPolicy {
    env::var(name)
        .map(|v| EvictionPolicy::from_name(&v))
        .unwrap_or_default()
}
