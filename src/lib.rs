//! Tiered Cache - bounded memory, disk and durable cache tiers
//!
//! Each tier enforces a byte capacity with a pluggable eviction policy
//! (LRU, LFU or FIFO), supports per-entry expiry and reports statistics.
//! An HTTP surface exposes the tiers side by side.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use tasks::spawn_cleanup_task;
