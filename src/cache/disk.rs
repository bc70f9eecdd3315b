//! Disk Store Module
//!
//! Bounded filesystem-resident tier. Each entry lives in its own data file
//! and a single JSON index in the same directory mirrors the metadata of all
//! live entries. The index doubles as the eviction tracker: victims are
//! chosen from its logical clocks and access counts.
//!
//! Both the data files and the index are written to a temporary sibling and
//! renamed into place, so a crash leaves either the old or the new version.
//! On open the index is reconciled against the directory: records whose file
//! vanished or whose file path leaves the directory are dropped, sizes are
//! re-read from file metadata and data files no record points to are removed.

use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};

use crate::cache::entry::expired_at;
use crate::cache::stats::Counters;
use crate::cache::{CacheEntry, CacheStatistics, CacheTier, EvictionPolicy, KeyPattern, Tier};
use crate::config::DiskStoreConfig;
use crate::error::{CacheError, Result};

// == Constants ==
/// Name of the index file inside the cache directory
pub const INDEX_FILE_NAME: &str = "cache_index.json";

/// Extension of per-entry data files
const DATA_EXTENSION: &str = "cache";

/// Extension of files being written before their rename
const TEMP_EXTENSION: &str = "tmp";

/// Maximum length of the readable key prefix in data file names
const MAX_NAME_PREFIX: usize = 64;

const INDEX_VERSION: u32 = 1;

// == Disk Index Record ==
/// Persisted metadata of one disk-resident entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskIndexRecord {
    pub key: String,
    /// Data file, relative to the cache directory
    pub file_path: PathBuf,
    pub size_bytes: u64,
    /// Insertion time
    pub created_at: DateTime<Utc>,
    pub accessed_at: DateTime<Utc>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub compressed: bool,
    /// Number of inserts plus successful reads, used by LFU
    #[serde(default)]
    pub access_count: u64,
    /// Logical insertion clock, orders FIFO and LFU ties
    #[serde(default)]
    pub sequence: u64,
    /// Logical access clock, orders LRU
    #[serde(default)]
    pub access_sequence: u64,
}

impl DiskIndexRecord {
    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        expired_at(self.expires_at, now)
    }
}

/// On-disk layout of the index file.
#[derive(Debug, Serialize, Deserialize)]
struct IndexDocument {
    version: u32,
    records: Vec<DiskIndexRecord>,
}

// == Inner State ==
#[derive(Debug, Default)]
struct Inner {
    index: HashMap<String, DiskIndexRecord>,
    current_size: u64,
    counters: Counters,
    /// Next logical clock value
    clock: u64,
}

impl Inner {
    fn tick(&mut self) -> u64 {
        let value = self.clock;
        self.clock += 1;
        value
    }
}

// == Disk Store ==
/// Filesystem-backed cache bounded by the sum of payload sizes.
///
/// Payloads are raw bytes and each entry is charged its payload length, so
/// the size total always matches the bytes on disk.
#[derive(Debug)]
pub struct DiskStore {
    dir: PathBuf,
    index_path: PathBuf,
    max_size: u64,
    policy: EvictionPolicy,
    inner: RwLock<Inner>,
}

impl DiskStore {
    // == Constructor ==
    /// Opens (or creates) a disk store rooted at `dir`.
    ///
    /// An existing index is loaded and reconciled against the files actually
    /// present. A missing or unreadable index yields an empty store.
    pub fn open(dir: impl Into<PathBuf>, max_size: u64, policy: EvictionPolicy) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| CacheError::io(&dir, e))?;

        let store = Self {
            index_path: dir.join(INDEX_FILE_NAME),
            dir,
            max_size,
            policy,
            inner: RwLock::new(Inner::default()),
        };
        store.load()?;
        Ok(store)
    }

    pub fn from_config(config: &DiskStoreConfig) -> Result<Self> {
        Self::open(&config.dir, config.max_size, config.policy)
    }

    // == Load ==
    fn load(&self) -> Result<()> {
        remove_if_present(&temp_path(&self.index_path));

        let records = self.read_index()?;
        let listed = records.len();

        let mut inner = self.inner.write();
        let mut dropped = 0usize;
        let mut max_clock = 0u64;

        for mut record in records {
            if !is_plain_file_name(&record.file_path) {
                dropped += 1;
                warn!(
                    key = %record.key,
                    path = %record.file_path.display(),
                    "Dropping index record pointing outside the cache directory"
                );
                continue;
            }
            let path = self.dir.join(&record.file_path);
            match fs::metadata(&path) {
                Ok(meta) if meta.is_file() => {
                    if meta.len() != record.size_bytes {
                        debug!(
                            key = %record.key,
                            recorded = record.size_bytes,
                            actual = meta.len(),
                            "Disk record size corrected from file metadata"
                        );
                        record.size_bytes = meta.len();
                    }
                    max_clock = max_clock.max(record.sequence).max(record.access_sequence);
                    let kept = record.sequence;
                    if let Some(previous) = inner.index.insert(record.key.clone(), record) {
                        warn!(
                            key = %previous.key,
                            kept_sequence = kept,
                            discarded_sequence = previous.sequence,
                            "Duplicate key in disk index, keeping the later record"
                        );
                    }
                }
                _ => {
                    dropped += 1;
                    debug!(key = %record.key, path = %path.display(), "Dropping index record with missing file");
                }
            }
        }

        inner.current_size = inner.index.values().map(|r| r.size_bytes).sum();
        inner.clock = max_clock + 1;

        let orphans = self.remove_orphans(&inner.index);

        let mut trimmed = 0usize;
        while inner.current_size > self.max_size {
            let Some(victim) = self.select_victim(&inner.index, None) else {
                break;
            };
            self.evict(&mut inner, &victim);
            trimmed += 1;
        }

        if dropped > 0 || trimmed > 0 || inner.index.len() != listed {
            self.save_index(&inner);
        }

        info!(
            dir = %self.dir.display(),
            entries = inner.index.len(),
            size = inner.current_size,
            dropped,
            orphans,
            trimmed,
            "Disk cache index loaded"
        );
        Ok(())
    }

    fn read_index(&self) -> Result<Vec<DiskIndexRecord>> {
        let bytes = match fs::read(&self.index_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CacheError::io(&self.index_path, e)),
        };

        match serde_json::from_slice::<IndexDocument>(&bytes) {
            Ok(doc) => Ok(doc.records),
            Err(e) => {
                warn!(
                    path = %self.index_path.display(),
                    error = %e,
                    "Disk cache index is corrupt, starting empty"
                );
                Ok(Vec::new())
            }
        }
    }

    /// Deletes data files no index record refers to. Returns how many went.
    fn remove_orphans(&self, index: &HashMap<String, DiskIndexRecord>) -> usize {
        let referenced: HashSet<PathBuf> = index
            .values()
            .map(|r| self.dir.join(&r.file_path))
            .collect();

        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "Cannot scan cache directory for orphans");
                return 0;
            }
        };

        let mut removed = 0;
        for path in entries.filter_map(|e| e.ok()).map(|e| e.path()) {
            let ext = path.extension().and_then(|e| e.to_str());
            let is_data = ext == Some(DATA_EXTENSION);
            let is_partial = ext == Some(TEMP_EXTENSION) && path != temp_path(&self.index_path);
            if (is_data && !referenced.contains(&path)) || is_partial {
                remove_if_present(&path);
                removed += 1;
            }
        }
        removed
    }

    // == Get ==
    /// Reads the entry for `key` from disk.
    ///
    /// The store lock is held across the file read so a concurrent Delete
    /// cannot remove the file mid-read. Expired entries and records whose
    /// file has gone are removed and reported as misses.
    pub fn get(&self, key: &str) -> Option<CacheEntry<Vec<u8>>> {
        let now = Utc::now();
        let mut inner = self.inner.write();

        let Some(record) = inner.index.get(key) else {
            inner.counters.record_miss();
            return None;
        };

        if record.is_expired_at(now) {
            self.remove_record(&mut inner, key);
            inner.counters.record_expiration();
            inner.counters.record_miss();
            debug!(key, "Expired disk entry removed on read");
            self.save_index(&inner);
            return None;
        }

        let path = self.dir.join(&record.file_path);
        let value = match fs::read(&path) {
            Ok(value) => value,
            Err(e) => {
                if e.kind() == io::ErrorKind::NotFound {
                    debug!(key, path = %path.display(), "Data file vanished, dropping stale record");
                } else {
                    warn!(key, path = %path.display(), error = %e, "Failed to read data file, dropping record");
                }
                self.remove_record(&mut inner, key);
                inner.counters.record_miss();
                self.save_index(&inner);
                return None;
            }
        };

        let access_seq = inner.tick();
        let inner = &mut *inner;
        let record = inner.index.get_mut(key)?;

        let actual = value.len() as u64;
        if actual != record.size_bytes {
            debug!(key, recorded = record.size_bytes, actual, "Data file size changed out of band");
            inner.current_size = inner.current_size - record.size_bytes + actual;
            record.size_bytes = actual;
        }

        record.accessed_at = now;
        record.access_count = record.access_count.saturating_add(1);
        record.access_sequence = access_seq;

        let mut entry = CacheEntry::new(value, record.size_bytes)
            .with_expiry(record.expires_at)
            .with_compressed(record.compressed);
        entry.created_at = record.created_at;
        entry.last_access = now;
        entry.stamp_tier(Tier::Disk);

        inner.counters.record_hit();
        self.save_index(inner);
        Some(entry)
    }

    // == Set ==
    /// Writes `entry` to disk under `key`.
    ///
    /// The payload goes to a temporary file which is then renamed into place;
    /// if either step fails the store is left untouched. Other entries are
    /// then evicted until the new one fits and the index is updated.
    pub fn set(&self, key: &str, entry: CacheEntry<Vec<u8>>) -> Result<()> {
        let size = entry.value.len() as u64;
        if entry.size_bytes != size {
            debug!(
                key,
                declared = entry.size_bytes,
                size,
                "Disk tier charges the payload length"
            );
        }
        if size > self.max_size {
            return Err(CacheError::CapacityExceeded {
                key: key.to_string(),
                size,
                max_size: self.max_size,
            });
        }

        let mut inner = self.inner.write();

        let file_name = data_file_name(key);
        let path = self.dir.join(&file_name);
        let staging = temp_path(&path);
        write_synced(&staging, &entry.value)?;

        if let Err(e) = fs::rename(&staging, &path) {
            remove_if_present(&staging);
            return Err(CacheError::io(&path, e));
        }

        // With the key's own record excluded, evicting everything else always
        // leaves room since size <= max_size.
        let previous_size = inner.index.get(key).map_or(0, |r| r.size_bytes);
        while inner.current_size - previous_size + size > self.max_size {
            let Some(victim) = self.select_victim(&inner.index, Some(key)) else {
                break;
            };
            self.evict(&mut inner, &victim);
        }

        if let Some(old) = inner.index.remove(key) {
            inner.current_size -= old.size_bytes;
            if old.file_path != file_name {
                remove_if_present(&self.dir.join(&old.file_path));
            }
        }

        let now = Utc::now();
        let seq = inner.tick();
        let record = DiskIndexRecord {
            key: key.to_string(),
            file_path: file_name,
            size_bytes: size,
            created_at: now,
            accessed_at: now,
            expires_at: entry.expires_at,
            compressed: entry.compressed,
            access_count: 1,
            sequence: seq,
            access_sequence: seq,
        };
        inner.index.insert(key.to_string(), record);
        inner.current_size += size;

        self.save_index(&inner);
        Ok(())
    }

    // == Delete ==
    /// Removes `key` and its data file. File removal errors are logged only.
    pub fn delete(&self, key: &str) -> bool {
        let mut inner = self.inner.write();
        if !self.remove_record(&mut inner, key) {
            return false;
        }
        self.save_index(&inner);
        true
    }

    // == Clear ==
    /// Removes every data file and persists an empty index.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        for record in inner.index.values() {
            remove_if_present(&self.dir.join(&record.file_path));
        }
        inner.index.clear();
        inner.current_size = 0;
        inner.counters = Counters::default();
        self.save_index(&inner);
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStatistics {
        let inner = self.inner.read();
        CacheStatistics::snapshot(
            Tier::Disk,
            self.policy,
            inner.index.len(),
            inner.current_size,
            self.max_size,
            inner.counters,
        )
    }

    // == Purge Expired ==
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut inner = self.inner.write();

        let expired: Vec<String> = inner
            .index
            .values()
            .filter(|r| r.is_expired_at(now))
            .map(|r| r.key.clone())
            .collect();

        for key in &expired {
            self.remove_record(&mut inner, key);
            inner.counters.record_expiration();
        }
        if !expired.is_empty() {
            self.save_index(&inner);
        }
        expired.len()
    }

    // == Invalidate ==
    /// Removes every entry whose key matches `pattern`, files included.
    pub fn invalidate_matching(&self, pattern: &KeyPattern) -> usize {
        let mut inner = self.inner.write();

        let matched: Vec<String> = inner
            .index
            .keys()
            .filter(|key| pattern.matches(key))
            .cloned()
            .collect();

        for key in &matched {
            self.remove_record(&mut inner, key);
        }
        if !matched.is_empty() {
            debug!(%pattern, removed = matched.len(), "Invalidated disk entries");
            self.save_index(&inner);
        }
        matched.len()
    }

    // == Accessors ==
    pub fn len(&self) -> usize {
        self.inner.read().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn current_size(&self) -> u64 {
        self.inner.read().current_size
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// Whether an index record exists for `key`, without touching it.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.read().index.contains_key(key)
    }

    /// Copy of the index record for `key`.
    pub fn record(&self, key: &str) -> Option<DiskIndexRecord> {
        self.inner.read().index.get(key).cloned()
    }

    // == Internals ==
    /// Picks the next victim according to the policy, skipping `exclude`.
    fn select_victim(
        &self,
        index: &HashMap<String, DiskIndexRecord>,
        exclude: Option<&str>,
    ) -> Option<String> {
        let candidates = index
            .values()
            .filter(|r| Some(r.key.as_str()) != exclude);

        let victim = match self.policy {
            EvictionPolicy::Lru => candidates.min_by_key(|r| r.access_sequence),
            EvictionPolicy::Fifo => candidates.min_by_key(|r| r.sequence),
            EvictionPolicy::Lfu => candidates.min_by_key(|r| (r.access_count, r.sequence)),
        };
        victim.map(|r| r.key.clone())
    }

    fn evict(&self, inner: &mut Inner, key: &str) {
        if let Some(size) = inner.index.get(key).map(|r| r.size_bytes) {
            self.remove_record(inner, key);
            inner.counters.record_eviction();
            debug!(key, size, policy = %self.policy, "Evicted disk entry");
        }
    }

    /// Drops the record and its file, releasing its size.
    fn remove_record(&self, inner: &mut Inner, key: &str) -> bool {
        let Some(record) = inner.index.remove(key) else {
            return false;
        };
        inner.current_size -= record.size_bytes;
        remove_if_present(&self.dir.join(&record.file_path));
        true
    }

    /// Persists the full index, logging rather than surfacing failures. The
    /// in-memory index stays authoritative and the next mutation retries.
    fn save_index(&self, inner: &Inner) {
        if let Err(e) = self.write_index(inner) {
            error!(path = %self.index_path.display(), error = %e, "Failed to persist disk cache index");
        }
    }

    fn write_index(&self, inner: &Inner) -> Result<()> {
        let mut records: Vec<DiskIndexRecord> = inner.index.values().cloned().collect();
        records.sort_by_key(|r| r.sequence);

        let doc = IndexDocument {
            version: INDEX_VERSION,
            records,
        };
        let bytes = serde_json::to_vec_pretty(&doc)?;

        let staging = temp_path(&self.index_path);
        write_synced(&staging, &bytes)?;
        fs::rename(&staging, &self.index_path).map_err(|e| CacheError::io(&self.index_path, e))
    }
}

impl CacheTier for DiskStore {
    type Value = Vec<u8>;

    fn get(&self, key: &str) -> Option<CacheEntry<Vec<u8>>> {
        DiskStore::get(self, key)
    }

    fn set(&self, key: &str, entry: CacheEntry<Vec<u8>>) -> Result<()> {
        DiskStore::set(self, key, entry)
    }

    fn delete(&self, key: &str) -> bool {
        DiskStore::delete(self, key)
    }

    fn clear(&self) {
        DiskStore::clear(self)
    }

    fn stats(&self) -> CacheStatistics {
        DiskStore::stats(self)
    }

    fn purge_expired(&self) -> usize {
        DiskStore::purge_expired(self)
    }

    fn invalidate_matching(&self, pattern: &KeyPattern) -> usize {
        DiskStore::invalidate_matching(self, pattern)
    }
}

// == File Helpers ==
/// Deterministic data file name for `key`: a readable prefix plus a hash of
/// the full key.
pub(crate) fn data_file_name(key: &str) -> PathBuf {
    let mut prefix: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_NAME_PREFIX)
        .collect();
    if prefix.is_empty() {
        prefix.push_str("entry");
    }

    let digest = Sha256::digest(key.as_bytes());
    let hash: String = digest[..8].iter().map(|b| format!("{b:02x}")).collect();

    PathBuf::from(format!("{prefix}-{hash}.{DATA_EXTENSION}"))
}

/// True when `path` is a single file name with no directory parts.
fn is_plain_file_name(path: &Path) -> bool {
    let mut components = path.components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(TEMP_EXTENSION);
    PathBuf::from(name)
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| CacheError::io(path, e))?;
    file.write_all(bytes).map_err(|e| CacheError::io(path, e))?;
    file.sync_all().map_err(|e| CacheError::io(path, e))
}

/// Best-effort removal; a missing file is not an error.
fn remove_if_present(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove cache file"),
    }
}
