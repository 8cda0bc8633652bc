// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Type size cache
//!
//! Fingerprint -> [`ElementTypeData`], shared by every scan session in the
//! process. Keys are spread over independently locked shards; an insert
//! only ever locks the shard owning its key. The snapshot on disk is a
//! pretty-printed JSON object keyed by fingerprint.
//!
//! Several caches may share one snapshot path. A flush first merges what
//! is already on disk, so no writer drops another writer's entries.

use opening_lite_core::{ElementTypeData, Result};
use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxHashMap, FxHasher};
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

const SHARD_COUNT: usize = 16;

/// Serializes snapshot writes across every cache in the process
static SNAPSHOT_WRITE: Mutex<()> = parking_lot::const_mutex(());

/// Suffix counter for temp files
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// What [`TypeSizeCache::insert_if_absent`] did
#[derive(Debug, Clone, PartialEq)]
pub enum CacheInsert {
    /// The offered value was stored
    Inserted(ElementTypeData),
    /// A valid value was already present and wins
    Existing(ElementTypeData),
}

impl CacheInsert {
    pub fn is_inserted(&self) -> bool {
        matches!(self, CacheInsert::Inserted(_))
    }

    /// The value now stored for the key
    pub fn into_value(self) -> ElementTypeData {
        match self {
            CacheInsert::Inserted(data) | CacheInsert::Existing(data) => data,
        }
    }
}

#[derive(Debug)]
pub struct TypeSizeCache {
    shards: Box<[RwLock<FxHashMap<String, ElementTypeData>>]>,
    path: Option<PathBuf>,
}

impl Default for TypeSizeCache {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl TypeSizeCache {
    /// Cache that is never persisted
    pub fn in_memory() -> Self {
        Self::build(None)
    }

    /// Cache backed by a snapshot file (not loaded until [`TypeSizeCache::load`])
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self::build(Some(path.into()))
    }

    fn build(path: Option<PathBuf>) -> Self {
        let shards = (0..SHARD_COUNT)
            .map(|_| RwLock::new(FxHashMap::default()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self { shards, path }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn shard(&self, key: &str) -> &RwLock<FxHashMap<String, ElementTypeData>> {
        let mut hasher = FxHasher::default();
        key.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % SHARD_COUNT]
    }

    /// Valid cached size for `key`
    ///
    /// An entry with a non-positive side is treated as absent.
    pub fn get(&self, key: &str) -> Option<ElementTypeData> {
        let shard = self.shard(key).read();
        let data = shard.get(key)?;
        if data.is_valid() {
            Some(data.clone())
        } else {
            tracing::warn!(
                key = %key,
                width = data.width,
                height = data.height,
                "Invalid cached size, recomputing"
            );
            None
        }
    }

    /// Store `data` unless a valid value already exists for `key`
    ///
    /// Atomic per key: of several concurrent writers exactly one value is
    /// kept and every caller gets that value back. An invalid existing
    /// entry is overwritten.
    pub fn insert_if_absent(&self, key: impl Into<String>, data: ElementTypeData) -> CacheInsert {
        let key = key.into();
        let mut shard = self.shard(&key).write();
        match shard.get(&key) {
            Some(existing) if existing.is_valid() => CacheInsert::Existing(existing.clone()),
            _ => {
                shard.insert(key, data.clone());
                CacheInsert::Inserted(data)
            }
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.shard(key).read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.read().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|s| s.read().is_empty())
    }

    pub fn clear(&self) {
        for shard in self.shards.iter() {
            shard.write().clear();
        }
    }

    /// Sorted copy of every entry
    pub fn snapshot(&self) -> BTreeMap<String, ElementTypeData> {
        let mut all = BTreeMap::new();
        for shard in self.shards.iter() {
            for (k, v) in shard.read().iter() {
                all.insert(k.clone(), v.clone());
            }
        }
        all
    }

    /// Merge the snapshot file into the cache, returning how many entries
    /// were taken
    ///
    /// A missing file or an in-memory cache loads nothing. Entries already
    /// present keep their value; invalid records are skipped.
    pub fn load(&self) -> Result<usize> {
        let Some(path) = self.path.as_deref() else {
            return Ok(0);
        };
        let Some(records) = read_snapshot(path)? else {
            tracing::debug!(path = %path.display(), "No type size snapshot yet");
            return Ok(0);
        };
        let loaded = self.merge_records(records);
        tracing::info!(path = %path.display(), loaded, "Loaded type size snapshot");
        Ok(loaded)
    }

    fn merge_records(&self, records: BTreeMap<String, ElementTypeData>) -> usize {
        let mut merged = 0;
        for (key, data) in records {
            if !data.is_valid() {
                tracing::warn!(key = %key, "Skipping invalid record in type size snapshot");
                continue;
            }
            if self.insert_if_absent(key, data).is_inserted() {
                merged += 1;
            }
        }
        merged
    }

    /// Take every valid persisted record, replacing a differing local value
    fn adopt_records(&self, records: BTreeMap<String, ElementTypeData>) -> usize {
        let mut adopted = 0;
        for (key, data) in records.into_iter().filter(|(_, d)| d.is_valid()) {
            let mut shard = self.shard(&key).write();
            if shard.get(&key) != Some(&data) {
                shard.insert(key, data);
                adopted += 1;
            }
        }
        adopted
    }

    /// Write every entry to the snapshot file
    ///
    /// Entries another cache already wrote to the same file are adopted
    /// first; on a conflicting key the persisted value wins, so every cache
    /// sharing the file converges on the first size written for a type.
    /// The union then goes to a unique temp file that is renamed over the
    /// snapshot. A corrupt snapshot is replaced. No-op for an in-memory
    /// cache.
    pub fn flush(&self) -> Result<()> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        let _guard = SNAPSHOT_WRITE.lock();

        match read_snapshot(path) {
            Ok(Some(records)) => {
                let adopted = self.adopt_records(records);
                if adopted > 0 {
                    tracing::debug!(path = %path.display(), adopted, "Merged entries written by another cache");
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Unreadable type size snapshot, replacing it");
            }
        }

        let json = serde_json::to_vec_pretty(&self.snapshot())?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension(format!(
            "json.{}.{}.tmp",
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        std::fs::write(&tmp, &json)?;
        if let Err(e) = std::fs::rename(&tmp, path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }

        tracing::debug!(path = %path.display(), size = json.len(), "Flushed type size snapshot");
        Ok(())
    }
}

/// Records in the snapshot at `path`, `None` when there is no file yet
fn read_snapshot(path: &Path) -> Result<Option<BTreeMap<String, ElementTypeData>>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_slice(&bytes)?))
}
