// ── In-process state store ──
//
// Lock-free concurrent storage keyed by path, with an optional JSON
// snapshot file for persistence across restarts and a version channel
// for consumers that want to react to changes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::Value;
use tokio::sync::{Mutex, watch};
use tracing::{debug, trace};

use super::object::{ObjectMeta, StoreObject};
use super::{StateStore, StoreError, is_under};

/// A `DashMap`-backed [`StateStore`].
///
/// `ensure_object` goes through the map's entry API, so concurrent
/// creators of one path are serialized on its shard and exactly one wins.
pub struct MemoryStore {
    objects: DashMap<String, StoreObject>,
    /// Snapshot file written by `flush`; `None` keeps everything in memory.
    snapshot_path: Option<PathBuf>,
    /// Bumped on every mutation.
    version: watch::Sender<u64>,
    /// Held for the whole write-then-rename of a snapshot.
    flush_lock: Mutex<()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        Self {
            objects: DashMap::new(),
            snapshot_path: None,
            version,
            flush_lock: Mutex::new(()),
        }
    }

    /// Open a store persisted at `path`, loading the previous snapshot if present.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let mut store = Self::new();

        match tokio::fs::read(&path).await {
            Ok(raw) => {
                let entries: BTreeMap<String, StoreObject> = serde_json::from_slice(&raw)?;
                debug!(path = %path.display(), objects = entries.len(), "loaded store snapshot");
                for (key, object) in entries {
                    store.objects.insert(key, object);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no store snapshot yet");
            }
            Err(e) => return Err(e.into()),
        }

        store.snapshot_path = Some(path);
        Ok(store)
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    /// All objects in path order.
    pub fn entries(&self) -> BTreeMap<String, StoreObject> {
        self.objects
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect()
    }

    /// Current value of `path`, if the object exists and has been written.
    pub fn value(&self, path: &str) -> Option<Value> {
        self.objects.get(path).and_then(|o| o.value.clone())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Subscribe to the mutation counter.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    fn bump_version(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_path(path: &str) -> Result<(), StoreError> {
    if path.is_empty() || path.split('.').any(str::is_empty) {
        return Err(StoreError::InvalidPath {
            path: path.to_owned(),
        });
    }
    Ok(())
}

impl StateStore for MemoryStore {
    async fn ensure_object(&self, path: &str, meta: ObjectMeta) -> Result<bool, StoreError> {
        validate_path(path)?;
        let created = match self.objects.entry(path.to_owned()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(StoreObject::new(meta));
                true
            }
        };
        if created {
            trace!(path, "object created");
            self.bump_version();
        }
        Ok(created)
    }

    async fn write_value(&self, path: &str, value: Value, ack: bool) -> Result<(), StoreError> {
        {
            let mut object = self
                .objects
                .get_mut(path)
                .ok_or_else(|| StoreError::NotFound {
                    path: path.to_owned(),
                })?;
            object.value = Some(value);
            object.ack = ack;
            object.updated_at = Some(Utc::now());
        }
        self.bump_version();
        Ok(())
    }

    async fn delete_subtree(&self, path: &str) -> Result<usize, StoreError> {
        let before = self.objects.len();
        self.objects.retain(|key, _| !is_under(key, path));
        let removed = before.saturating_sub(self.objects.len());
        if removed > 0 {
            debug!(path, removed, "subtree deleted");
            self.bump_version();
        }
        Ok(removed)
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut paths: Vec<String> = self
            .objects
            .iter()
            .filter(|r| is_under(r.key(), prefix))
            .map(|r| r.key().clone())
            .collect();
        paths.sort();
        Ok(paths)
    }

    async fn read_object(&self, path: &str) -> Result<Option<StoreObject>, StoreError> {
        Ok(self.objects.get(path).map(|r| r.value().clone()))
    }

    async fn flush(&self) -> Result<(), StoreError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        // Entries are read under the lock so the last flush to finish
        // always writes the newest state.
        let _guard = self.flush_lock.lock().await;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let raw = serde_json::to_vec_pretty(&self.entries())?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, raw).await?;
        tokio::fs::rename(&tmp, path).await?;
        debug!(path = %path.display(), objects = self.objects.len(), "store flushed");
        Ok(())
    }
}
