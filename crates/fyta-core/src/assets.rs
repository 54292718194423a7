// ── Asset cache ──
//
// Plant photos and thumbnails are downloaded once and kept on disk. The
// cache key derives from the plant id and the asset kind only, never from
// the URL, and the presence of the file is the whole index.

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use fyta_api::{FytaClient, Plant, RecordId};
use secrecy::SecretString;
use serde_json::Value;
use strum::{Display, EnumIter, IntoEnumIterator};
use thiserror::Error;
use tracing::{debug, info};

use crate::sanitize::sanitize;
use crate::schema::ValueType;
use crate::store::{ObjectMeta, StateStore, StoreError, join_path};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("asset cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("asset download failed: {0}")]
    Download(#[from] fyta_api::Error),

    #[error("invalid cache file name '{name}'")]
    InvalidName { name: String },

    #[error("recording cached asset failed: {0}")]
    Store(#[from] StoreError),
}

// ── File cache contract ──────────────────────────────────────────────

/// Flat directory of cached files addressed by file name.
pub trait FileCache: Send + Sync + 'static {
    fn exists(&self, name: &str) -> impl Future<Output = Result<bool, CacheError>> + Send;

    /// Store `bytes` under `name`. A reader never observes a partial file.
    fn write(&self, name: &str, bytes: Bytes) -> impl Future<Output = Result<(), CacheError>> + Send;

    /// Names of all cached files, sorted.
    fn list(&self) -> impl Future<Output = Result<Vec<String>, CacheError>> + Send;

    /// Remove `name`. Returns `false` if it was not cached.
    fn delete(&self, name: &str) -> impl Future<Output = Result<bool, CacheError>> + Send;

    /// Path of `name` as recorded in the store.
    fn relative_path(&self, name: &str) -> String;
}

/// [`FileCache`] on a local directory: `<base_dir>/<subdir>/<name>`.
#[derive(Debug, Clone)]
pub struct FsCache {
    root: PathBuf,
    subdir: String,
}

impl FsCache {
    pub fn new(base_dir: impl AsRef<Path>, subdir: impl Into<String>) -> Self {
        let subdir = subdir.into();
        Self {
            root: base_dir.as_ref().join(&subdir),
            subdir,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file(&self, name: &str) -> Result<PathBuf, CacheError> {
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\'])
            && !name.ends_with(PART_SUFFIX);
        if valid {
            Ok(self.root.join(name))
        } else {
            Err(CacheError::InvalidName {
                name: name.to_owned(),
            })
        }
    }
}

const PART_SUFFIX: &str = ".part";

impl FileCache for FsCache {
    async fn exists(&self, name: &str) -> Result<bool, CacheError> {
        let path = self.file(name)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    async fn write(&self, name: &str, bytes: Bytes) -> Result<(), CacheError> {
        let path = self.file(name)?;
        tokio::fs::create_dir_all(&self.root).await?;

        let tmp = self.root.join(format!("{name}{PART_SUFFIX}"));
        let written = async {
            tokio::fs::write(&tmp, &bytes).await?;
            tokio::fs::rename(&tmp, &path).await
        }
        .await;
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>, CacheError> {
        let mut dir = match tokio::fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    async fn delete(&self, name: &str) -> Result<bool, CacheError> {
        let path = self.file(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn relative_path(&self, name: &str) -> String {
        format!("{}/{name}", self.subdir)
    }
}

// ── Asset kinds ──────────────────────────────────────────────────────

/// The two image-bearing plant fields that get cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum AssetKind {
    Thumb,
    Origin,
}

impl AssetKind {
    /// Source field on the plant record.
    pub fn property(self) -> &'static str {
        match self {
            Self::Thumb => "thumb_path",
            Self::Origin => "origin_path",
        }
    }

    /// State that records the cached file's path.
    pub fn local_property(self) -> String {
        format!("{}_local", self.property())
    }

    /// `<kind>_<plantId>.jpg`.
    pub fn cache_key(self, plant_id: &RecordId) -> String {
        format!("{self}_{}.jpg", sanitize(&plant_id.to_string()))
    }

    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }
}

/// What `ensure_cached` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Already on disk; no network call made.
    Hit(String),
    Downloaded(String),
    /// The plant does not reference this asset.
    Skipped,
}

// ── AssetCache ───────────────────────────────────────────────────────

/// Downloads referenced images into a [`FileCache`] and records where
/// they landed.
pub struct AssetCache<C> {
    client: FytaClient,
    files: Arc<C>,
}

impl<C> Clone for AssetCache<C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            files: Arc::clone(&self.files),
        }
    }
}

impl<C: FileCache> AssetCache<C> {
    pub fn new(client: FytaClient, files: Arc<C>) -> Self {
        Self { client, files }
    }

    pub fn files(&self) -> &Arc<C> {
        &self.files
    }

    /// Make sure one asset of `plant` is on disk.
    ///
    /// On a hit or a successful download the `<property>_local` state under
    /// `plant_path` is set to the cached file's relative path. When the
    /// plant no longer references the asset, a previously cached file is
    /// removed.
    pub async fn ensure_cached<S: StateStore>(
        &self,
        store: &S,
        plant: &Plant,
        plant_path: &str,
        kind: AssetKind,
        token: &SecretString,
    ) -> Result<CacheOutcome, CacheError> {
        let Some(plant_id) = &plant.id else {
            debug!(plant = plant_path, "plant has no id, asset not cacheable");
            return Ok(CacheOutcome::Skipped);
        };
        let key = kind.cache_key(plant_id);

        let reference = plant
            .fields
            .get(kind.property())
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty());
        let Some(reference) = reference else {
            if self.files.delete(&key).await? {
                info!(plant = plant_path, file = %key, "plant no longer references asset, removed cached file");
            }
            clear_local(store, plant_path, kind).await?;
            return Ok(CacheOutcome::Skipped);
        };

        let relative = self.files.relative_path(&key);
        if self.files.exists(&key).await? {
            record_local(store, plant_path, kind, &relative).await?;
            debug!(plant = plant_path, file = %key, "asset cache hit");
            return Ok(CacheOutcome::Hit(relative));
        }

        let bytes = self.client.download_asset(reference, token).await?;
        self.files.write(&key, bytes).await?;
        record_local(store, plant_path, kind, &relative).await?;
        debug!(plant = plant_path, file = %key, "asset cached");
        Ok(CacheOutcome::Downloaded(relative))
    }

    /// Delete every cached file. Returns how many were removed.
    pub async fn clear(&self) -> Result<usize, CacheError> {
        let mut removed = 0;
        for name in self.files.list().await? {
            if self.files.delete(&name).await? {
                removed += 1;
            }
        }
        debug!(removed, "asset cache cleared");
        Ok(removed)
    }
}

async fn record_local<S: StateStore>(
    store: &S,
    plant_path: &str,
    kind: AssetKind,
    relative: &str,
) -> Result<(), StoreError> {
    let name = kind.local_property();
    let path = join_path(plant_path, &name);
    store
        .ensure_object(&path, ObjectMeta::state(name, ValueType::String, "url"))
        .await?;
    store.write_value(&path, Value::from(relative), true).await
}

/// Null out a previously recorded `<property>_local` entry.
async fn clear_local<S: StateStore>(
    store: &S,
    plant_path: &str,
    kind: AssetKind,
) -> Result<(), StoreError> {
    let path = join_path(plant_path, &kind.local_property());
    if store.read_object(&path).await?.is_some() {
        store.write_value(&path, Value::Null, true).await?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use url::Url;

    use super::*;
    use crate::store::MemoryStore;

    fn offline_client() -> FytaClient {
        // Nothing listens here; any request would fail the test.
        let base = Url::parse("http://127.0.0.1:9").unwrap();
        FytaClient::new(base, &fyta_api::TransportConfig::default()).unwrap()
    }

    fn plant(value: serde_json::Value) -> Plant {
        serde_json::from_value(value).unwrap()
    }

    fn token() -> SecretString {
        SecretString::from("tok".to_string())
    }

    #[test]
    fn cache_key_ignores_url() {
        assert_eq!(AssetKind::Thumb.cache_key(&RecordId::Number(42)), "thumb_42.jpg");
        assert_eq!(AssetKind::Origin.cache_key(&RecordId::Number(42)), "origin_42.jpg");
        assert_eq!(AssetKind::Thumb.local_property(), "thumb_path_local");
        assert_eq!(AssetKind::all().count(), 2);
    }

    #[tokio::test]
    async fn fs_cache_write_list_delete() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FsCache::new(dir.path(), "images");

        assert!(cache.list().await.unwrap().is_empty());
        assert!(!cache.exists("thumb_1.jpg").await.unwrap());

        cache.write("thumb_1.jpg", Bytes::from_static(b"jpeg")).await.unwrap();
        cache.write("origin_1.jpg", Bytes::from_static(b"jpeg")).await.unwrap();

        assert!(cache.exists("thumb_1.jpg").await.unwrap());
        assert_eq!(cache.list().await.unwrap(), ["origin_1.jpg", "thumb_1.jpg"]);
        assert_eq!(std::fs::read(dir.path().join("images/thumb_1.jpg")).unwrap(), b"jpeg");
        assert_eq!(cache.relative_path("thumb_1.jpg"), "images/thumb_1.jpg");

        assert!(cache.delete("thumb_1.jpg").await.unwrap());
        assert!(!cache.delete("thumb_1.jpg").await.unwrap());
        assert_eq!(cache.list().await.unwrap(), ["origin_1.jpg"]);
    }

    #[tokio::test]
    async fn fs_cache_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FsCache::new(dir.path(), "images");
        assert!(matches!(
            cache.write("../evil.jpg", Bytes::new()).await,
            Err(CacheError::InvalidName { .. })
        ));
        assert!(matches!(
            cache.exists("").await,
            Err(CacheError::InvalidName { .. })
        ));
    }

    #[tokio::test]
    async fn hit_makes_no_network_call_and_records_path() {
        let dir = tempfile::tempdir().unwrap();
        let files = Arc::new(FsCache::new(dir.path(), "images"));
        files.write("thumb_7.jpg", Bytes::from_static(b"old")).await.unwrap();
        let cache = AssetCache::new(offline_client(), Arc::clone(&files));
        let store = MemoryStore::new();

        let p = plant(json!({ "id": 7, "thumb_path": "https://cdn.example/new-url.jpg" }));
        let outcome = cache
            .ensure_cached(&store, &p, "G.Fern", AssetKind::Thumb, &token())
            .await
            .unwrap();

        assert_eq!(outcome, CacheOutcome::Hit("images/thumb_7.jpg".into()));
        assert_eq!(store.value("G.Fern.thumb_path_local"), Some(json!("images/thumb_7.jpg")));
    }

    #[tokio::test]
    async fn missing_reference_removes_stale_file() {
        let dir = tempfile::tempdir().unwrap();
        let files = Arc::new(FsCache::new(dir.path(), "images"));
        files.write("origin_7.jpg", Bytes::from_static(b"old")).await.unwrap();
        let cache = AssetCache::new(offline_client(), Arc::clone(&files));
        let store = MemoryStore::new();

        let p = plant(json!({ "id": 7, "origin_path": "" }));
        let outcome = cache
            .ensure_cached(&store, &p, "G.Fern", AssetKind::Origin, &token())
            .await
            .unwrap();

        assert_eq!(outcome, CacheOutcome::Skipped);
        assert!(!files.exists("origin_7.jpg").await.unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn dropped_reference_clears_recorded_local_path() {
        let dir = tempfile::tempdir().unwrap();
        let files = Arc::new(FsCache::new(dir.path(), "images"));
        files.write("thumb_7.jpg", Bytes::from_static(b"old")).await.unwrap();
        let cache = AssetCache::new(offline_client(), Arc::clone(&files));
        let store = MemoryStore::new();

        let referenced = plant(json!({ "id": 7, "thumb_path": "/api/user-plant/img/7/thumb" }));
        cache
            .ensure_cached(&store, &referenced, "G.Fern", AssetKind::Thumb, &token())
            .await
            .unwrap();
        assert_eq!(store.value("G.Fern.thumb_path_local"), Some(json!("images/thumb_7.jpg")));

        let dropped = plant(json!({ "id": 7, "thumb_path": "" }));
        let outcome = cache
            .ensure_cached(&store, &dropped, "G.Fern", AssetKind::Thumb, &token())
            .await
            .unwrap();

        assert_eq!(outcome, CacheOutcome::Skipped);
        assert!(!files.exists("thumb_7.jpg").await.unwrap());
        assert_eq!(store.value("G.Fern.thumb_path_local"), Some(Value::Null));
    }

    #[tokio::test]
    async fn clear_removes_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let files = Arc::new(FsCache::new(dir.path(), "images"));
        for name in ["thumb_1.jpg", "origin_1.jpg", "thumb_2.jpg"] {
            files.write(name, Bytes::from_static(b"x")).await.unwrap();
        }
        let cache = AssetCache::new(offline_client(), Arc::clone(&files));

        assert_eq!(cache.clear().await.unwrap(), 3);
        assert!(files.list().await.unwrap().is_empty());
    }
}
