// ── Target state store ──
//
// The hierarchical key-value tree the sync mirrors into. Paths are
// dot-delimited (`garden.plant.sensor.status`). Every write is a
// last-write-wins upsert keyed by path, so concurrent writers never
// corrupt structure.

mod memory;
mod object;

use std::future::Future;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

pub use memory::MemoryStore;
pub use object::{ObjectKind, ObjectMeta, StoreObject};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid object path '{path}'")]
    InvalidPath { path: String },

    #[error("object '{path}' does not exist")]
    NotFound { path: String },

    #[error("store persistence failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store snapshot is corrupt: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// The create/read/write contract consumed from the host store.
///
/// `ensure_object` must be atomic per path: when several tasks race to
/// create the same path exactly one of them observes `true`.
pub trait StateStore: Send + Sync + 'static {
    /// Create `path` with `meta` unless it exists. Returns `true` if created.
    /// Existing metadata is never touched.
    fn ensure_object(
        &self,
        path: &str,
        meta: ObjectMeta,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Overwrite the value of an existing object.
    fn write_value(
        &self,
        path: &str,
        value: Value,
        ack: bool,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Delete `path` and everything below it. Returns the number of removed objects.
    fn delete_subtree(&self, path: &str) -> impl Future<Output = Result<usize, StoreError>> + Send;

    /// All object paths equal to or below `prefix`, sorted. An empty prefix lists everything.
    fn list_objects(
        &self,
        prefix: &str,
    ) -> impl Future<Output = Result<Vec<String>, StoreError>> + Send;

    fn read_object(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<Option<StoreObject>, StoreError>> + Send;

    /// Persist pending state. Stores without a durable backend do nothing.
    fn flush(&self) -> impl Future<Output = Result<(), StoreError>> + Send {
        async { Ok(()) }
    }
}

/// Join a parent path and a child segment.
pub fn join_path(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_owned()
    } else {
        format!("{parent}.{child}")
    }
}

/// `path` equals `prefix` or lies below it.
pub fn is_under(path: &str, prefix: &str) -> bool {
    prefix.is_empty()
        || path == prefix
        || (path.len() > prefix.len()
            && path.starts_with(prefix)
            && path.as_bytes()[prefix.len()] == b'.')
}

/// Delete every object that is not inside one of the `preserve` subtrees.
///
/// Ancestors of a preserved subtree are kept as well, since deleting them
/// would take the preserved objects along.
pub async fn clear_store<S: StateStore>(store: &S, preserve: &[String]) -> Result<usize, StoreError> {
    let mut removed = 0;
    for path in store.list_objects("").await? {
        let protected = preserve
            .iter()
            .any(|p| is_under(&path, p) || is_under(p, &path));
        if protected {
            continue;
        }
        removed += store.delete_subtree(&path).await?;
    }
    debug!(removed, "cleared store");
    Ok(removed)
}
