//! Sync engine between `fyta-api` and a hierarchical state store.
//!
//! - **[`PollingScheduler`]** drives a [`CycleRunner`] on a fixed interval
//!   and halts after a hard failure or too many soft failures in a row.
//!
//! - **[`FetchCycle`]** is the production runner: [`AuthSession`] login,
//!   [`DataFetcher`] inventory fetch, then detached per-entity tasks that run
//!   [`StateSync`] and [`AssetCache`].
//!
//! - **[`StateStore`]** is the sink contract; [`MemoryStore`] implements it
//!   with a `DashMap` and an optional JSON snapshot.
//!
//! - **[`schema`]** holds the static field tables the normalizer walks.

pub mod assets;
pub mod config;
pub mod cycle;
pub mod error;
pub mod fetcher;
pub mod sanitize;
pub mod scheduler;
pub mod schema;
pub mod session;
pub mod store;
pub mod sync;

// ── Primary re-exports ──────────────────────────────────────────────
pub use assets::{AssetCache, AssetKind, CacheError, CacheOutcome, FileCache, FsCache};
pub use config::SyncConfig;
pub use cycle::{CycleOutcome, CycleRunner, FetchCycle};
pub use error::CoreError;
pub use fetcher::DataFetcher;
pub use sanitize::sanitize;
pub use scheduler::{HaltReason, PollingScheduler, SchedulerState};
pub use schema::{FieldDefault, SchemaEntry, ValueType};
pub use session::{AuthSession, LoginResult};
pub use store::{MemoryStore, ObjectKind, ObjectMeta, StateStore, StoreError, StoreObject};
pub use sync::{GardenIndex, Placement, StateSync, SyncReport, sync_fields};
