// ── Fetch cycle ──
//
// One cycle is login, inventory fetch, then a fan-out of detached
// per-garden, per-plant and per-asset tasks onto a `TaskTracker`. The
// cycle result only reflects login and fetch; entity-level failures are
// logged where they happen.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use fyta_api::{Credentials, FytaClient, Inventory};
use secrecy::SecretString;
use serde_json::Value;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::assets::{AssetCache, AssetKind, CacheOutcome, FileCache, FsCache};
use crate::config::{ASSET_SUBDIR, SyncConfig};
use crate::error::CoreError;
use crate::fetcher::DataFetcher;
use crate::session::{self, AuthSession, LAST_SYNC_STATE, LoginResult};
use crate::store::{StateStore, clear_store};
use crate::sync::{GardenIndex, StateSync};

/// Ternary result of one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Data fetched and handed to the sync tasks.
    Success,
    /// Login or fetch failed in a way worth retrying.
    SoftFailure,
    /// Login was definitively rejected.
    HardFailure,
}

impl CycleOutcome {
    pub fn should_stop(self) -> bool {
        matches!(self, Self::HardFailure)
    }
}

/// What the scheduler drives.
pub trait CycleRunner: Send + Sync {
    /// One-shot startup work. An error halts before the first cycle.
    fn initialize(&self) -> impl Future<Output = Result<(), CoreError>> + Send;

    fn run_cycle(&self) -> impl Future<Output = CycleOutcome> + Send;

    /// Detached tasks still running from earlier cycles.
    fn in_flight(&self) -> usize {
        0
    }

    /// Called once after the scheduler halts.
    fn shutdown(&self) -> impl Future<Output = ()> + Send {
        async {}
    }
}

/// The production [`CycleRunner`]: talks to the FYTA API and writes to a
/// [`StateStore`].
pub struct FetchCycle<S, C = FsCache> {
    store: Arc<S>,
    credentials: Credentials,
    session: AuthSession<S>,
    fetcher: DataFetcher,
    sync: StateSync<S>,
    assets: Option<AssetCache<C>>,
    clear_on_startup: bool,
    preserved_prefixes: Vec<String>,
    tracker: TaskTracker,
}

impl<S: StateStore> FetchCycle<S, FsCache> {
    /// Build the HTTP client and the file cache from `config`.
    pub fn from_config(config: &SyncConfig, store: Arc<S>) -> Result<Self, CoreError> {
        let client = FytaClient::new(config.base_url.clone(), &config.transport)?;
        let files = config
            .cache_assets
            .then(|| Arc::new(FsCache::new(&config.data_dir, ASSET_SUBDIR)));
        Ok(Self::new(client, store, files, config))
    }
}

impl<S: StateStore, C: FileCache> FetchCycle<S, C> {
    pub fn new(client: FytaClient, store: Arc<S>, files: Option<Arc<C>>, config: &SyncConfig) -> Self {
        Self {
            session: AuthSession::new(client.clone(), Arc::clone(&store)),
            fetcher: DataFetcher::new(client.clone()),
            sync: StateSync::new(Arc::clone(&store), &config.virtual_garden_name),
            assets: files.map(|files| AssetCache::new(client, files)),
            store,
            credentials: config.credentials.clone(),
            clear_on_startup: config.clear_on_startup,
            preserved_prefixes: config.preserved_prefixes.clone(),
            tracker: TaskTracker::new(),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Authenticate, fetch and dispatch the sync tasks.
    ///
    /// Returns as soon as the tasks are spawned; use [`wait_idle`](Self::wait_idle)
    /// to wait for them.
    pub async fn load_data(&self) -> CycleOutcome {
        let token = match self.session.login(&self.credentials).await {
            LoginResult::Token(token) => token,
            LoginResult::Failed { should_stop: true } => return CycleOutcome::HardFailure,
            LoginResult::Failed { should_stop: false } => return CycleOutcome::SoftFailure,
        };

        let Some(inventory) = self.fetcher.fetch_inventory(&token).await else {
            return CycleOutcome::SoftFailure;
        };

        self.dispatch(inventory, &token);

        if let Err(e) = self
            .store
            .write_value(LAST_SYNC_STATE, Value::from(Utc::now().to_rfc3339()), true)
            .await
        {
            warn!(error = %e, "could not record last sync time");
        }
        CycleOutcome::Success
    }

    /// Spawn one task per garden and per plant. Plant tasks spawn one more
    /// task per cacheable asset once the plant node exists.
    fn dispatch(&self, inventory: Inventory, token: &SecretString) {
        let index = GardenIndex::new(&inventory.gardens);
        debug!(
            gardens = inventory.gardens.len(),
            plants = inventory.plants.len(),
            "dispatching sync tasks"
        );

        for garden in inventory.gardens {
            let sync = self.sync.clone();
            self.tracker.spawn(async move {
                if let Err(e) = sync.sync_garden(&garden).await {
                    error!(garden = %garden.name, error = %e, "garden sync failed");
                }
            });
        }

        for plant in inventory.plants {
            let placement = index.resolve(&plant);
            let sync = self.sync.clone();
            let assets = self.assets.clone();
            let tracker = self.tracker.clone();
            let token = token.clone();

            self.tracker.spawn(async move {
                let node = match sync.sync_plant(&plant, placement).await {
                    Ok(Some(node)) => node,
                    Ok(None) => return,
                    Err(e) => {
                        error!(plant = %plant.nickname, error = %e, "plant sync failed");
                        return;
                    }
                };
                let Some(assets) = assets else { return };

                let plant = Arc::new(plant);
                for kind in AssetKind::all() {
                    let assets = assets.clone();
                    let store = Arc::clone(sync.store());
                    let plant = Arc::clone(&plant);
                    let path = node.path.clone();
                    let token = token.clone();
                    tracker.spawn(async move {
                        match assets
                            .ensure_cached(store.as_ref(), &plant, &path, kind, &token)
                            .await
                        {
                            Ok(CacheOutcome::Downloaded(file)) => {
                                debug!(plant = %path, %file, "asset downloaded");
                            }
                            Ok(_) => {}
                            Err(e) => {
                                error!(plant = %path, asset = %kind, error = %e, "asset caching failed");
                            }
                        }
                    });
                }
            });
        }
    }

    /// Wait until every detached task of earlier cycles has finished.
    pub async fn wait_idle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}

impl<S: StateStore, C: FileCache> CycleRunner for FetchCycle<S, C> {
    async fn initialize(&self) -> Result<(), CoreError> {
        if self.clear_on_startup {
            let removed = clear_store(self.store.as_ref(), &self.preserved_prefixes).await?;
            let files = match &self.assets {
                Some(assets) => assets.clear().await?,
                None => 0,
            };
            info!(
                objects = removed,
                files,
                preserved = ?self.preserved_prefixes,
                "cleared previous state on startup"
            );
        }

        session::ensure_info_objects(self.store.as_ref()).await?;

        if !self.credentials.is_complete() {
            return Err(CoreError::MissingCredentials);
        }
        Ok(())
    }

    async fn run_cycle(&self) -> CycleOutcome {
        self.load_data().await
    }

    fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    async fn shutdown(&self) {
        self.wait_idle().await;
        if let Err(e) = self.store.flush().await {
            error!(error = %e, "flushing state store failed");
        }
    }
}
