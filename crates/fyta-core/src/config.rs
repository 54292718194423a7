// ── Runtime sync configuration ──
//
// Describes what to sync and how often. Carries credentials and tuning but
// never touches config files: `fyta-config` (or a test) builds a
// `SyncConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use fyta_api::{Credentials, TransportConfig};
use url::Url;

/// Default period between two fetch cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Consecutive soft failures after which the scheduler gives up.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

/// Display name of the container for plants without a garden.
pub const DEFAULT_VIRTUAL_GARDEN_NAME: &str = "Virtual Garden";

/// Subdirectory of the data dir holding cached images.
pub const ASSET_SUBDIR: &str = "images";

/// Store snapshot file inside the data dir.
pub const SNAPSHOT_FILE: &str = "states.json";

/// Everything one sync engine needs.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// API base URL (e.g., `https://web.fyta.de`).
    pub base_url: Url,
    pub credentials: Credentials,
    /// TLS mode and per-request timeout.
    pub transport: TransportConfig,
    pub poll_interval: Duration,
    pub failure_threshold: u32,
    /// Wipe the store (except `preserved_prefixes`) and the asset cache once at startup.
    pub clear_on_startup: bool,
    /// Store subtrees that survive `clear_on_startup`.
    pub preserved_prefixes: Vec<String>,
    pub virtual_garden_name: String,
    /// Root for the store snapshot and the asset cache.
    pub data_dir: PathBuf,
    /// Download plant images into the asset cache.
    pub cache_assets: bool,
}

impl SyncConfig {
    /// A config with defaults for everything but the endpoint, the
    /// credentials and the data directory.
    pub fn new(base_url: Url, credentials: Credentials, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_url,
            credentials,
            transport: TransportConfig::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            clear_on_startup: false,
            preserved_prefixes: vec![crate::session::INFO_CHANNEL.to_owned()],
            virtual_garden_name: DEFAULT_VIRTUAL_GARDEN_NAME.to_owned(),
            data_dir: data_dir.into(),
            cache_assets: true,
        }
    }

    /// Where the asset cache lives.
    pub fn asset_dir(&self) -> PathBuf {
        self.data_dir.join(ASSET_SUBDIR)
    }

    /// Where the store snapshot lives.
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_FILE)
    }
}
