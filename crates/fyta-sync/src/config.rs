//! Config resolution for the binary: `--config` / `FYTA_CONFIG`,
//! `--data-dir`, and per-command overrides on top of the TOML file.

use std::path::PathBuf;

use fyta_config::Config;
use fyta_core::SyncConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Command-line overrides applied after the file and environment.
#[derive(Debug, Default)]
pub struct Overrides {
    pub interval: Option<u64>,
    pub clear_on_startup: bool,
}

/// The config file in effect: `--config`, `FYTA_CONFIG`, or the platform default.
pub fn active_config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .or_else(|| std::env::var_os("FYTA_CONFIG").map(PathBuf::from))
        .unwrap_or_else(fyta_config::config_path)
}

/// Load the file (missing is fine) and apply `--data-dir`.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = fyta_config::load_config_from(&active_config_path(global))?;
    if let Some(dir) = &global.data_dir {
        cfg.data_dir = Some(dir.clone());
    }
    Ok(cfg)
}

/// Build the runtime config for `run` and `once`.
pub fn sync_config(global: &GlobalOpts, overrides: &Overrides) -> Result<SyncConfig, CliError> {
    let mut cfg = load(global)?;
    if let Some(secs) = overrides.interval {
        cfg.sync.poll_interval = secs;
    }
    if overrides.clear_on_startup {
        cfg.sync.clear_on_startup = true;
    }

    let sync = cfg.to_sync_config()?;
    tracing::debug!(
        base_url = %sync.base_url,
        data_dir = %sync.data_dir.display(),
        interval = ?sync.poll_interval,
        "resolved configuration"
    );
    Ok(sync)
}
