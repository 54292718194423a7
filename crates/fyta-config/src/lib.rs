//! Configuration for the fyta-sync daemon.
//!
//! TOML file plus `FYTA_` environment overrides (loaded through figment),
//! password resolution (env + plaintext), and translation to
//! `fyta_core::SyncConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use fyta_api::{Credentials, TlsMode, TransportConfig};
use fyta_core::SyncConfig;
use fyta_core::config::{DEFAULT_FAILURE_THRESHOLD, DEFAULT_POLL_INTERVAL, DEFAULT_VIRTUAL_GARDEN_NAME};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable that overrides every other password source.
pub const PASSWORD_ENV: &str = "FYTA_PASSWORD";
/// Environment variable consulted when no email is configured.
pub const EMAIL_ENV: &str = "FYTA_EMAIL";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Where the store snapshot and cached images go. Defaults to the
    /// platform data directory.
    pub data_dir: Option<PathBuf>,

    #[serde(default)]
    pub account: Account,

    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub sync: SyncSettings,
}

/// FYTA account credentials.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Account {
    pub email: Option<String>,

    /// Plaintext password (prefer `password_env` or `FYTA_PASSWORD`).
    pub password: Option<String>,

    /// Name of an environment variable holding the password.
    pub password_env: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    #[serde(default)]
    pub insecure: bool,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: default_timeout(),
            ca_cert: None,
            insecure: false,
        }
    }
}

fn default_base_url() -> String {
    fyta_api::client::DEFAULT_BASE_URL.into()
}
fn default_timeout() -> u64 {
    fyta_api::transport::DEFAULT_TIMEOUT.as_secs()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncSettings {
    /// Seconds between two fetch cycles.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    /// Consecutive failed cycles before the daemon stops.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Wipe synced states and cached images once at startup.
    #[serde(default)]
    pub clear_on_startup: bool,

    /// Store subtrees kept by `clear_on_startup`.
    #[serde(default = "default_preserved_prefixes")]
    pub preserved_prefixes: Vec<String>,

    #[serde(default = "default_virtual_garden_name")]
    pub virtual_garden_name: String,

    #[serde(default = "default_true")]
    pub cache_assets: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            failure_threshold: default_failure_threshold(),
            clear_on_startup: false,
            preserved_prefixes: default_preserved_prefixes(),
            virtual_garden_name: default_virtual_garden_name(),
            cache_assets: true,
        }
    }
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}
fn default_failure_threshold() -> u32 {
    DEFAULT_FAILURE_THRESHOLD
}
fn default_preserved_prefixes() -> Vec<String> {
    vec![fyta_core::session::INFO_CHANNEL.into()]
}
fn default_virtual_garden_name() -> String {
    DEFAULT_VIRTUAL_GARDEN_NAME.into()
}
fn default_true() -> bool {
    true
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("de", "fyta", "fyta-sync")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default root for the store snapshot and the asset cache.
pub fn default_data_dir() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(".local/share"),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

fn home_fallback(sub: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(sub);
    p.push("fyta-sync");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the Config from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the Config from `path` + environment. A missing file yields the
/// defaults.
///
/// Environment keys use `__` as the section separator, e.g.
/// `FYTA_SYNC__POLL_INTERVAL=600`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("FYTA_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to the canonical path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the password: `FYTA_PASSWORD`, then the variable named by
/// `password_env`, then the plaintext field.
pub fn resolve_password(account: &Account) -> Option<SecretString> {
    resolve_password_with(account, |name| std::env::var(name).ok())
}

/// [`resolve_password`] with a custom environment lookup.
pub fn resolve_password_with(
    account: &Account,
    env: impl Fn(&str) -> Option<String>,
) -> Option<SecretString> {
    let non_empty = |v: String| (!v.is_empty()).then_some(v);

    env(PASSWORD_ENV)
        .and_then(non_empty)
        .or_else(|| {
            account
                .password_env
                .as_deref()
                .and_then(&env)
                .and_then(non_empty)
        })
        .or_else(|| account.password.clone().and_then(non_empty))
        .map(SecretString::from)
}

/// Resolve email and password. Missing values come back empty; the
/// scheduler reports incomplete credentials as a halt.
pub fn resolve_credentials(account: &Account) -> Credentials {
    resolve_credentials_with(account, |name| std::env::var(name).ok())
}

pub fn resolve_credentials_with(
    account: &Account,
    env: impl Fn(&str) -> Option<String>,
) -> Credentials {
    let email = account
        .email
        .clone()
        .filter(|e| !e.trim().is_empty())
        .or_else(|| env(EMAIL_ENV))
        .unwrap_or_default();
    let password =
        resolve_password_with(account, &env).unwrap_or_else(|| SecretString::from(String::new()));
    Credentials::new(email, password)
}

// ── Translation ─────────────────────────────────────────────────────

impl Config {
    /// `data_dir`, or the platform data directory.
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }

    /// Validate and build the runtime config.
    pub fn to_sync_config(&self) -> Result<SyncConfig, ConfigError> {
        self.to_sync_config_with(resolve_credentials(&self.account))
    }

    /// [`to_sync_config`](Self::to_sync_config) with already-resolved credentials.
    pub fn to_sync_config_with(&self, credentials: Credentials) -> Result<SyncConfig, ConfigError> {
        let base_url: url::Url = self
            .api
            .base_url
            .parse()
            .map_err(|_| ConfigError::Validation {
                field: "api.base_url".into(),
                reason: format!("invalid URL: {}", self.api.base_url),
            })?;

        if self.sync.poll_interval == 0 {
            return Err(ConfigError::Validation {
                field: "sync.poll_interval".into(),
                reason: "must be at least one second".into(),
            });
        }
        if self.sync.failure_threshold == 0 {
            return Err(ConfigError::Validation {
                field: "sync.failure_threshold".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.api.timeout == 0 {
            return Err(ConfigError::Validation {
                field: "api.timeout".into(),
                reason: "must be at least one second".into(),
            });
        }
        if self.sync.virtual_garden_name.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "sync.virtual_garden_name".into(),
                reason: "must not be empty".into(),
            });
        }

        let tls = if self.api.insecure {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ref ca_path) = self.api.ca_cert {
            TlsMode::CustomCa(ca_path.clone())
        } else {
            TlsMode::System
        };

        let mut config = SyncConfig::new(base_url, credentials, self.resolved_data_dir());
        config.transport = TransportConfig {
            tls,
            timeout: Duration::from_secs(self.api.timeout),
        };
        config.poll_interval = Duration::from_secs(self.sync.poll_interval);
        config.failure_threshold = self.sync.failure_threshold;
        config.clear_on_startup = self.sync.clear_on_startup;
        config.preserved_prefixes.clone_from(&self.sync.preserved_prefixes);
        config.virtual_garden_name.clone_from(&self.sync.virtual_garden_name);
        config.cache_assets = self.sync.cache_assets;
        Ok(config)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use figment::Jail;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn account(password: Option<&str>, password_env: Option<&str>) -> Account {
        Account {
            email: Some("gardener@example.com".into()),
            password: password.map(Into::into),
            password_env: password_env.map(Into::into),
        }
    }

    #[test]
    fn password_chain_prefers_fyta_password() {
        let acc = account(Some("plain"), Some("MY_PW"));
        let env = env_of(&[("FYTA_PASSWORD", "from-env"), ("MY_PW", "named")]);
        let pw = resolve_password_with(&acc, env).unwrap();
        assert_eq!(pw.expose_secret(), "from-env");
    }

    #[test]
    fn password_chain_falls_back_to_named_env_then_plaintext() {
        let acc = account(Some("plain"), Some("MY_PW"));
        let pw = resolve_password_with(&acc, env_of(&[("MY_PW", "named")])).unwrap();
        assert_eq!(pw.expose_secret(), "named");

        let pw = resolve_password_with(&acc, env_of(&[])).unwrap();
        assert_eq!(pw.expose_secret(), "plain");

        assert!(resolve_password_with(&account(None, None), env_of(&[])).is_none());
    }

    #[test]
    fn empty_values_do_not_count() {
        let acc = account(Some(""), None);
        assert!(resolve_password_with(&acc, env_of(&[("FYTA_PASSWORD", "")])).is_none());
    }

    #[test]
    fn missing_credentials_resolve_to_incomplete() {
        let creds = resolve_credentials_with(&Account::default(), env_of(&[]));
        assert!(!creds.is_complete());

        let creds = resolve_credentials_with(
            &Account::default(),
            env_of(&[("FYTA_EMAIL", "a@b.c"), ("FYTA_PASSWORD", "pw")]),
        );
        assert!(creds.is_complete());
        assert_eq!(creds.email, "a@b.c");
    }

    #[test]
    fn defaults_translate_to_sync_config() {
        let cfg = Config {
            data_dir: Some("/tmp/fyta".into()),
            ..Config::default()
        };
        let sync = cfg
            .to_sync_config_with(Credentials::new("a@b.c", SecretString::from("pw".to_string())))
            .unwrap();

        assert_eq!(sync.base_url.as_str(), "https://web.fyta.de/");
        assert_eq!(sync.poll_interval, Duration::from_secs(1800));
        assert_eq!(sync.failure_threshold, 3);
        assert_eq!(sync.preserved_prefixes, ["info"]);
        assert_eq!(sync.virtual_garden_name, "Virtual Garden");
        assert_eq!(sync.transport.timeout, Duration::from_secs(10));
        assert_eq!(sync.transport.tls, TlsMode::System);
        assert_eq!(sync.data_dir, PathBuf::from("/tmp/fyta"));
        assert!(sync.cache_assets);
        assert!(!sync.clear_on_startup);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let creds = || Credentials::new("a@b.c", SecretString::from("pw".to_string()));

        let mut cfg = Config::default();
        cfg.api.base_url = "not a url".into();
        assert!(matches!(
            cfg.to_sync_config_with(creds()),
            Err(ConfigError::Validation { ref field, .. }) if field == "api.base_url"
        ));

        let mut cfg = Config::default();
        cfg.sync.failure_threshold = 0;
        assert!(matches!(
            cfg.to_sync_config_with(creds()),
            Err(ConfigError::Validation { ref field, .. }) if field == "sync.failure_threshold"
        ));

        let mut cfg = Config::default();
        cfg.sync.poll_interval = 0;
        assert!(cfg.to_sync_config_with(creds()).is_err());
    }

    #[test]
    fn insecure_wins_over_ca_cert() {
        let mut cfg = Config::default();
        cfg.api.insecure = true;
        cfg.api.ca_cert = Some("/etc/ca.pem".into());
        let sync = cfg
            .to_sync_config_with(Credentials::new("", SecretString::from(String::new())))
            .unwrap();
        assert_eq!(sync.transport.tls, TlsMode::DangerAcceptInvalid);
    }

    #[test]
    fn file_and_env_layers_merge() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                    [account]
                    email = "gardener@example.com"
                    password_env = "MY_FYTA_PW"

                    [sync]
                    poll_interval = 600
                    clear_on_startup = true
                "#,
            )?;
            jail.set_env("FYTA_SYNC__FAILURE_THRESHOLD", "5");

            let cfg = load_config_from(Path::new("config.toml")).map_err(|e| e.to_string())?;

            assert_eq!(cfg.account.email.as_deref(), Some("gardener@example.com"));
            assert_eq!(cfg.account.password_env.as_deref(), Some("MY_FYTA_PW"));
            assert_eq!(cfg.sync.poll_interval, 600);
            assert_eq!(cfg.sync.failure_threshold, 5);
            assert!(cfg.sync.clear_on_startup);
            assert_eq!(cfg.sync.preserved_prefixes, ["info"]);
            assert_eq!(cfg.api.base_url, "https://web.fyta.de");
            Ok(())
        });
    }

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|_jail| {
            let cfg = load_config_from(Path::new("absent.toml")).map_err(|e| e.to_string())?;
            assert_eq!(cfg.sync.poll_interval, 1800);
            assert!(cfg.account.email.is_none());
            Ok(())
        });
    }

    #[test]
    fn save_then_load_keeps_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        let mut cfg = Config::default();
        cfg.account.email = Some("gardener@example.com".into());
        cfg.sync.virtual_garden_name = "Ohne Garten".into();
        save_config_to(&cfg, &path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let loaded: Config = toml::from_str(&raw).unwrap();
        assert_eq!(loaded.account.email, cfg.account.email);
        assert_eq!(loaded.sync.virtual_garden_name, "Ohne Garten");
    }
}
