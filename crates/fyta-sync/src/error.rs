//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a stable exit code.

use miette::Diagnostic;
use thiserror::Error;

use fyta_config::ConfigError;
use fyta_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONFLICT: i32 = 6;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(fyta::auth_failed),
        help(
            "Verify the email and password of your FYTA account.\n\
             The password is read from FYTA_PASSWORD, account.password_env or account.password."
        )
    )]
    AuthFailed { message: String },

    #[error("No FYTA credentials configured")]
    #[diagnostic(
        code(fyta::no_credentials),
        help(
            "Create a config with: fyta-sync config init --email you@example.com\n\
             Then export FYTA_PASSWORD. Config file: {path}"
        )
    )]
    NoCredentials { path: String },

    // ── Sync ─────────────────────────────────────────────────────────
    #[error("Sync cycle failed")]
    #[diagnostic(
        code(fyta::cycle_failed),
        help("The FYTA API could not be queried. Re-run with -v for details.")
    )]
    CycleFailed,

    #[error("Daemon stopped: {reason}")]
    #[diagnostic(code(fyta::halted))]
    Halted { reason: String, code: i32 },

    #[error("State store error: {0}")]
    #[diagnostic(code(fyta::store))]
    Store(String),

    // ── Configuration ────────────────────────────────────────────────
    #[error("Invalid {field}: {reason}")]
    #[diagnostic(code(fyta::validation))]
    Validation { field: String, reason: String },

    #[error("Config file already exists at {path}")]
    #[diagnostic(
        code(fyta::config_exists),
        help("Pass --force to overwrite it.")
    )]
    ConfigExists { path: String },

    #[error(transparent)]
    #[diagnostic(code(fyta::config))]
    Config(ConfigError),

    // ── Output ───────────────────────────────────────────────────────
    #[error("Could not render output: {0}")]
    #[diagnostic(code(fyta::render))]
    Render(String),

    #[error(transparent)]
    #[diagnostic(code(fyta::io))]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    #[diagnostic(code(fyta::internal))]
    Internal(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::Validation { .. } | Self::Config(_) => exit_code::USAGE,
            Self::ConfigExists { .. } => exit_code::CONFLICT,
            Self::Halted { code, .. } => *code,
            Self::CycleFailed
            | Self::Store(_)
            | Self::Render(_)
            | Self::Io(_)
            | Self::Internal(_) => exit_code::GENERAL,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::MissingCredentials => Self::NoCredentials {
                path: fyta_config::config_path().display().to_string(),
            },
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Store(e) => Self::Store(e.to_string()),
            CoreError::Cache(e) => Self::Internal(e.to_string()),
            CoreError::Api { message, .. } | CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

impl From<fyta_core::StoreError> for CliError {
    fn from(err: fyta_core::StoreError) -> Self {
        Self::Store(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_exit_codes() {
        let cases: [(CoreError, i32); 3] = [
            (
                CoreError::Config { message: "TLS setup failed: bad pem".into() },
                exit_code::USAGE,
            ),
            (CoreError::MissingCredentials, exit_code::AUTH),
            (CoreError::Internal("boom".into()), exit_code::GENERAL),
        ];
        for (core, code) in cases {
            assert_eq!(CliError::from(core).exit_code(), code);
        }
    }

    #[test]
    fn config_validation_is_a_usage_error() {
        let err = CliError::from(ConfigError::Validation {
            field: "sync.poll_interval".into(),
            reason: "must be at least one second".into(),
        });
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }

    #[test]
    fn halted_carries_its_own_code() {
        let err = CliError::Halted { reason: "startup failed".into(), code: 1 };
        assert_eq!(err.exit_code(), exit_code::GENERAL);
        assert_ne!(exit_code::SUCCESS, err.exit_code());
    }
}
