// ── Core error types ──
//
// Domain errors from fyta-core. Consumers never see raw HTTP status codes
// or reqwest errors; the `From<fyta_api::Error>` impl translates them.

use thiserror::Error;

use crate::assets::CacheError;
use crate::store::StoreError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Sink errors ──────────────────────────────────────────────────
    #[error("State store error: {0}")]
    Store(#[from] StoreError),

    #[error("Asset cache error: {0}")]
    Cache(#[from] CacheError),

    // ── Configuration errors ─────────────────────────────────────────
    #[error("No FYTA credentials configured (email and password are required)")]
    MissingCredentials,

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<fyta_api::Error> for CoreError {
    fn from(err: fyta_api::Error) -> Self {
        match err {
            fyta_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid URL: {e}"),
            },
            fyta_api::Error::Tls(message) => CoreError::Config {
                message: format!("TLS setup failed: {message}"),
            },
            fyta_api::Error::Transport(e) => CoreError::Internal(e.to_string()),
            fyta_api::Error::Http { status, body } => CoreError::Api {
                message: if body.is_empty() {
                    format!("HTTP {status}")
                } else {
                    format!("HTTP {status}: {body}")
                },
                status: Some(status),
            },
            other @ (fyta_api::Error::InvalidCredentials
            | fyta_api::Error::UnknownAccount
            | fyta_api::Error::MissingToken
            | fyta_api::Error::Deserialization { .. }) => CoreError::Api {
                status: other.status(),
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_setup_errors_are_config_errors() {
        let err = CoreError::from(fyta_api::Error::Tls("bad pem".into()));
        match err {
            CoreError::Config { message } => assert_eq!(message, "TLS setup failed: bad pem"),
            other => panic!("expected Config, got {other:?}"),
        }
    }

    #[test]
    fn http_error_keeps_status() {
        let err = CoreError::from(fyta_api::Error::Http {
            status: 502,
            body: String::new(),
        });
        match err {
            CoreError::Api { message, status } => {
                assert_eq!(status, Some(502));
                assert_eq!(message, "HTTP 502");
            }
            other => panic!("expected Api, got {other:?}"),
        }
    }
}
