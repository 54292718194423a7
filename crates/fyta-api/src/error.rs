use thiserror::Error;

/// Top-level error type for the `fyta-api` crate.
///
/// Covers every failure mode of the three FYTA endpoints: login,
/// inventory fetch, and asset download. `fyta-core` classifies these into
/// hard and soft cycle failures.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The login endpoint rejected the email/password pair (HTTP 401).
    #[error("Invalid credentials (HTTP 401)")]
    InvalidCredentials,

    /// The login endpoint does not know the email address (HTTP 404).
    #[error("Unknown account (HTTP 404)")]
    UnknownAccount,

    /// HTTP 200 from the login endpoint, but no `access_token` in the body.
    #[error("Login response does not contain an access token")]
    MissingToken,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── API ─────────────────────────────────────────────────────────
    /// Any non-success status not covered by a dedicated variant.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if retrying with the same credentials is pointless.
    pub fn is_fatal_auth(&self) -> bool {
        matches!(self, Self::InvalidCredentials)
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// The HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::InvalidCredentials => Some(401),
            Self::UnknownAccount => Some(404),
            Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Trim a response body for inclusion in an error message.
pub(crate) fn body_preview(body: &str) -> String {
    body.chars().take(200).collect()
}
