// FYTA API HTTP client
//
// Wraps `reqwest::Client` with URL construction and status handling.
// Endpoint methods (login, inventory, assets) are implemented as inherent
// methods in separate files to keep this module focused on transport
// mechanics.

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::{Error, body_preview};
use crate::transport::TransportConfig;

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://web.fyta.de";

/// Raw HTTP client for the FYTA cloud API.
///
/// Holds no session state: the bearer token is passed into every
/// authenticated call and owned by the caller's fetch cycle.
#[derive(Debug, Clone)]
pub struct FytaClient {
    http: reqwest::Client,
    base_url: Url,
}

impl FytaClient {
    /// Create a new client from a `TransportConfig`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for an API path: `{base}/api/{path}`.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let full = format!("{base}/api/{path}");
        Ok(Url::parse(&full)?)
    }

    /// Resolve an asset reference from a plant record.
    ///
    /// Absolute URLs are used as-is; anything else is joined onto the base URL.
    pub fn resolve_url(&self, raw: &str) -> Result<Url, Error> {
        match Url::parse(raw) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => Ok(self.base_url.join(raw)?),
            Err(e) => Err(Error::InvalidUrl(e)),
        }
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send an authenticated GET and return the successful response.
    pub(crate) async fn get_authorized(
        &self,
        url: Url,
        token: &SecretString,
    ) -> Result<reqwest::Response, Error> {
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        debug!(status = status.as_u16(), "response received");

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                body: body_preview(&body),
            });
        }

        Ok(resp)
    }

    /// Read a response body and decode it as JSON.
    pub(crate) async fn parse_json<T: DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let body = resp.text().await.map_err(Error::Transport)?;
        serde_json::from_str(&body).map_err(|e| {
            let preview = body_preview(&body);
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> FytaClient {
        FytaClient::with_client(reqwest::Client::new(), Url::parse(base).unwrap())
    }

    #[test]
    fn api_url_tolerates_trailing_slash() {
        let c = client("https://web.fyta.de/");
        assert_eq!(
            c.api_url("auth/login").unwrap().as_str(),
            "https://web.fyta.de/api/auth/login"
        );
    }

    #[test]
    fn resolve_url_keeps_absolute_urls() {
        let c = client("https://web.fyta.de");
        let url = c.resolve_url("https://cdn.example.com/a.jpg").unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/a.jpg");
    }

    #[test]
    fn resolve_url_joins_relative_paths() {
        let c = client("https://web.fyta.de");
        let url = c.resolve_url("/api/user-plant/img/7/thumb").unwrap();
        assert_eq!(url.as_str(), "https://web.fyta.de/api/user-plant/img/7/thumb");
    }
}
