// FYTA authentication
//
// Email/password login that yields a bearer token. The token is not
// cached here: each fetch cycle logs in afresh and drops the token when
// it ends.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::client::FytaClient;
use crate::error::{Error, body_preview};

/// Account credentials. Neither field appears in `Debug` output.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: SecretString) -> Self {
        Self {
            email: email.into(),
            password,
        }
    }

    /// Both fields carry a non-blank value.
    pub fn is_complete(&self) -> bool {
        !self.email.trim().is_empty() && !self.password.expose_secret().is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &"[REDACTED]")
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Deserialize)]
struct LoginResponse {
    access_token: Option<String>,
}

impl FytaClient {
    /// Exchange credentials for a bearer token via `POST /api/auth/login`.
    ///
    /// Status mapping:
    /// - 200 with `access_token` -> the token
    /// - 200 without it -> [`Error::MissingToken`]
    /// - 401 -> [`Error::InvalidCredentials`]
    /// - 404 -> [`Error::UnknownAccount`]
    /// - anything else -> [`Error::Http`] or [`Error::Transport`]
    pub async fn login(&self, credentials: &Credentials) -> Result<SecretString, Error> {
        let url = self.api_url("auth/login")?;
        debug!("logging in at {}", url);

        let body = json!({
            "email": credentials.email,
            "password": credentials.password.expose_secret(),
        });

        let resp = self
            .http()
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        debug!(status = status.as_u16(), "login response received");

        match status {
            reqwest::StatusCode::UNAUTHORIZED => return Err(Error::InvalidCredentials),
            reqwest::StatusCode::NOT_FOUND => return Err(Error::UnknownAccount),
            reqwest::StatusCode::OK => {}
            other => {
                let body = resp.text().await.unwrap_or_default();
                return Err(Error::Http {
                    status: other.as_u16(),
                    body: body_preview(&body),
                });
            }
        }

        let parsed: LoginResponse = Self::parse_json(resp).await?;
        let token = parsed
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(Error::MissingToken)?;

        debug!("login successful");
        Ok(SecretString::from(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_credentials_are_incomplete() {
        let creds = Credentials::new("  ", SecretString::from("pw".to_string()));
        assert!(!creds.is_complete());
        let creds = Credentials::new("me@example.com", SecretString::from(String::new()));
        assert!(!creds.is_complete());
        let creds = Credentials::new("me@example.com", SecretString::from("pw".to_string()));
        assert!(creds.is_complete());
    }

    #[test]
    fn debug_output_redacts_both_fields() {
        let creds = Credentials::new("me@example.com", SecretString::from("hunter2".to_string()));
        let shown = format!("{creds:?}");
        assert!(!shown.contains("hunter2"));
        assert!(!shown.contains("me@example.com"));
    }
}
