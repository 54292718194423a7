// ── Auth session ──
//
// Exchanges credentials for a bearer token once per cycle and classifies
// the failure modes. Connectivity is mirrored into `info.connection` on
// every attempt, successful or not.

use std::sync::Arc;

use fyta_api::{Credentials, FytaClient};
use secrecy::SecretString;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::schema::ValueType;
use crate::store::{ObjectMeta, StateStore, StoreError};

/// Store subtree for adapter-level status states.
pub const INFO_CHANNEL: &str = "info";
/// Whether the last login reached the API.
pub const CONNECTION_STATE: &str = "info.connection";
/// Timestamp of the last successful sync.
pub const LAST_SYNC_STATE: &str = "info.last_sync";

/// Result of a login attempt.
#[derive(Debug)]
pub enum LoginResult {
    Token(SecretString),
    Failed {
        /// Retrying with the same credentials is pointless.
        should_stop: bool,
    },
}

/// Create the `info` channel and its states if missing.
pub async fn ensure_info_objects<S: StateStore>(store: &S) -> Result<(), StoreError> {
    store
        .ensure_object(INFO_CHANNEL, ObjectMeta::folder("Information"))
        .await?;
    store
        .ensure_object(
            CONNECTION_STATE,
            ObjectMeta::state("Connected to FYTA", ValueType::Boolean, "indicator.connected"),
        )
        .await?;
    store
        .ensure_object(
            LAST_SYNC_STATE,
            ObjectMeta::state("Last successful sync", ValueType::String, "date"),
        )
        .await?;
    Ok(())
}

pub struct AuthSession<S> {
    client: FytaClient,
    store: Arc<S>,
}

impl<S: StateStore> AuthSession<S> {
    pub fn new(client: FytaClient, store: Arc<S>) -> Self {
        Self { client, store }
    }

    /// Log in and record connectivity.
    pub async fn login(&self, credentials: &Credentials) -> LoginResult {
        let result = match self.client.login(credentials).await {
            Ok(token) => {
                debug!("login succeeded");
                LoginResult::Token(token)
            }
            Err(e) if e.is_fatal_auth() => {
                error!("login rejected: email or password is wrong, giving up");
                LoginResult::Failed { should_stop: true }
            }
            Err(e) => {
                error!(error = %e, transient = e.is_transient(), "login failed, retrying next cycle");
                LoginResult::Failed { should_stop: false }
            }
        };

        let connected = matches!(result, LoginResult::Token(_));
        self.set_connected(connected).await;
        result
    }

    async fn set_connected(&self, connected: bool) {
        let written = async {
            ensure_info_objects(self.store.as_ref()).await?;
            self.store
                .write_value(CONNECTION_STATE, Value::Bool(connected), true)
                .await
        }
        .await;
        if let Err(e) = written {
            warn!(error = %e, "could not record connection state");
        }
    }
}
