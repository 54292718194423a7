// Inventory retrieval for one cycle.

use fyta_api::{FytaClient, Inventory};
use secrecy::SecretString;
use tracing::{debug, error};

/// Pulls the garden/plant graph with a token from [`AuthSession`](crate::session::AuthSession).
#[derive(Debug, Clone)]
pub struct DataFetcher {
    client: FytaClient,
}

impl DataFetcher {
    pub fn new(client: FytaClient) -> Self {
        Self { client }
    }

    /// `None` on any failure; the error is logged here and only counts
    /// against the cycle.
    pub async fn fetch_inventory(&self, token: &SecretString) -> Option<Inventory> {
        match self.client.fetch_inventory(token).await {
            Ok(inventory) => {
                debug!(
                    gardens = inventory.gardens.len(),
                    plants = inventory.plants.len(),
                    "inventory received"
                );
                Some(inventory)
            }
            Err(e) => {
                error!(
                    error = %e,
                    status = ?e.status(),
                    transient = e.is_transient(),
                    "fetching plant inventory failed"
                );
                None
            }
        }
    }
}
