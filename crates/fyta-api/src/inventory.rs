// Inventory endpoint
//
// `GET /api/user-plant` returns every garden and plant on the account in a
// single document.

use secrecy::SecretString;
use tracing::debug;

use crate::client::FytaClient;
use crate::error::Error;
use crate::models::Inventory;

impl FytaClient {
    /// Fetch the full garden/plant graph with a bearer token.
    pub async fn fetch_inventory(&self, token: &SecretString) -> Result<Inventory, Error> {
        let url = self.api_url("user-plant")?;
        let resp = self.get_authorized(url, token).await?;
        let inventory: Inventory = Self::parse_json(resp).await?;

        debug!(
            gardens = inventory.gardens.len(),
            plants = inventory.plants.len(),
            "inventory fetched"
        );
        Ok(inventory)
    }
}
