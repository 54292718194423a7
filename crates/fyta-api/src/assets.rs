// Binary asset downloads (plant photos and thumbnails).

use bytes::Bytes;
use secrecy::SecretString;
use tracing::debug;

use crate::client::FytaClient;
use crate::error::Error;

impl FytaClient {
    /// Download an image referenced by a plant record.
    ///
    /// `reference` is the raw field value: an absolute URL or a path relative
    /// to the API base. The whole body is buffered.
    pub async fn download_asset(&self, reference: &str, token: &SecretString) -> Result<Bytes, Error> {
        let url = self.resolve_url(reference)?;
        let resp = self.get_authorized(url, token).await?;
        let bytes = resp.bytes().await.map_err(Error::Transport)?;
        debug!(len = bytes.len(), "asset downloaded");
        Ok(bytes)
    }
}
