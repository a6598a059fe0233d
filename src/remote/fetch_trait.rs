// Trait definition for the remote repository transport

use std::path::Path;

use async_trait::async_trait;

use crate::error::{Error, Result};

/// GET-by-URL access to the remote repository.
///
/// Non-2xx responses fail with [`Error::Http`]; responses that never arrive
/// fail with [`Error::Transport`].
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetch the full response body.
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>>;

    /// Fetch a text document such as an index or a POM.
    async fn fetch_string(&self, url: &str) -> Result<String> {
        let bytes = self.fetch_bytes(url).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Store the response body at `target`, replacing any existing file.
    /// Returns the number of bytes written.
    async fn download_to(&self, url: &str, target: &Path) -> Result<u64> {
        let bytes = self.fetch_bytes(url).await?;
        tokio::fs::write(target, &bytes)
            .await
            .map_err(|e| Error::io(target, e))?;
        Ok(bytes.len() as u64)
    }
}
