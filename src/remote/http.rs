// reqwest-backed fetcher for the remote repository

use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Response};
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};
use crate::remote::Fetch;

/// User-Agent string for all HTTP requests
const USER_AGENT: &str = concat!("maven-exploder/", env!("CARGO_PKG_VERSION"));

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a fetcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Send a GET and turn non-2xx statuses into [`Error::Http`].
    async fn get(&self, url: &str) -> Result<Response> {
        debug!("--> GET {}", url);
        let started = Instant::now();

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| transport(url, source))?;

        let status = response.status();
        debug!(
            "<-- {} {} ({}ms)",
            status.as_u16(),
            url,
            started.elapsed().as_millis()
        );

        if !status.is_success() {
            return Err(Error::Http {
                url: url.to_string(),
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        Ok(response)
    }
}

fn transport(url: &str, source: reqwest::Error) -> Error {
    Error::Transport {
        url: url.to_string(),
        source,
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.get(url).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|source| transport(url, source))?;
        Ok(bytes.to_vec())
    }

    async fn fetch_string(&self, url: &str) -> Result<String> {
        let response = self.get(url).await?;
        response.text().await.map_err(|source| transport(url, source))
    }

    /// Stream the body to disk chunk by chunk instead of buffering the whole archive.
    async fn download_to(&self, url: &str, target: &Path) -> Result<u64> {
        let mut response = self.get(url).await?;
        let mut file = tokio::fs::File::create(target)
            .await
            .map_err(|e| Error::io(target, e))?;

        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|source| transport(url, source))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| Error::io(target, e))?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| Error::io(target, e))?;

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_host_is_remote_error() {
        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
        let err = fetcher
            .fetch_string("http://127.0.0.1:1/master-index.xml")
            .await
            .unwrap_err();
        assert!(err.is_remote(), "{:?}", err);
    }
}
