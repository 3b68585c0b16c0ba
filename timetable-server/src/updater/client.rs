//! HTTP download of the feed archive.

use std::path::Path;
use std::time::Duration;

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::info;

use super::error::UpdateError;

/// Largest archive accepted (500 MB).
const DEFAULT_MAX_DOWNLOAD_BYTES: u64 = 500 * 1024 * 1024;

/// Configuration for the feed download client.
#[derive(Debug, Clone)]
pub struct FeedClientConfig {
    /// URL of the zipped GTFS feed
    pub url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Downloads larger than this are aborted
    pub max_download_bytes: u64,
}

impl FeedClientConfig {
    /// Create a new config for the given feed URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_secs: 600,
            max_download_bytes: DEFAULT_MAX_DOWNLOAD_BYTES,
        }
    }

    /// Set a custom size limit.
    pub fn with_max_download_bytes(mut self, bytes: u64) -> Self {
        self.max_download_bytes = bytes;
        self
    }
}

/// Client that fetches the feed archive.
#[derive(Debug, Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    config: FeedClientConfig,
}

impl FeedClient {
    /// Create a new feed client.
    pub fn new(config: FeedClientConfig) -> Result<Self, UpdateError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    /// The feed URL.
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Stream the archive to `dest`, returning the number of bytes written.
    ///
    /// A partial file is removed if the download fails midway.
    pub async fn download(&self, dest: &Path) -> Result<u64, UpdateError> {
        let response = self.http.get(&self.config.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UpdateError::Status {
                status: status.as_u16(),
            });
        }

        let limit = self.config.max_download_bytes;
        if response.content_length().is_some_and(|len| len > limit) {
            return Err(UpdateError::TooLarge { limit });
        }

        let io_err = |source| UpdateError::Io {
            path: dest.to_path_buf(),
            source,
        };
        let mut file = tokio::fs::File::create(dest).await.map_err(io_err)?;

        let result = async {
            let mut total: u64 = 0;
            let mut stream = response.bytes_stream();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                total += chunk.len() as u64;
                if total > limit {
                    return Err(UpdateError::TooLarge { limit });
                }
                file.write_all(&chunk).await.map_err(io_err)?;
            }
            file.flush().await.map_err(io_err)?;
            Ok::<u64, UpdateError>(total)
        }
        .await;

        match result {
            Ok(total) => {
                info!(bytes = total, url = %self.config.url, "Downloaded feed archive");
                Ok(total)
            }
            Err(e) => {
                drop(file);
                let _ = tokio::fs::remove_file(dest).await;
                Err(e)
            }
        }
    }
}
