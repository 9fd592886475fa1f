use crate::error::{PromoError, Result};
use crate::logi;
use async_trait::async_trait;
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Retrieves a remote asset into a local file.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<PathBuf>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder().build().map_err(PromoError::HttpClient)?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<PathBuf> {
        logi(format!("Downloading {}", url));
        let fetch_err = |source| PromoError::Fetch {
            url: url.to_string(),
            source,
        };

        let mut resp = self.client.get(url).send().await.map_err(fetch_err)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(PromoError::FetchStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PromoError::io(format!("Failed to create dir {}", parent.display()), e))?;
        }
        let mut file = fs::File::create(dest)
            .await
            .map_err(|e| PromoError::io(format!("Failed to create {}", dest.display()), e))?;

        while let Some(chunk) = resp.chunk().await.map_err(fetch_err)? {
            file.write_all(&chunk)
                .await
                .map_err(|e| PromoError::io(format!("Failed to write {}", dest.display()), e))?;
        }
        file.flush()
            .await
            .map_err(|e| PromoError::io(format!("Failed to write {}", dest.display()), e))?;

        logi(format!("Saved to {}", dest.display()));
        Ok(dest.to_path_buf())
    }
}
