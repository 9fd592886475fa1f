use crate::config::Config;
use crate::{logi, logok, logw};
use async_trait::async_trait;
use reqwest::Client;
use rusty_s3::{Bucket, Credentials, S3Action, UrlStyle};
use std::path::Path;
use std::time::Duration;
use tokio::fs;

const PRESIGN_TTL: Duration = Duration::from_secs(3600);

/// Uploads a finished artifact. Failures are reported, never retried.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn upload(&self, local_file: &Path, bucket: &str, key: &str) -> bool;
}

/// `<artist>/<track>/<artist> - <track>.mp4`, with ` (<label>)` before the
/// extension when a resolution label is given.
pub fn object_key(artist: &str, track: &str, label: Option<&str>) -> String {
    match label {
        Some(label) => format!("{artist}/{track}/{artist} - {track} ({label}).mp4"),
        None => format!("{artist}/{track}/{artist} - {track}.mp4"),
    }
}

/// Presigned PUT against an S3-compatible endpoint.
pub struct S3Publisher {
    client: Client,
    endpoint: String,
    region: String,
    credentials: Option<Credentials>,
}

impl S3Publisher {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            client: Client::new(),
            endpoint: cfg.s3_endpoint.clone(),
            region: cfg.region.clone(),
            credentials: Credentials::from_env(),
        }
    }

    async fn put(&self, local_file: &Path, bucket: &str, key: &str) -> Result<(), String> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| "AWS_ACCESS_KEY_ID / AWS_SECRET_ACCESS_KEY not set".to_string())?;
        let endpoint: url::Url = self.endpoint.parse().map_err(|e| format!("bad endpoint: {e}"))?;
        let bucket = Bucket::new(
            endpoint,
            UrlStyle::VirtualHost,
            bucket.to_string(),
            self.region.clone(),
        )
        .map_err(|e| e.to_string())?;
        let url = bucket.put_object(Some(credentials), key).sign(PRESIGN_TTL);

        let body = fs::read(local_file).await.map_err(|e| e.to_string())?;
        let resp = self
            .client
            .put(url)
            .body(body)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !resp.status().is_success() {
            return Err(format!("HTTP {}", resp.status().as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl Publisher for S3Publisher {
    async fn upload(&self, local_file: &Path, bucket: &str, key: &str) -> bool {
        logi(format!("Uploading {} to s3://{}/{}", local_file.display(), bucket, key));
        match self.put(local_file, bucket, key).await {
            Ok(()) => {
                logok(format!("Upload confirmed: s3://{}/{}", bucket, key));
                true
            }
            Err(err) => {
                logw(format!("Upload failed: {}", err));
                false
            }
        }
    }
}
