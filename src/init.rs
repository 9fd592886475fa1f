use crate::config::Config;
use crate::error::{PromoError, Result};
use crate::logi;
use std::path::Path;
use tokio::fs;

pub async fn ensure_directories(cfg: &Config) -> Result<()> {
    for dir in [&cfg.generated_dir, &cfg.work_dir] {
        if !Path::new(dir).exists() {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| PromoError::io(format!("Failed to create {}", dir.display()), e))?;
            logi(format!("Created directory: {}", dir.display()));
        }
    }
    Ok(())
}

pub async fn check_ffmpeg(ffmpeg_bin: &str) -> bool {
    match tokio::process::Command::new(ffmpeg_bin)
        .arg("-version")
        .output()
        .await
    {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}
