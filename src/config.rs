use crate::error::{PromoError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

pub const DEFAULT_CONFIG_FILE: &str = "track-promo.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL the per-track assets live under.
    pub asset_base_url: String,
    pub bucket: String,
    pub region: String,
    pub s3_endpoint: String,
    pub templates_dir: PathBuf,
    pub data_dir: PathBuf,
    pub generated_dir: PathBuf,
    /// Where downloads and rendered videos are written.
    pub work_dir: PathBuf,
    pub ffmpeg_bin: String,
    pub margin: u32,
    pub overlay: OverlayStyle,
    pub encoder: EncoderParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    pub font_file: String,
    pub font_size: u32,
    pub line_spacing: u32,
    /// First line's y as a fraction of frame height.
    pub start_fraction: f64,
    pub font_color: String,
    pub box_color: String,
    pub box_padding: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderParams {
    pub video_codec: String,
    pub tune: String,
    pub audio_codec: String,
    pub audio_bitrate: String,
    pub pixel_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            asset_base_url: "https://socialdbndata.s3.us-east-1.amazonaws.com".to_string(),
            bucket: "socialdbndata".to_string(),
            region: "us-east-1".to_string(),
            s3_endpoint: "https://s3.us-east-1.amazonaws.com".to_string(),
            templates_dir: PathBuf::from("templates"),
            data_dir: PathBuf::from("data"),
            generated_dir: PathBuf::from("generated"),
            work_dir: PathBuf::from("."),
            ffmpeg_bin: "ffmpeg".to_string(),
            margin: 100,
            overlay: OverlayStyle::default(),
            encoder: EncoderParams::default(),
        }
    }
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            font_file: "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf".to_string(),
            font_size: 48,
            line_spacing: 70,
            start_fraction: 0.6,
            font_color: "white".to_string(),
            box_color: "black@0.5".to_string(),
            box_padding: 12,
        }
    }
}

impl Default for EncoderParams {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            tune: "stillimage".to_string(),
            audio_codec: "aac".to_string(),
            audio_bitrate: "192k".to_string(),
            pixel_format: "yuv420p".to_string(),
        }
    }
}

impl Config {
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| PromoError::io(format!("Failed to read config: {}", path.display()), e))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| PromoError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `explicit` when given, otherwise the default config file if it
    /// exists, otherwise built-in defaults.
    pub async fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path).await;
        }
        if fs::metadata(DEFAULT_CONFIG_FILE).await.is_ok() {
            return Self::load(DEFAULT_CONFIG_FILE).await;
        }
        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<()> {
        if self.bucket.is_empty() {
            return Err(PromoError::Config("bucket missing".to_string()));
        }
        if self.asset_base_url.is_empty() {
            return Err(PromoError::Config("asset_base_url missing".to_string()));
        }
        if self.ffmpeg_bin.is_empty() {
            return Err(PromoError::Config("ffmpeg_bin missing".to_string()));
        }
        if !(0.0..=1.0).contains(&self.overlay.start_fraction) {
            return Err(PromoError::Config(format!(
                "overlay.start_fraction {} outside 0..=1",
                self.overlay.start_fraction
            )));
        }
        Ok(())
    }
}
