use crate::config::EncoderParams;
use crate::error::{PromoError, Result};
use crate::logi;
use std::path::{Path, PathBuf};
use tokio::process::Command;

async fn run_cmd(program: &str, args: &[String]) -> Result<()> {
    let status = Command::new(program)
        .args(args)
        .status()
        .await
        .map_err(|source| PromoError::EncoderSpawn {
            program: program.to_string(),
            source,
        })?;

    if !status.success() {
        return Err(PromoError::EncoderFailed {
            status: status.to_string(),
            command: format!("{} {}", program, args.join(" ")),
        });
    }

    Ok(())
}

/// One still-image + audio encode.
#[derive(Debug, Clone)]
pub struct EncodeJob {
    pub image: PathBuf,
    pub audio: PathBuf,
    /// `-vf` expression; omitted from the command when `None`.
    pub overlay: Option<String>,
    pub output: PathBuf,
}

impl EncodeJob {
    /// Arguments after the program name.
    pub fn args(&self, params: &EncoderParams) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-loop".to_string(),
            "1".to_string(),
            "-i".to_string(),
            self.image.display().to_string(),
            "-i".to_string(),
            self.audio.display().to_string(),
        ];

        if let Some(filter) = &self.overlay {
            args.push("-vf".to_string());
            args.push(filter.clone());
        }

        args.extend([
            "-c:v".to_string(),
            params.video_codec.clone(),
            "-tune".to_string(),
            params.tune.clone(),
            "-c:a".to_string(),
            params.audio_codec.clone(),
            "-b:a".to_string(),
            params.audio_bitrate.clone(),
            "-shortest".to_string(),
            "-pix_fmt".to_string(),
            params.pixel_format.clone(),
            self.output.display().to_string(),
        ]);
        args
    }
}

pub async fn ffmpeg_encode_still(ffmpeg_bin: &str, job: &EncodeJob, params: &EncoderParams) -> Result<()> {
    let args = job.args(params);
    logi(format!("Running ffmpeg: {} {}", ffmpeg_bin, args.join(" ")));
    run_cmd(ffmpeg_bin, &args).await?;
    logi(format!("Video saved to: {}", job.output.display()));
    Ok(())
}

/// Frame height used to place caption lines.
pub fn frame_height(image: &Path) -> Result<u32> {
    image::image_dimensions(image)
        .map(|(_, h)| h)
        .map_err(|source| PromoError::Image {
            path: image.to_path_buf(),
            source,
        })
}
