//! Centers track artwork on a platform template.

use crate::error::{PromoError, Result};
use crate::logok;
use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbaImage};
use std::path::{Path, PathBuf};

/// Where the artwork landed on the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Largest size with the same aspect ratio that fits in `max_w` x `max_h`.
/// Never scales up.
pub fn fit_within(width: u32, height: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    if width <= max_w && height <= max_h {
        return (width, height);
    }

    let scale = f64::min(
        f64::from(max_w) / f64::from(width),
        f64::from(max_h) / f64::from(height),
    );
    let w = (f64::from(width) * scale).round() as u32;
    let h = (f64::from(height) * scale).round() as u32;
    (w.clamp(1, max_w), h.clamp(1, max_h))
}

pub fn center_offset(outer: u32, inner: u32) -> u32 {
    outer.saturating_sub(inner) / 2
}

fn open_rgba(path: &Path) -> Result<RgbaImage> {
    if !path.exists() {
        return Err(PromoError::MissingFile(path.to_path_buf()));
    }
    image::open(path)
        .map(|img| img.to_rgba8())
        .map_err(|source| PromoError::Image {
            path: path.to_path_buf(),
            source,
        })
}

/// Scales `artwork` into `template` leaving `margin` pixels on every side,
/// centers it and writes the flattened PNG to `output`.
///
/// Both inputs are decoded before anything is written.
pub fn overlay_artwork_on_template(
    template_path: &Path,
    artwork_path: &Path,
    output_path: &Path,
    margin: u32,
) -> Result<Placement> {
    let mut template = open_rgba(template_path)?;
    let artwork = open_rgba(artwork_path)?;

    let (tw, th) = template.dimensions();
    let (max_w, max_h) = match (tw.checked_sub(2 * margin), th.checked_sub(2 * margin)) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => {
            return Err(PromoError::Config(format!(
                "margin {} leaves no room on {}x{} template {}",
                margin,
                tw,
                th,
                template_path.display()
            )));
        }
    };

    let (aw, ah) = artwork.dimensions();
    let (w, h) = fit_within(aw, ah, max_w, max_h);
    let artwork = if (w, h) == (aw, ah) {
        artwork
    } else {
        imageops::resize(&artwork, w, h, FilterType::Lanczos3)
    };

    let placement = Placement {
        x: center_offset(tw, w),
        y: center_offset(th, h),
        width: w,
        height: h,
    };
    imageops::overlay(&mut template, &artwork, i64::from(placement.x), i64::from(placement.y));

    template
        .save_with_format(output_path, ImageFormat::Png)
        .map_err(|source| PromoError::Image {
            path: output_path.to_path_buf(),
            source,
        })?;

    logok(format!("Saved overlay image: {}", output_path.display()));
    Ok(placement)
}

/// Runs the composite on the blocking pool.
pub async fn composite(
    template_path: PathBuf,
    artwork_path: PathBuf,
    output_path: PathBuf,
    margin: u32,
) -> Result<Placement> {
    tokio::task::spawn_blocking(move || {
        overlay_artwork_on_template(&template_path, &artwork_path, &output_path, margin)
    })
    .await
    .map_err(|e| PromoError::io("compositor task", std::io::Error::other(e)))?
}
