use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use track_promo::config::Config;
use track_promo::fetch::HttpFetcher;
use track_promo::generator::{ClipRequest, Generator};
use track_promo::init;
use track_promo::publish::S3Publisher;

/// Render a promo clip for one track and publish it.
#[derive(Parser, Debug)]
#[command(name = "track-promo", version, about)]
struct Args {
    /// Artist name
    #[arg(long)]
    artist: String,

    /// Track name
    #[arg(long)]
    track: String,

    /// Use a local still image instead of the remote album art
    #[arg(long)]
    image: Option<PathBuf>,

    /// Use a local audio file instead of the remote snippet
    #[arg(long)]
    audio: Option<PathBuf>,

    /// Resolution label to tag the output with
    #[arg(long)]
    label: Option<String>,

    /// Skip blurb/hashtag captions
    #[arg(long)]
    no_captions: bool,

    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let cfg = Config::load_or_default(args.config.as_deref())
        .await
        .context("Failed to load configuration")?;
    init::ensure_directories(&cfg).await?;

    if !init::check_ffmpeg(&cfg.ffmpeg_bin).await {
        tracing::warn!("{} not found in PATH. Please install FFmpeg.", cfg.ffmpeg_bin);
    }

    let publisher = S3Publisher::from_config(&cfg);
    let generator = Generator::new(cfg, HttpFetcher::new()?, publisher);

    let request = ClipRequest {
        artist: args.artist,
        track: args.track,
        image: args.image,
        audio: args.audio,
        label: args.label,
        captions: !args.no_captions,
    };
    let report = generator
        .run_clip(&request)
        .await
        .with_context(|| format!("Generation failed for {} - {}", request.artist, request.track))?;

    if !report.all_uploaded() {
        for kept in report.kept_files() {
            eprintln!("Upload failed; rendered file kept at {}", kept.display());
        }
        std::process::exit(1);
    }
    Ok(())
}
