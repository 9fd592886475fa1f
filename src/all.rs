use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use track_promo::config::Config;
use track_promo::fetch::HttpFetcher;
use track_promo::generator::Generator;
use track_promo::init;
use track_promo::publish::S3Publisher;

/// Render the track's artwork onto every platform template and publish each clip.
#[derive(Parser, Debug)]
#[command(name = "track-promo-all", version, about)]
struct Args {
    /// Artist name
    #[arg(long)]
    artist: String,

    /// Track name
    #[arg(long)]
    track: String,

    /// Only render these labels (landscape, square, portrait, reel)
    #[arg(long = "only")]
    only: Vec<String>,

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

    let report = generator
        .run_all(&args.artist, &args.track, &args.only, !args.no_captions)
        .await
        .with_context(|| format!("Generation failed for {} - {}", args.artist, args.track))?;

    tracing::info!("Rendered {} variants", report.clips.len());
    if !report.all_uploaded() {
        for kept in report.kept_files() {
            eprintln!("Upload failed; rendered file kept at {}", kept.display());
        }
        std::process::exit(1);
    }
    Ok(())
}
