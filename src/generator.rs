//! Sequences fetch, composite, overlay, encode and publish for one track.

use crate::assets::{AssetKind, AssetRef};
use crate::captions::CaptionSet;
use crate::compositor;
use crate::config::Config;
use crate::error::{PromoError, Result};
use crate::fetch::Fetcher;
use crate::ffmpeg::{self, EncodeJob};
use crate::overlay;
use crate::publish::{self, Publisher};
use crate::templates::{RESOLUTIONS, Template};
use crate::{logi, logok, logw};
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tokio::fs;

/// What to render for a single clip.
#[derive(Debug, Clone, Default)]
pub struct ClipRequest {
    pub artist: String,
    pub track: String,
    /// Local still image; fetched album art when `None`.
    pub image: Option<PathBuf>,
    /// Local audio; fetched snippet when `None`.
    pub audio: Option<PathBuf>,
    pub label: Option<String>,
    pub captions: bool,
}

/// Encoder job and destination key for one clip, before anything runs.
#[derive(Debug, Clone)]
pub struct ClipPlan {
    pub job: EncodeJob,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipReport {
    pub label: Option<String>,
    pub key: String,
    pub output: PathBuf,
    pub uploaded: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub clips: Vec<ClipReport>,
}

impl RunReport {
    pub fn all_uploaded(&self) -> bool {
        self.clips.iter().all(|c| c.uploaded)
    }

    /// Local files left behind by failed uploads.
    pub fn kept_files(&self) -> Vec<&Path> {
        self.clips
            .iter()
            .filter(|c| !c.uploaded)
            .map(|c| c.output.as_path())
            .collect()
    }
}

/// Local rendered file name: `<track>.mp4` or `<track>_<label>.mp4`.
pub fn output_file_name(track: &str, label: Option<&str>) -> String {
    match label {
        Some(label) => format!("{track}_{label}.mp4"),
        None => format!("{track}.mp4"),
    }
}

pub fn artwork_path(cfg: &Config, artist: &str, track: &str) -> PathBuf {
    cfg.data_dir.join(artist).join(track).join("artwork.png")
}

/// Deletes `path` when the returned guard drops, unless it is kept.
fn scratch(path: &Path) -> Result<TempPath> {
    TempPath::try_from_path(path)
        .map_err(|e| PromoError::io(format!("Failed to track {}", path.display()), e))
}

fn discard(guard: TempPath) {
    let path = guard.to_path_buf();
    match guard.close() {
        Ok(()) => logi(format!("Deleted temporary file: {}", path.display())),
        Err(err) => logw(format!("Could not delete {}: {}", path.display(), err)),
    }
}

/// A local input: either the operator's own file or a fetched one that is
/// removed when dropped.
enum Input {
    Provided(PathBuf),
    Fetched(TempPath),
}

impl Input {
    fn path(&self) -> &Path {
        match self {
            Input::Provided(p) => p.as_path(),
            Input::Fetched(t) => &**t,
        }
    }

    fn finish(self) {
        if let Input::Fetched(guard) = self {
            discard(guard);
        }
    }
}

pub struct Generator<F, P> {
    cfg: Config,
    fetcher: F,
    publisher: P,
}

impl<F: Fetcher, P: Publisher> Generator<F, P> {
    pub fn new(cfg: Config, fetcher: F, publisher: P) -> Self {
        Self {
            cfg,
            fetcher,
            publisher,
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    async fn fetch_asset(&self, artist: &str, track: &str, kind: AssetKind) -> Result<TempPath> {
        let asset = AssetRef::new(artist, track, kind);
        let guard = scratch(&asset.local_path(&self.cfg.work_dir))?;
        self.fetcher
            .fetch(&asset.url(&self.cfg.asset_base_url), &guard)
            .await?;
        Ok(guard)
    }

    async fn input(&self, provided: Option<&Path>, artist: &str, track: &str, kind: AssetKind) -> Result<Input> {
        match provided {
            Some(path) if path.exists() => Ok(Input::Provided(path.to_path_buf())),
            Some(path) => Err(PromoError::MissingFile(path.to_path_buf())),
            None => Ok(Input::Fetched(self.fetch_asset(artist, track, kind).await?)),
        }
    }

    async fn read_text_asset(&self, artist: &str, track: &str, kind: AssetKind) -> Result<String> {
        let guard = self.fetch_asset(artist, track, kind).await?;
        let text = fs::read_to_string(&guard)
            .await
            .map_err(|e| PromoError::io(format!("Failed to read {}", guard.display()), e))?;
        discard(guard);
        Ok(text)
    }

    /// Blurb lines plus the hashtags line, or nothing when disabled.
    pub async fn load_captions(&self, artist: &str, track: &str, enabled: bool) -> Result<CaptionSet> {
        if !enabled {
            return Ok(CaptionSet::default());
        }
        let blurb = self.read_text_asset(artist, track, AssetKind::Blurb).await?;
        let hashtags = self.read_text_asset(artist, track, AssetKind::Hashtags).await?;
        let captions = CaptionSet::from_texts(&blurb, &hashtags);
        logi(format!("Loaded {} caption lines", captions.len()));
        Ok(captions)
    }

    /// Builds the encoder job and upload key without running anything.
    pub fn plan_clip(
        &self,
        artist: &str,
        track: &str,
        image: &Path,
        audio: &Path,
        captions: &CaptionSet,
        label: Option<&str>,
    ) -> Result<ClipPlan> {
        let overlay = if captions.is_empty() {
            None
        } else {
            let height = ffmpeg::frame_height(image)?;
            overlay::build_filter(captions, height, &self.cfg.overlay)
        };

        Ok(ClipPlan {
            job: EncodeJob {
                image: image.to_path_buf(),
                audio: audio.to_path_buf(),
                overlay,
                output: self.cfg.work_dir.join(output_file_name(track, label)),
            },
            key: publish::object_key(artist, track, label),
        })
    }

    /// Encodes, uploads, and removes the rendered file once it is stored
    /// remotely. A failed upload keeps the file.
    async fn encode_and_publish(&self, plan: ClipPlan, label: Option<&str>) -> Result<ClipReport> {
        ffmpeg::ffmpeg_encode_still(&self.cfg.ffmpeg_bin, &plan.job, &self.cfg.encoder).await?;
        let output = scratch(&plan.job.output)?;

        let uploaded = self
            .publisher
            .upload(&output, &self.cfg.bucket, &plan.key)
            .await;

        let output_path = plan.job.output.clone();
        if uploaded {
            discard(output);
        } else {
            match output.keep() {
                Ok(path) => logw(format!("Upload failed; keeping {} for manual upload", path.display())),
                Err(err) => logw(format!("Could not keep {}: {}", output_path.display(), err)),
            }
        }

        Ok(ClipReport {
            label: label.map(str::to_string),
            key: plan.key,
            output: output_path,
            uploaded,
        })
    }

    /// Fetches any missing inputs, renders one clip and publishes it.
    pub async fn run_clip(&self, req: &ClipRequest) -> Result<RunReport> {
        let image = self
            .input(req.image.as_deref(), &req.artist, &req.track, AssetKind::AlbumArt)
            .await?;
        let audio = self
            .input(req.audio.as_deref(), &req.artist, &req.track, AssetKind::Snippet)
            .await?;
        let captions = self.load_captions(&req.artist, &req.track, req.captions).await?;

        let label = req.label.as_deref();
        let plan = self.plan_clip(&req.artist, &req.track, image.path(), audio.path(), &captions, label)?;
        let report = self.encode_and_publish(plan, label).await?;

        image.finish();
        audio.finish();

        Ok(RunReport {
            clips: vec![report],
        })
    }

    /// Renders the track's artwork onto every available template.
    ///
    /// `only` restricts the labels rendered; empty means all. Missing
    /// templates are skipped. Audio and captions are fetched once.
    pub async fn run_all(&self, artist: &str, track: &str, only: &[String], captions: bool) -> Result<RunReport> {
        let artwork = artwork_path(&self.cfg, artist, track);
        if !artwork.exists() {
            return Err(PromoError::MissingFile(artwork));
        }

        let targets: Vec<&Template> = RESOLUTIONS
            .iter()
            .filter(|t| only.is_empty() || only.iter().any(|l| l.eq_ignore_ascii_case(t.label)))
            .collect();
        if targets.is_empty() {
            return Err(PromoError::Config(format!("no template matches {:?}", only)));
        }

        let audio = self.fetch_asset(artist, track, AssetKind::Snippet).await?;
        let captions = self.load_captions(artist, track, captions).await?;

        let mut report = RunReport::default();
        for template in targets {
            let template_path = template.path(&self.cfg.templates_dir);
            if !template_path.exists() {
                logw(format!("Template not found: {}", template_path.display()));
                continue;
            }

            logi(format!("Overlaying artwork onto {} for {}", template.filename, template.label));
            let composite_path = self
                .cfg
                .generated_dir
                .join(format!("{}_{}_{}.png", artist, track, template.label));
            let composite = scratch(&composite_path)?;
            compositor::composite(
                template_path,
                artwork.clone(),
                composite_path,
                self.cfg.margin,
            )
            .await?;

            let plan = self.plan_clip(artist, track, &composite, &audio, &captions, Some(template.label))?;
            let clip = self.encode_and_publish(plan, Some(template.label)).await?;
            discard(composite);

            logok(format!("Finished {} variant", template.label));
            report.clips.push(clip);
        }

        discard(audio);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::{Rgba, RgbaImage};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned bodies keyed by URL suffix.
    struct FakeFetcher {
        bodies: HashMap<&'static str, Vec<u8>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        fn new() -> Self {
            let mut art = Vec::new();
            RgbaImage::from_pixel(64, 48, Rgba([255, 0, 0, 255]))
                .write_to(&mut std::io::Cursor::new(&mut art), image::ImageFormat::Png)
                .expect("png");

            let mut bodies = HashMap::new();
            bodies.insert("albumart.png", art);
            bodies.insert("snippet.wav", b"RIFF....WAVE".to_vec());
            bodies.insert("blurb.txt", b"Great new single\nout now!\n".to_vec());
            bodies.insert("hashtags.txt", b"#pop #new\n".to_vec());
            Self {
                bodies,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl Fetcher for FakeFetcher {
        async fn fetch(&self, url: &str, dest: &Path) -> Result<PathBuf> {
            self.calls.lock().expect("lock").push(url.to_string());
            let name = url.rsplit('/').next().unwrap_or_default();
            match self.bodies.get(name) {
                Some(body) => {
                    std::fs::write(dest, body).expect("write");
                    Ok(dest.to_path_buf())
                }
                None => Err(PromoError::FetchStatus {
                    url: url.to_string(),
                    status: 404,
                }),
            }
        }
    }

    struct FakePublisher {
        succeed: bool,
        keys: Mutex<Vec<String>>,
    }

    impl FakePublisher {
        fn new(succeed: bool) -> Self {
            Self {
                succeed,
                keys: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Publisher for FakePublisher {
        async fn upload(&self, _local_file: &Path, _bucket: &str, key: &str) -> bool {
            self.keys.lock().expect("lock").push(key.to_string());
            self.succeed
        }
    }

    /// Config rooted in `dir`; `true` stands in for ffmpeg.
    fn test_config(dir: &Path) -> Config {
        let cfg = Config {
            asset_base_url: "https://assets.example.com".to_string(),
            templates_dir: dir.join("templates"),
            data_dir: dir.join("data"),
            generated_dir: dir.join("generated"),
            work_dir: dir.join("work"),
            ffmpeg_bin: "true".to_string(),
            margin: 10,
            ..Config::default()
        };
        std::fs::create_dir_all(&cfg.generated_dir).expect("generated");
        std::fs::create_dir_all(&cfg.work_dir).expect("work");
        cfg
    }

    fn request(captions: bool) -> ClipRequest {
        ClipRequest {
            artist: "Jane".to_string(),
            track: "Song1".to_string(),
            captions,
            ..ClipRequest::default()
        }
    }

    fn work_files(cfg: &Config) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&cfg.work_dir)
            .expect("read_dir")
            .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn output_names() {
        assert_eq!(output_file_name("Song1", None), "Song1.mp4");
        assert_eq!(output_file_name("Song1", Some("reel")), "Song1_reel.mp4");
    }

    #[test]
    fn scratch_file_is_removed_on_drop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("Song1_snippet.wav");
        std::fs::write(&path, b"RIFF").expect("write");

        let guard = scratch(&path).expect("scratch");
        assert_eq!(&*guard, path.as_path());
        drop(guard);

        assert!(!path.exists());
    }

    #[test]
    fn kept_scratch_file_survives() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("Song1.mp4");
        std::fs::write(&path, b"mp4").expect("write");

        let kept = scratch(&path).expect("scratch").keep().expect("keep");

        assert_eq!(kept, path);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn end_to_end_plan_has_three_lines_and_one_filter() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = test_config(dir.path());
        let generator = Generator::new(cfg, FakeFetcher::new(), FakePublisher::new(true));

        let image = generator
            .fetch_asset("Jane", "Song1", AssetKind::AlbumArt)
            .await
            .expect("art");
        let captions = generator.load_captions("Jane", "Song1", true).await.expect("captions");
        assert_eq!(captions.lines(), ["Great new single", "out now!", "#pop #new"]);

        let plan = generator
            .plan_clip("Jane", "Song1", &image, Path::new("snippet.wav"), &captions, None)
            .expect("plan");
        let args = plan.job.args(&generator.config().encoder);

        assert_eq!(plan.key, "Jane/Song1/Jane - Song1.mp4");
        assert_eq!(args.iter().filter(|a| *a == "-i").count(), 2);
        assert!(args.contains(&image.display().to_string()));
        assert!(args.contains(&"snippet.wav".to_string()));
        assert_eq!(args.iter().filter(|a| *a == "-vf").count(), 1);
        let vf = plan.job.overlay.as_deref().expect("overlay");
        assert_eq!(vf.matches("drawtext=").count(), 3);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_upload_removes_everything() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = test_config(dir.path());
        std::fs::write(cfg.work_dir.join("Song1.mp4"), b"video").expect("output");
        let generator = Generator::new(cfg.clone(), FakeFetcher::new(), FakePublisher::new(true));

        let report = generator.run_clip(&request(true)).await.expect("run");

        assert!(report.all_uploaded());
        assert_eq!(report.clips[0].key, "Jane/Song1/Jane - Song1.mp4");
        assert!(!report.clips[0].output.exists());
        assert!(work_files(&cfg).is_empty());
        assert_eq!(generator.fetcher.calls().len(), 4);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failed_upload_keeps_rendered_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = test_config(dir.path());
        std::fs::write(cfg.work_dir.join("Song1.mp4"), b"video").expect("output");
        let generator = Generator::new(cfg.clone(), FakeFetcher::new(), FakePublisher::new(false));

        let report = generator.run_clip(&request(true)).await.expect("run");

        assert!(!report.all_uploaded());
        assert_eq!(report.kept_files(), [cfg.work_dir.join("Song1.mp4").as_path()]);
        assert!(report.clips[0].output.exists());
        assert_eq!(work_files(&cfg), ["Song1.mp4"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn no_captions_skips_text_fetches() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = test_config(dir.path());
        let generator = Generator::new(cfg, FakeFetcher::new(), FakePublisher::new(true));

        generator.run_clip(&request(false)).await.expect("run");

        let calls = generator.fetcher.calls();
        assert_eq!(
            calls,
            [
                "https://assets.example.com/Jane/Song1/albumart.png",
                "https://assets.example.com/Jane/Song1/snippet.wav"
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn provided_inputs_are_not_deleted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = test_config(dir.path());
        let image = dir.path().join("mine.png");
        let audio = dir.path().join("mine.wav");
        RgbaImage::new(10, 10).save(&image).expect("png");
        std::fs::write(&audio, b"wav").expect("wav");

        let generator = Generator::new(cfg, FakeFetcher::new(), FakePublisher::new(true));
        let req = ClipRequest {
            image: Some(image.clone()),
            audio: Some(audio.clone()),
            label: Some("square".to_string()),
            ..request(false)
        };
        let report = generator.run_clip(&req).await.expect("run");

        assert_eq!(report.clips[0].key, "Jane/Song1/Jane - Song1 (square).mp4");
        assert!(image.exists() && audio.exists());
        assert!(generator.fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_provided_image_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = test_config(dir.path());
        let generator = Generator::new(cfg, FakeFetcher::new(), FakePublisher::new(true));
        let req = ClipRequest {
            image: Some(dir.path().join("nope.png")),
            ..request(false)
        };

        let err = generator.run_clip(&req).await.unwrap_err();
        assert!(matches!(err, PromoError::MissingFile(_)));
    }

    #[tokio::test]
    async fn failed_fetch_leaves_no_partial_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = test_config(dir.path());
        let mut fetcher = FakeFetcher::new();
        fetcher.bodies.remove("hashtags.txt");
        let generator = Generator::new(cfg.clone(), fetcher, FakePublisher::new(true));

        let err = generator.run_clip(&request(true)).await.unwrap_err();
        assert!(matches!(err, PromoError::FetchStatus { status: 404, .. }));
        assert!(work_files(&cfg).is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn encoder_failure_aborts_the_run() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config {
            ffmpeg_bin: "false".to_string(),
            ..test_config(dir.path())
        };
        let publisher = FakePublisher::new(true);
        let generator = Generator::new(cfg, FakeFetcher::new(), publisher);

        let err = generator.run_clip(&request(false)).await.unwrap_err();
        assert!(matches!(err, PromoError::EncoderFailed { .. }));
        assert!(generator.publisher.keys.lock().expect("lock").is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn run_all_renders_available_templates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = test_config(dir.path());
        std::fs::create_dir_all(&cfg.templates_dir).expect("templates");
        RgbaImage::from_pixel(108, 108, Rgba([0, 0, 0, 255]))
            .save(cfg.templates_dir.join("1080x1080.png"))
            .expect("square");
        RgbaImage::from_pixel(72, 128, Rgba([0, 0, 0, 255]))
            .save(cfg.templates_dir.join("720x1280.png"))
            .expect("reel");
        let art = artwork_path(&cfg, "Jane", "Song1");
        std::fs::create_dir_all(art.parent().expect("parent")).expect("data");
        RgbaImage::from_pixel(500, 500, Rgba([9, 9, 9, 255])).save(&art).expect("art");

        let generator = Generator::new(cfg.clone(), FakeFetcher::new(), FakePublisher::new(true));
        let report = generator.run_all("Jane", "Song1", &[], true).await.expect("run");

        let keys: Vec<&str> = report.clips.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(
            keys,
            [
                "Jane/Song1/Jane - Song1 (square).mp4",
                "Jane/Song1/Jane - Song1 (reel).mp4"
            ]
        );
        assert!(std::fs::read_dir(&cfg.generated_dir).expect("dir").next().is_none());
        assert!(work_files(&cfg).is_empty());
        assert!(art.exists());
        // audio + blurb + hashtags, fetched once for both variants
        assert_eq!(generator.fetcher.calls().len(), 3);
    }

    #[tokio::test]
    async fn run_all_requires_artwork() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = test_config(dir.path());
        let generator = Generator::new(cfg, FakeFetcher::new(), FakePublisher::new(true));

        let err = generator.run_all("Jane", "Song1", &[], false).await.unwrap_err();
        assert!(matches!(err, PromoError::MissingFile(_)));
        assert!(generator.fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn run_all_rejects_unknown_labels() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = test_config(dir.path());
        let art = artwork_path(&cfg, "Jane", "Song1");
        std::fs::create_dir_all(art.parent().expect("parent")).expect("data");
        RgbaImage::new(4, 4).save(&art).expect("art");
        let generator = Generator::new(cfg, FakeFetcher::new(), FakePublisher::new(true));

        let err = generator
            .run_all("Jane", "Song1", &["story".to_string()], false)
            .await
            .unwrap_err();
        assert!(matches!(err, PromoError::Config(_)));
    }
}
