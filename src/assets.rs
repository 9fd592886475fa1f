use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    AlbumArt,
    Snippet,
    Blurb,
    Hashtags,
}

impl AssetKind {
    pub const ALL: [AssetKind; 4] = [
        AssetKind::AlbumArt,
        AssetKind::Snippet,
        AssetKind::Blurb,
        AssetKind::Hashtags,
    ];

    /// File name under `<artist>/<track>/` in the asset bucket.
    pub fn remote_name(self) -> &'static str {
        match self {
            AssetKind::AlbumArt => "albumart.png",
            AssetKind::Snippet => "snippet.wav",
            AssetKind::Blurb => "blurb.txt",
            AssetKind::Hashtags => "hashtags.txt",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssetKind::AlbumArt => "album art",
            AssetKind::Snippet => "audio snippet",
            AssetKind::Blurb => "blurb",
            AssetKind::Hashtags => "hashtags",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRef<'a> {
    pub artist: &'a str,
    pub track: &'a str,
    pub kind: AssetKind,
}

impl<'a> AssetRef<'a> {
    pub fn new(artist: &'a str, track: &'a str, kind: AssetKind) -> Self {
        Self { artist, track, kind }
    }

    pub fn url(&self, base_url: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            base_url.trim_end_matches('/'),
            self.artist,
            self.track,
            self.kind.remote_name()
        )
    }

    /// `<track>_<remote-name>`, e.g. `Song1_albumart.png`.
    pub fn local_name(&self) -> String {
        format!("{}_{}", self.track, self.kind.remote_name())
    }

    pub fn local_path(&self, work_dir: &Path) -> PathBuf {
        work_dir.join(self.local_name())
    }
}
