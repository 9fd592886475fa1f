use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort a run.
///
/// Upload failures are deliberately absent: the publisher reports them as a
/// `false` result and the rendered file stays on disk.
#[derive(Debug, Error)]
pub enum PromoError {
    #[error("download of {url} failed with HTTP {status}")]
    FetchStatus { url: String, status: u16 },

    #[error("download of {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("missing file: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("image {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("could not start {program}: {source}")]
    EncoderSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("encoder exited with {status}: {command}")]
    EncoderFailed { status: String, command: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl PromoError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T, E = PromoError> = std::result::Result<T, E>;
