pub mod assets;
pub mod captions;
pub mod compositor;
pub mod config;
pub mod error;
pub mod fetch;
pub mod ffmpeg;
pub mod generator;
pub mod init;
pub mod overlay;
pub mod publish;
pub mod templates;

pub use error::PromoError;

pub(crate) fn logi(message: impl AsRef<str>) {
    tracing::info!("{}", message.as_ref());
}

pub(crate) fn logok(message: impl AsRef<str>) {
    tracing::info!(status = "ok", "{}", message.as_ref());
}

pub(crate) fn logw(message: impl AsRef<str>) {
    tracing::warn!("{}", message.as_ref());
}
