//! Transfer and tagging collaborators.
//!
//! A [`Transfer`] fetches the source streams of a [`DownloadOption`] and
//! produces the destination file in the requested format. A [`Tagger`]
//! writes metadata into a finished file. Both must return promptly once the
//! cancellation token fires.
//!
//! Two transfers ship with the crate:
//!
//! - [`HttpTransfer`] - streams a single stream whose container already is
//!   the requested format straight to disk
//! - [`FfmpegTransfer`] - muxes and transcodes through an `ffmpeg` child
//!   process, killed on cancellation

pub mod ffmpeg;
pub mod http;

pub use ffmpeg::{FfmpegConfig, FfmpegTransfer};
pub use http::HttpTransfer;

use crate::download::DownloadOption;
use crate::error::Result;
use crate::media::Video;
use crate::progress::ProgressSink;

use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// Encoder speed/quality trade-off used when transcoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QualityPreset {
    /// Fastest encoding, largest output.
    VeryFast,
    /// Fast encoding.
    Fast,
    /// Balanced.
    #[default]
    Medium,
    /// Slow encoding, smaller output.
    Slow,
    /// Slowest encoding, smallest output.
    VerySlow,
}

impl QualityPreset {
    /// Get the encoder preset name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VeryFast => "veryfast",
            Self::Fast => "fast",
            Self::Medium => "medium",
            Self::Slow => "slow",
            Self::VerySlow => "veryslow",
        }
    }
}

impl fmt::Display for QualityPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a transfer needs to produce one file.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    /// The video being downloaded.
    pub video: Video,
    /// Chosen source streams.
    pub option: DownloadOption,
    /// Destination file. It already exists as a placeholder.
    pub path: PathBuf,
    /// Requested output format.
    pub format: String,
    /// Encoder preset.
    pub preset: QualityPreset,
}

/// Fetches and converts media streams into a file.
#[async_trait]
pub trait Transfer: Send + Sync {
    /// Produce `request.path`, reporting fractional progress to `progress`.
    ///
    /// Must return [`Error::Cancelled`](crate::Error::Cancelled) promptly once
    /// `cancel` fires and must not leave subordinate processes running.
    async fn run(
        &self,
        request: &TransferRequest,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<()>;
}

/// Writes metadata tags into a finished file.
#[async_trait]
pub trait Tagger: Send + Sync {
    /// Inject tags for `video` into the file at `path`.
    ///
    /// Must return [`Error::Cancelled`](crate::Error::Cancelled) promptly once
    /// `cancel` fires.
    async fn inject(
        &self,
        video: &Video,
        format: &str,
        path: &Path,
        cancel: &CancellationToken,
    ) -> Result<()>;
}

/// A tagger that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTagger;

#[async_trait]
impl Tagger for NoopTagger {
    async fn inject(
        &self,
        _video: &Video,
        _format: &str,
        _path: &Path,
        _cancel: &CancellationToken,
    ) -> Result<()> {
        Ok(())
    }
}
