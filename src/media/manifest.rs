//! Stream manifests and the collaborator that produces them.

use super::stream::{StreamInfo, StreamKind};
use crate::error::Result;

use async_trait::async_trait;

/// The set of streams available for one video.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamManifest {
    streams: Vec<StreamInfo>,
}

impl StreamManifest {
    /// Creates a manifest from a list of streams.
    pub fn new(streams: Vec<StreamInfo>) -> Self {
        Self { streams }
    }

    /// All streams, in provider order.
    pub fn streams(&self) -> &[StreamInfo] {
        &self.streams
    }

    /// Audio-only streams.
    pub fn audio(&self) -> impl Iterator<Item = &StreamInfo> {
        self.streams
            .iter()
            .filter(|s| s.kind == StreamKind::AudioOnly)
    }

    /// Streams with a video track (video-only and muxed).
    pub fn video(&self) -> impl Iterator<Item = &StreamInfo> {
        self.streams.iter().filter(|s| s.kind.has_video())
    }

    /// Returns `true` if the manifest has no streams.
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

impl FromIterator<StreamInfo> for StreamManifest {
    fn from_iter<T: IntoIterator<Item = StreamInfo>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Resolves the stream manifest of a video.
///
/// Implementations should report a missing or unplayable video with
/// [`Error::VideoUnavailable`](crate::Error::VideoUnavailable); the task
/// turns it into a failure.
#[async_trait]
pub trait ManifestProvider: Send + Sync {
    /// Fetch the manifest for `video_id`.
    async fn get_manifest(&self, video_id: &str) -> Result<StreamManifest>;
}
