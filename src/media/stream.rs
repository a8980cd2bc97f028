//! Stream descriptors.

use reqwest::Url;
use std::fmt;

/// What a stream carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// Audio track only.
    AudioOnly,
    /// Video track only, needs an audio stream to be muxed with.
    VideoOnly,
    /// Audio and video in one stream.
    Muxed,
}

impl StreamKind {
    /// Returns `true` for streams with a video track.
    pub fn has_video(self) -> bool {
        matches!(self, StreamKind::VideoOnly | StreamKind::Muxed)
    }

    /// Returns `true` for streams with an audio track.
    pub fn has_audio(self) -> bool {
        matches!(self, StreamKind::AudioOnly | StreamKind::Muxed)
    }
}

/// Stream container, e.g. `mp4` or `webm`.
///
/// Names are stored lower-cased so comparisons are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Container(String);

impl Container {
    /// Creates a container from its name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim().to_ascii_lowercase())
    }

    /// MPEG-4 Part 14.
    pub fn mp4() -> Self {
        Self::new("mp4")
    }

    /// WebM.
    pub fn webm() -> Self {
        Self::new("webm")
    }

    /// 3GPP.
    pub fn tgpp() -> Self {
        Self::new("3gpp")
    }

    /// Get the container name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Container {
    fn from(value: &str) -> Self {
        Container::new(value)
    }
}

/// Describes one stream available for a video.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
    /// Where the stream can be fetched from.
    pub url: Url,
    /// Audio, video or both.
    pub kind: StreamKind,
    /// Container of the stream.
    pub container: Container,
    /// Bitrate in bits per second.
    pub bitrate: Option<u64>,
    /// Numeric video quality rank, higher is better (usually the vertical
    /// resolution).
    pub quality: Option<u32>,
    /// Frames per second.
    pub framerate: Option<u32>,
    /// Human readable quality label, e.g. `1080p60`.
    pub quality_label: Option<String>,
    /// Size in bytes, if advertised.
    pub size: Option<u64>,
}

impl StreamInfo {
    /// Creates an audio-only stream.
    pub fn audio(url: Url, container: Container, bitrate: u64) -> Self {
        Self {
            url,
            kind: StreamKind::AudioOnly,
            container,
            bitrate: Some(bitrate),
            quality: None,
            framerate: None,
            quality_label: None,
            size: None,
        }
    }

    /// Creates a video-only stream labelled `{quality}p`.
    pub fn video_only(url: Url, container: Container, quality: u32, framerate: u32) -> Self {
        Self {
            url,
            kind: StreamKind::VideoOnly,
            container,
            bitrate: None,
            quality: Some(quality),
            framerate: Some(framerate),
            quality_label: Some(format!("{}p", quality)),
            size: None,
        }
    }

    /// Creates a muxed (audio + video) stream labelled `{quality}p`.
    pub fn muxed(url: Url, container: Container, quality: u32, framerate: u32) -> Self {
        Self {
            kind: StreamKind::Muxed,
            ..Self::video_only(url, container, quality, framerate)
        }
    }

    /// Overrides the quality label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.quality_label = Some(label.into());
        self
    }

    /// Sets the advertised size in bytes.
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Sets the bitrate.
    pub fn with_bitrate(mut self, bitrate: u64) -> Self {
        self.bitrate = Some(bitrate);
        self
    }

    /// The label used to group video streams.
    ///
    /// Falls back to `{quality}p` and then to an empty string.
    pub fn label(&self) -> String {
        match (&self.quality_label, self.quality) {
            (Some(label), _) => label.clone(),
            (None, Some(quality)) => format!("{}p", quality),
            (None, None) => String::new(),
        }
    }
}
