//! Media descriptors consumed by the orchestration engine.
//!
//! Videos and their stream manifests come from collaborators outside this
//! crate (a query service and a [`ManifestProvider`]). The engine only reads
//! them.
//!
//! - [`stream`] - Stream descriptors and containers
//! - [`manifest`] - Stream manifests and the provider trait

pub mod manifest;
pub mod stream;

pub use manifest::{ManifestProvider, StreamManifest};
pub use stream::{Container, StreamInfo, StreamKind};

use std::fmt;
use std::time::Duration;

/// A remote video, as resolved by the query collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Video {
    /// Opaque identifier understood by the manifest provider.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Channel or uploader name, if known.
    pub author: Option<String>,
    /// Playback duration, if known. Used to turn transcoder timestamps into
    /// progress.
    pub duration: Option<Duration>,
}

impl Video {
    /// Creates a new [`Video`] with no author or duration.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: None,
            duration: None,
        }
    }

    /// Sets the author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Sets the duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

impl fmt::Display for Video {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.id)
    }
}
