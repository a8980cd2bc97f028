//! Stream option selection.
//!
//! Turns a [`StreamManifest`] into a ranked, deduplicated [`OptionSet`]:
//!
//! 1. Pick the best audio-only stream: preferred container first, then the
//!    highest bitrate.
//! 2. Group streams with a video track by quality label (case-insensitive),
//!    keep the highest framerate of each group, and rank the survivors by
//!    quality then framerate, both descending.
//! 3. Pair video-only survivors with the best audio; muxed survivors stand
//!    alone. Video-only streams are dropped when there is no audio to pair
//!    them with.
//! 4. Append the `audio/mp3` and `audio/ogg` pseudo-options when a best
//!    audio stream exists.
//!
//! Selection is deterministic: the same manifest always yields the same
//! ordered options.

use super::option::{DownloadOption, OptionSet};
use crate::media::{Container, StreamInfo, StreamKind, StreamManifest};

use std::cmp::Ordering;
use tracing::debug;

/// Label of the mp3 audio pseudo-option.
pub const AUDIO_MP3_LABEL: &str = "audio/mp3";
/// Label of the ogg audio pseudo-option.
pub const AUDIO_OGG_LABEL: &str = "audio/ogg";

/// Configuration for option selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorConfig {
    /// Audio container preferred over any bitrate advantage.
    pub preferred_audio_container: Container,
    /// Audio-only formats offered after the video options, in order.
    pub audio_formats: Vec<(String, String)>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            preferred_audio_container: Container::webm(),
            audio_formats: vec![
                ("mp3".to_string(), AUDIO_MP3_LABEL.to_string()),
                ("ogg".to_string(), AUDIO_OGG_LABEL.to_string()),
            ],
        }
    }
}

/// Builds download options from stream manifests.
#[derive(Debug, Clone, Default)]
pub struct OptionSelector {
    config: SelectorConfig,
}

impl OptionSelector {
    /// Create a selector with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SelectorConfig::default())
    }

    /// Create a selector with a custom configuration.
    pub fn with_config(config: SelectorConfig) -> Self {
        Self { config }
    }

    /// Get the selector configuration.
    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Select the best audio-only stream, if any.
    pub fn best_audio<'a>(&self, manifest: &'a StreamManifest) -> Option<&'a StreamInfo> {
        manifest.audio().min_by(|a, b| self.compare_audio(a, b))
    }

    /// One stream per quality label, ranked best first.
    pub fn video_representatives<'a>(&self, manifest: &'a StreamManifest) -> Vec<&'a StreamInfo> {
        let mut groups: Vec<(String, &StreamInfo)> = Vec::new();

        for stream in manifest.video() {
            let key = stream.label().to_lowercase();
            match groups.iter_mut().find(|(k, _)| *k == key) {
                Some((_, kept)) => {
                    if framerate(stream) > framerate(kept) {
                        *kept = stream;
                    }
                }
                None => groups.push((key, stream)),
            }
        }

        let mut representatives: Vec<&StreamInfo> = groups.into_iter().map(|(_, s)| s).collect();
        representatives.sort_by(|a, b| compare_video(a, b));
        representatives
    }

    /// Build the ranked option set for a manifest.
    pub fn download_options(&self, manifest: &StreamManifest) -> OptionSet {
        let mut options = OptionSet::new();
        let best_audio = self.best_audio(manifest);

        for stream in self.video_representatives(manifest) {
            let format = stream.container.name();
            let label = stream.label();

            match (stream.kind, best_audio) {
                (StreamKind::Muxed, _) => {
                    options.insert(DownloadOption::single(format, label, stream.clone()));
                }
                (StreamKind::VideoOnly, Some(audio)) => {
                    options.insert(DownloadOption::pair(
                        format,
                        label,
                        stream.clone(),
                        audio.clone(),
                    ));
                }
                (StreamKind::VideoOnly, None) => {
                    debug!("Skipping video-only stream {} without audio", label);
                }
                (StreamKind::AudioOnly, _) => {}
            }
        }

        if let Some(audio) = best_audio {
            for (format, label) in &self.config.audio_formats {
                options.insert(DownloadOption::single(format, label, audio.clone()));
            }
        }

        debug!(
            "Resolved {} download options from {} streams",
            options.len(),
            manifest.streams().len()
        );
        options
    }

    /// Compare two audio streams. Lower is better.
    fn compare_audio(&self, a: &StreamInfo, b: &StreamInfo) -> Ordering {
        let preferred_a = a.container == self.config.preferred_audio_container;
        let preferred_b = b.container == self.config.preferred_audio_container;
        preferred_b
            .cmp(&preferred_a)
            .then_with(|| b.bitrate.unwrap_or(0).cmp(&a.bitrate.unwrap_or(0)))
    }
}

fn framerate(stream: &StreamInfo) -> u32 {
    stream.framerate.unwrap_or(0)
}

/// Compare two video streams. Lower is better.
fn compare_video(a: &StreamInfo, b: &StreamInfo) -> Ordering {
    b.quality
        .unwrap_or(0)
        .cmp(&a.quality.unwrap_or(0))
        .then_with(|| framerate(b).cmp(&framerate(a)))
}

/// Build the option set for a manifest with the default configuration.
pub fn download_options(manifest: &StreamManifest) -> OptionSet {
    OptionSelector::new().download_options(manifest)
}

/// Pick the option to preselect for a single video.
///
/// Prefers the last used format, then the first option with a non-empty
/// label, then the first option.
pub fn default_option<'a>(
    options: &'a OptionSet,
    last_format: Option<&str>,
) -> Option<&'a DownloadOption> {
    last_format
        .and_then(|format| options.find_by_format(format))
        .or_else(|| options.iter().find(|o| !o.label().trim().is_empty()))
        .or_else(|| options.iter().next())
}
