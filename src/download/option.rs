//! Download options and option sets.
//!
//! A [`DownloadOption`] bundles the source stream(s) of a video with the
//! format they end up in. An [`OptionSet`] is an ordered collection of
//! options keyed by their label, case-insensitively.

use crate::media::StreamInfo;

use std::fmt;

/// Source streams of a [`DownloadOption`].
#[derive(Debug, Clone, PartialEq)]
pub enum OptionStreams {
    /// One stream: a muxed stream, or the audio stream of an audio-only
    /// option.
    Single(StreamInfo),
    /// A video-only stream to be muxed with an audio-only stream.
    Pair {
        /// The video-only stream.
        video: StreamInfo,
        /// The audio-only stream.
        audio: StreamInfo,
    },
}

/// A named, format-tagged choice of source streams.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadOption {
    format: String,
    label: String,
    streams: OptionStreams,
}

impl DownloadOption {
    /// Creates an option backed by a single stream.
    pub fn single(format: impl Into<String>, label: impl Into<String>, stream: StreamInfo) -> Self {
        Self {
            format: format.into(),
            label: label.into(),
            streams: OptionStreams::Single(stream),
        }
    }

    /// Creates an option pairing a video-only stream with an audio-only one.
    pub fn pair(
        format: impl Into<String>,
        label: impl Into<String>,
        video: StreamInfo,
        audio: StreamInfo,
    ) -> Self {
        Self {
            format: format.into(),
            label: label.into(),
            streams: OptionStreams::Pair { video, audio },
        }
    }

    /// Container/codec identifier of the produced file, e.g. `mp4`.
    pub fn format(&self) -> &str {
        &self.format
    }

    /// Human readable quality descriptor, e.g. `1080p`.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Source streams.
    pub fn streams(&self) -> &OptionStreams {
        &self.streams
    }

    /// Source streams as a list, video first.
    pub fn stream_list(&self) -> Vec<&StreamInfo> {
        match &self.streams {
            OptionStreams::Single(stream) => vec![stream],
            OptionStreams::Pair { video, audio } => vec![video, audio],
        }
    }

    /// Returns `true` if the option has two source streams.
    pub fn needs_muxing(&self) -> bool {
        matches!(self.streams, OptionStreams::Pair { .. })
    }
}

impl fmt::Display for DownloadOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.label, self.format)
    }
}

/// Normalized key used for label comparisons.
fn label_key(label: &str) -> String {
    label.to_lowercase()
}

/// Ordered set of [`DownloadOption`]s with unique labels.
///
/// Labels compare case-insensitively. Inserting an option whose label is
/// already present replaces the stored option in place: the newer option
/// wins and keeps the older one's position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionSet {
    entries: Vec<(String, DownloadOption)>,
}

impl OptionSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an option, returning the one it replaced, if any.
    pub fn insert(&mut self, option: DownloadOption) -> Option<DownloadOption> {
        let key = label_key(option.label());
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, option)),
            None => {
                self.entries.push((key, option));
                None
            }
        }
    }

    /// Look an option up by label, case-insensitively.
    pub fn get(&self, label: &str) -> Option<&DownloadOption> {
        let key = label_key(label);
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, option)| option)
    }

    /// First option, in set order, whose format equals `format`
    /// (ASCII case-insensitive).
    pub fn find_by_format(&self, format: &str) -> Option<&DownloadOption> {
        self.iter().find(|o| o.format().eq_ignore_ascii_case(format))
    }

    /// Iterate over the options in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &DownloadOption> {
        self.entries.iter().map(|(_, option)| option)
    }

    /// Labels in insertion order.
    pub fn labels(&self) -> Vec<&str> {
        self.iter().map(DownloadOption::label).collect()
    }

    /// Number of options.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the set, returning the options in insertion order.
    pub fn into_vec(self) -> Vec<DownloadOption> {
        self.entries.into_iter().map(|(_, option)| option).collect()
    }
}

impl FromIterator<DownloadOption> for OptionSet {
    fn from_iter<T: IntoIterator<Item = DownloadOption>>(iter: T) -> Self {
        let mut set = OptionSet::new();
        for option in iter {
            set.insert(option);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{Container, StreamInfo};
    use reqwest::Url;

    fn audio() -> StreamInfo {
        StreamInfo::audio(
            Url::parse("https://media.example.com/a").unwrap(),
            Container::webm(),
            128_000,
        )
    }

    #[test]
    fn test_colliding_label_overwrites_in_place() {
        let mut set = OptionSet::new();
        set.insert(DownloadOption::single("mp4", "720p", audio()));
        set.insert(DownloadOption::single("mp4", "480p", audio()));
        let replaced = set.insert(DownloadOption::single("webm", "720P", audio()));

        assert_eq!(replaced.map(|o| o.format().to_string()), Some("mp4".into()));
        assert_eq!(set.len(), 2);
        assert_eq!(set.labels(), vec!["720P", "480p"]);
        assert_eq!(set.get("720p").map(|o| o.format()), Some("webm"));
    }

    #[test]
    fn test_find_by_format_returns_first_match() {
        let set: OptionSet = vec![
            DownloadOption::single("webm", "1080p", audio()),
            DownloadOption::single("mp4", "720p", audio()),
            DownloadOption::single("mp4", "360p", audio()),
        ]
        .into_iter()
        .collect();

        assert_eq!(set.find_by_format("mp4").map(|o| o.label()), Some("720p"));
        assert_eq!(set.find_by_format("MP4").map(|o| o.label()), Some("720p"));
        assert!(set.find_by_format("flac").is_none());
    }

    #[test]
    fn test_stream_list_order() {
        let video = StreamInfo::video_only(
            Url::parse("https://media.example.com/v").unwrap(),
            Container::mp4(),
            1080,
            30,
        );
        let option = DownloadOption::pair("mp4", "1080p", video.clone(), audio());
        assert!(option.needs_muxing());
        assert_eq!(option.stream_list(), vec![&video, &audio()]);
    }
}
