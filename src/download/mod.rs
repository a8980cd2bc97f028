//! Download options and the per-download state machine.
//!
//! # Overview
//!
//! - [`option`] - Download options and case-insensitive option sets
//! - [`selector`] - Turning a stream manifest into ranked download options
//! - [`status`] - Task states, stages and snapshots
//! - [`task`] - The [`DownloadTask`] state machine and [`DownloadRequest`]
//!
//! # Examples
//!
//! ## Selecting an Option
//!
//! ```rust
//! use reqwest::Url;
//! use vidqueue::download::{default_option, download_options};
//! use vidqueue::media::{Container, StreamInfo, StreamManifest};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manifest = StreamManifest::new(vec![
//!     StreamInfo::muxed(Url::parse("https://media.example.com/360")?, Container::mp4(), 360, 30),
//!     StreamInfo::audio(Url::parse("https://media.example.com/a")?, Container::webm(), 160_000),
//! ]);
//!
//! let options = download_options(&manifest);
//! assert_eq!(options.labels(), vec!["360p", "audio/mp3", "audio/ogg"]);
//!
//! let preselected = default_option(&options, Some("ogg")).unwrap();
//! assert_eq!(preselected.label(), "audio/ogg");
//! # Ok(())
//! # }
//! ```

pub mod option;
pub mod selector;
pub mod status;
pub mod task;

pub use option::{DownloadOption, OptionSet, OptionStreams};
pub use selector::{
    default_option, download_options, OptionSelector, SelectorConfig, AUDIO_MP3_LABEL,
    AUDIO_OGG_LABEL,
};
pub use status::{TaskSnapshot, TaskStage, TaskState};
pub use task::{DownloadRequest, DownloadTask, TaskContext};
