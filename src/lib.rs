//! Vidqueue resolves videos into downloadable media and runs many downloads
//! at once, with bounded concurrency, cancellation and progress tracking.
//!
//! The host supplies the stream manifests through a
//! [`ManifestProvider`](media::ManifestProvider); the crate picks a stream
//! option per video, admits a limited number of downloads at a time, drives
//! a [`Transfer`](transfer::Transfer) and reports per-task and overall
//! progress.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use std::sync::Arc;
//! use vidqueue::download::DownloadRequest;
//! use vidqueue::downloader::CoordinatorBuilder;
//! use vidqueue::media::{ManifestProvider, StreamManifest, Video};
//! use vidqueue::transfer::FfmpegTransfer;
//!
//! struct Manifests;
//!
//! #[async_trait]
//! impl ManifestProvider for Manifests {
//!     async fn get_manifest(&self, video_id: &str) -> vidqueue::Result<StreamManifest> {
//!         // Ask the video platform for the streams of `video_id`.
//! #       let _ = video_id;
//!         Ok(StreamManifest::default())
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), vidqueue::Error> {
//! let coordinator = CoordinatorBuilder::new(Arc::new(Manifests), Arc::new(FfmpegTransfer::new()))
//!     .on_state_change(|snapshot| println!("{}: {}", snapshot.file_name(), snapshot.state))
//!     .build();
//!
//! let video = Video::new("dQw4w9WgXcQ", "Never Gonna Give You Up");
//! tokio::fs::write("output.mp3", b"").await?;
//! let task = coordinator.enqueue_and_start(DownloadRequest::new(video, "output.mp3", "mp3"));
//!
//! println!("{}", task.wait().await);
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`media`] - Videos, streams and the manifest provider seam
//! - [`download`] - Download options, option selection and the task state machine
//! - [`downloader`] - Admission gate, settings, the `Coordinator` and its builder
//! - [`transfer`] - Transfer and tagging seams, with HTTP and ffmpeg transfers
//! - [`progress`] - Weighted progress aggregation and the terminal display
//! - [`error`] - Centralized error handling with the `Error` enum
//! - [`http`] - HTTP client functionality
//! - [`utils`] - Shared utility functions

pub mod download;
pub mod downloader;
pub mod error;
pub mod http;
pub mod media;
pub mod progress;
pub mod transfer;
pub mod utils;

pub use download::{DownloadOption, DownloadRequest, DownloadTask, OptionSet, TaskSnapshot, TaskState};
pub use downloader::{AdmissionGate, Coordinator, CoordinatorBuilder, Settings};
pub use error::{Error, Result};
pub use http::{create_http_client, HttpClientConfig};
pub use media::{ManifestProvider, StreamInfo, StreamManifest, Video};
pub use progress::{ProgressBarOpts, ProgressManager, StyleOptions};
pub use transfer::{FfmpegTransfer, HttpTransfer, Tagger, Transfer};
