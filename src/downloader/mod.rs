//! Admission, configuration and coordination of downloads.
//!
//! # Overview
//!
//! - `gate` - Bounded-concurrency admission with a live capacity
//! - `config` - Live [`Settings`] and the coordinator configuration
//! - `coordinator` - The [`Coordinator`] task registry
//! - `builder` - [`CoordinatorBuilder`] for flexible configuration
//! - `plan` - Turning chosen videos into download requests
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use vidqueue::downloader::{plan_batch, CoordinatorBuilder};
//! use vidqueue::media::{ManifestProvider, Video};
//! use vidqueue::transfer::FfmpegTransfer;
//!
//! # async fn example(manifests: Arc<impl ManifestProvider + 'static>, videos: Vec<Video>) {
//! let coordinator = CoordinatorBuilder::new(manifests, Arc::new(FfmpegTransfer::new())).build();
//!
//! for request in plan_batch(&videos, "./downloads".as_ref(), "mp3", coordinator.settings()) {
//!     coordinator.enqueue_and_start(request);
//! }
//!
//! // Let two more downloads run at once.
//! coordinator.set_max_concurrent_downloads(4);
//!
//! coordinator.shutdown_graceful(Duration::from_secs(5)).await;
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod coordinator;
pub mod gate;
pub mod plan;

pub use builder::CoordinatorBuilder;
pub use config::{CoordinatorConfig, Settings, SettingsValues, StateCallback};
pub use coordinator::Coordinator;
pub use gate::{AdmissionGate, AdmissionPermit, CapacityProvider};
pub use plan::{plan_batch, plan_single};
