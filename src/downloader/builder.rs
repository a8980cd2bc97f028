//! Builder pattern implementation for creating Coordinator instances.
//!
//! The manifest provider and the transfer collaborator are required; every
//! other option has a default.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vidqueue::downloader::{CoordinatorBuilder, Settings};
//! use vidqueue::media::ManifestProvider;
//! use vidqueue::transfer::{FfmpegTransfer, QualityPreset};
//!
//! # fn example(manifests: Arc<impl ManifestProvider + 'static>) {
//! let settings = Arc::new(Settings::default());
//!
//! let coordinator = CoordinatorBuilder::new(manifests, Arc::new(FfmpegTransfer::new()))
//!     .settings(settings.clone())
//!     .quality_preset(QualityPreset::Fast)
//!     .on_state_change(|snapshot| {
//!         println!("{} is {}", snapshot.file_name(), snapshot.state);
//!     })
//!     .build();
//! # }
//! ```

use super::config::{CoordinatorConfig, Settings};
use super::coordinator::Coordinator;
use super::gate::AdmissionGate;
use crate::download::{OptionSelector, SelectorConfig, TaskContext, TaskSnapshot};
use crate::media::ManifestProvider;
use crate::progress::ProgressManager;
use crate::transfer::{NoopTagger, QualityPreset, Tagger, Transfer};

use std::sync::Arc;

/// A builder used to create a [`Coordinator`].
pub struct CoordinatorBuilder {
    config: CoordinatorConfig,
    manifests: Arc<dyn ManifestProvider>,
    transfer: Arc<dyn Transfer>,
    tagger: Arc<dyn Tagger>,
    progress: ProgressManager,
}

impl CoordinatorBuilder {
    /// Creates a builder with the default options.
    pub fn new<M, T>(manifests: Arc<M>, transfer: Arc<T>) -> Self
    where
        M: ManifestProvider + 'static,
        T: Transfer + 'static,
    {
        Self {
            config: CoordinatorConfig::default(),
            manifests,
            transfer,
            tagger: Arc::new(NoopTagger),
            progress: ProgressManager::new(),
        }
    }

    /// Set the tag injector run after each successful transfer.
    pub fn tagger<G>(mut self, tagger: Arc<G>) -> Self
    where
        G: Tagger + 'static,
    {
        self.tagger = tagger;
        self
    }

    /// Share live settings with the host.
    pub fn settings(mut self, settings: Arc<Settings>) -> Self {
        self.config.settings = settings;
        self
    }

    /// Set the number of concurrent downloads.
    ///
    /// Writes through to the settings, so call it after [`settings()`].
    ///
    /// [`settings()`]: CoordinatorBuilder::settings
    pub fn max_concurrent_downloads(self, max: usize) -> Self {
        self.config.settings.set_max_concurrent_downloads(max);
        self
    }

    /// Set the option selection preferences.
    pub fn selector(mut self, selector: SelectorConfig) -> Self {
        self.config.selector = selector;
        self
    }

    /// Set the encoder preset handed to the transfer collaborator.
    pub fn quality_preset(mut self, preset: QualityPreset) -> Self {
        self.config.quality_preset = preset;
        self
    }

    /// Track download progress in an existing manager.
    pub fn progress_manager(mut self, progress: ProgressManager) -> Self {
        self.progress = progress;
        self
    }

    /// Set callback for every task state or stage change.
    ///
    /// The callback runs on whichever thread made the transition, without
    /// any engine lock held.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use std::sync::Arc;
    /// use vidqueue::download::TaskState;
    /// use vidqueue::downloader::CoordinatorBuilder;
    /// use vidqueue::media::ManifestProvider;
    /// use vidqueue::transfer::FfmpegTransfer;
    ///
    /// # fn example(manifests: Arc<impl ManifestProvider + 'static>) {
    /// let coordinator = CoordinatorBuilder::new(manifests, Arc::new(FfmpegTransfer::new()))
    ///     .on_state_change(|snapshot| match snapshot.state {
    ///         TaskState::Succeeded => println!("[Success] {}", snapshot.file_name()),
    ///         TaskState::Failed => println!(
    ///             "[Failed] {} - Error: {}",
    ///             snapshot.file_name(),
    ///             snapshot.fail_reason.as_deref().unwrap_or_default()
    ///         ),
    ///         _ => {}
    ///     })
    ///     .build();
    /// # }
    /// ```
    pub fn on_state_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(&TaskSnapshot) + Send + Sync + 'static,
    {
        self.config.on_state_change = Some(Arc::new(Box::new(callback)));
        self
    }

    /// Create the [`Coordinator`] with the specified options.
    pub fn build(self) -> Coordinator {
        let selector = OptionSelector::with_config(self.config.selector.clone());
        Coordinator::new(TaskContext {
            config: self.config,
            selector,
            gate: Arc::new(AdmissionGate::new()),
            manifests: self.manifests,
            transfer: self.transfer,
            tagger: self.tagger,
            progress: self.progress,
        })
    }
}
