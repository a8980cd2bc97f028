//! Configuration structures and defaults for the coordinator.
//!
//! [`Settings`] holds the user-facing options that the engine reads live at
//! decision points (the gate re-reads the concurrency limit on every
//! admission). [`CoordinatorConfig`] gathers the fixed options a
//! [`Coordinator`](super::Coordinator) is built with.
//!
//! # Examples
//!
//! ```rust
//! use vidqueue::downloader::Settings;
//!
//! let settings = Settings::default();
//! assert_eq!(settings.max_concurrent_downloads(), 2);
//!
//! settings.set_should_inject_tags(false);
//! assert!(!settings.snapshot().should_inject_tags);
//! ```

use super::gate::CapacityProvider;
use crate::download::{SelectorConfig, TaskSnapshot};
use crate::transfer::QualityPreset;
use crate::utils::filename::FileNameTemplate;

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::debug;

/// Callback type for task state changes.
pub type StateCallback = Box<dyn Fn(&TaskSnapshot) + Send + Sync>;

/// Plain values of [`Settings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsValues {
    /// Maximum number of downloads transferring at the same time.
    pub max_concurrent_downloads: usize,
    /// Template used to name downloaded files.
    pub file_name_template: String,
    /// Inject metadata tags after a successful transfer.
    pub should_inject_tags: bool,
    /// Skip videos whose destination already exists and is not empty.
    pub should_skip_existing_files: bool,
    /// Format picked the last time the user set up a download.
    pub last_format: Option<String>,
}

impl Default for SettingsValues {
    fn default() -> Self {
        Self {
            max_concurrent_downloads: 2,
            file_name_template: FileNameTemplate::DEFAULT.to_string(),
            should_inject_tags: true,
            should_skip_existing_files: false,
            last_format: None,
        }
    }
}

/// Live settings shared between the host and the engine.
///
/// Changing [`max_concurrent_downloads`](Settings::set_max_concurrent_downloads),
/// directly or through [`update`](Settings::update), wakes tasks waiting for
/// admission so they re-check the new limit.
#[derive(Default)]
pub struct Settings {
    values: RwLock<SettingsValues>,
    capacity_changed: Notify,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("values", &*self.values.read())
            .finish()
    }
}

impl Settings {
    /// Creates settings from plain values.
    pub fn new(values: SettingsValues) -> Self {
        Self {
            values: RwLock::new(values),
            capacity_changed: Notify::new(),
        }
    }

    /// Copy of the current values.
    pub fn snapshot(&self) -> SettingsValues {
        self.values.read().clone()
    }

    /// Apply several changes at once.
    pub fn update(&self, f: impl FnOnce(&mut SettingsValues)) {
        let changed = {
            let mut values = self.values.write();
            let before = values.max_concurrent_downloads;
            f(&mut values);
            values.max_concurrent_downloads != before
        };
        if changed {
            self.capacity_changed.notify_waiters();
        }
    }

    /// Gets the maximum number of concurrent downloads.
    pub fn max_concurrent_downloads(&self) -> usize {
        self.values.read().max_concurrent_downloads
    }

    /// Sets the maximum number of concurrent downloads.
    pub fn set_max_concurrent_downloads(&self, max: usize) {
        self.values.write().max_concurrent_downloads = max;
        debug!("Concurrency limit set to {}", max);
        self.capacity_changed.notify_waiters();
    }

    /// Gets the file name template.
    pub fn file_name_template(&self) -> String {
        self.values.read().file_name_template.clone()
    }

    /// Sets the file name template.
    pub fn set_file_name_template(&self, template: impl Into<String>) {
        self.values.write().file_name_template = template.into();
    }

    /// Gets whether tags are injected after a transfer.
    pub fn should_inject_tags(&self) -> bool {
        self.values.read().should_inject_tags
    }

    /// Sets whether tags are injected after a transfer.
    pub fn set_should_inject_tags(&self, inject: bool) {
        self.values.write().should_inject_tags = inject;
    }

    /// Gets whether existing non-empty files are skipped.
    pub fn should_skip_existing_files(&self) -> bool {
        self.values.read().should_skip_existing_files
    }

    /// Sets whether existing non-empty files are skipped.
    pub fn set_should_skip_existing_files(&self, skip: bool) {
        self.values.write().should_skip_existing_files = skip;
    }

    /// Gets the last used format.
    pub fn last_format(&self) -> Option<String> {
        self.values.read().last_format.clone()
    }

    /// Sets the last used format.
    pub fn set_last_format(&self, format: impl Into<String>) {
        self.values.write().last_format = Some(format.into());
    }
}

impl CapacityProvider for Settings {
    fn capacity(&self) -> usize {
        self.max_concurrent_downloads()
    }

    fn change_notifier(&self) -> Option<&Notify> {
        Some(&self.capacity_changed)
    }
}

/// Configuration structure for the coordinator.
#[derive(Clone)]
pub struct CoordinatorConfig {
    /// Live settings.
    pub settings: Arc<Settings>,
    /// Option selection preferences.
    pub selector: SelectorConfig,
    /// Encoder preset handed to the transfer collaborator.
    pub quality_preset: QualityPreset,
    /// Callback for every task state or stage change.
    pub on_state_change: Option<Arc<StateCallback>>,
}

impl fmt::Debug for CoordinatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoordinatorConfig")
            .field("settings", &self.settings)
            .field("selector", &self.selector)
            .field("quality_preset", &self.quality_preset)
            .field("on_state_change", &self.on_state_change.is_some())
            .finish()
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            settings: Arc::new(Settings::default()),
            selector: SelectorConfig::default(),
            quality_preset: QualityPreset::default(),
            on_state_change: None,
        }
    }
}
