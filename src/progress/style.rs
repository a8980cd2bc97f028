//! Progress bar styling and configuration options.
//!
//! Styling for the optional terminal display: one main bar for the overall
//! progress and one child bar per download. Both bars count per mille, so
//! templates should show `{percent}` rather than byte counts.
//!
//! # Examples
//!
//! ## Custom Styling
//!
//! ```rust
//! use vidqueue::progress::{StyleOptions, ProgressBarOpts};
//!
//! let custom_style = StyleOptions::new(
//!     ProgressBarOpts::new(
//!         Some("[{bar:40.cyan/blue}] {percent}% {msg}".to_string()),
//!         Some(ProgressBarOpts::CHARS_FINE.to_string()),
//!         true,
//!         false
//!     ),
//!     ProgressBarOpts::with_task_style(),
//! );
//! assert!(custom_style.is_enabled());
//! ```
//!
//! ## Hidden Progress Bars
//!
//! ```rust
//! use vidqueue::progress::{StyleOptions, ProgressBarOpts};
//!
//! let hidden_style = StyleOptions::hidden();
//! assert!(!hidden_style.is_enabled());
//! ```

use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

/// Define the display style options.
///
/// By default, the main progress bar will stay on the screen upon completion,
/// but the child ones will be cleared once complete.
#[derive(Debug, Clone)]
pub struct StyleOptions {
    /// Style options for the main progress bar.
    pub(crate) main: ProgressBarOpts,
    /// Style options for the child progress bar(s).
    pub(crate) child: ProgressBarOpts,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            main: ProgressBarOpts {
                template: Some(ProgressBarOpts::TEMPLATE_OVERALL.into()),
                progress_chars: Some(ProgressBarOpts::CHARS_FINE.into()),
                enabled: true,
                clear: false,
            },
            child: ProgressBarOpts::with_task_style(),
        }
    }
}

impl StyleOptions {
    /// Create new [`StyleOptions`].
    pub fn new(main: ProgressBarOpts, child: ProgressBarOpts) -> Self {
        Self { main, child }
    }

    /// Style options with both bars hidden.
    pub fn hidden() -> Self {
        Self::new(ProgressBarOpts::hidden(), ProgressBarOpts::hidden())
    }

    /// Set the options for the main progress bar.
    pub fn set_main(&mut self, main: ProgressBarOpts) {
        self.main = main;
    }

    /// Set the options for the child progress bar.
    pub fn set_child(&mut self, child: ProgressBarOpts) {
        self.child = child;
    }

    /// Return `false` if neither the main nor the child bar is enabled.
    pub fn is_enabled(&self) -> bool {
        self.main.enabled || self.child.enabled
    }

    /// Get a reference to the main progress bar options.
    pub fn main(&self) -> &ProgressBarOpts {
        &self.main
    }

    /// Get a reference to the child progress bar options.
    pub fn child(&self) -> &ProgressBarOpts {
        &self.child
    }
}

/// Define the options for a progress bar.
#[derive(Debug, Clone)]
pub struct ProgressBarOpts {
    /// Progress bar template string.
    template: Option<String>,
    /// Progression characters set.
    ///
    /// There must be at least 3 characters for the following states:
    /// "filled", "current", and "to do".
    progress_chars: Option<String>,
    /// Enable or disable the progress bar.
    pub(crate) enabled: bool,
    /// Clear the progress bar once completed.
    pub(crate) clear: bool,
}

impl Default for ProgressBarOpts {
    fn default() -> Self {
        Self {
            template: None,
            progress_chars: None,
            enabled: true,
            clear: true,
        }
    }
}

impl ProgressBarOpts {
    /// Template for the overall progress.
    ///
    /// `███████████████████████████████████████  99% eta 00:00:02`
    pub const TEMPLATE_OVERALL: &'static str =
        "{bar:40.blue} {percent:>3}% eta {eta_precise:.blue}";
    /// Template for one download: bar, percentage and a message holding the
    /// file name and stage.
    ///
    /// `━━━━━━━━━━━━━━━━━━━━╾───────────────────  52% song.mp3 (transferring)`
    pub const TEMPLATE_TASK: &'static str = "{bar:40.green/black} {percent:>3}% {msg}";
    /// Use increasing quarter blocks as progress characters: `"█▛▌▖  "`.
    pub const CHARS_BLOCKY: &'static str = "█▛▌▖  ";
    /// Use fade-in blocks as progress characters: `"█▓▒░  "`.
    pub const CHARS_FADE_IN: &'static str = "█▓▒░  ";
    /// Use fine blocks as progress characters: `"█▉▊▋▌▍▎▏  "`.
    pub const CHARS_FINE: &'static str = "█▉▊▋▌▍▎▏  ";
    /// Use a line as progress characters: `"━╾─"`.
    pub const CHARS_LINE: &'static str = "━╾╴─";
    /// Use rough blocks as progress characters: `"█  "`.
    pub const CHARS_ROUGH: &'static str = "█  ";
    /// Use increasing height blocks as progress characters: `"█▇▆▅▄▃▂   "`.
    pub const CHARS_VERTICAL: &'static str = "█▇▆▅▄▃▂   ";

    /// Create a new [`ProgressBarOpts`].
    pub fn new(
        template: Option<String>,
        progress_chars: Option<String>,
        enabled: bool,
        clear: bool,
    ) -> Self {
        Self {
            template,
            progress_chars,
            enabled,
            clear,
        }
    }

    /// Create a [`ProgressStyle`] based on the provided options.
    ///
    /// An invalid template falls back to the default bar.
    pub fn to_progress_style(self) -> ProgressStyle {
        let mut style = ProgressStyle::default_bar();
        if let Some(template) = self.template {
            style = match ProgressStyle::default_bar().template(&template) {
                Ok(style) => style,
                Err(e) => {
                    warn!("Invalid progress template {:?}: {}", template, e);
                    ProgressStyle::default_bar()
                }
            };
        }
        if let Some(progress_chars) = self.progress_chars {
            style = style.progress_chars(&progress_chars);
        }
        style
    }

    /// Create a [`ProgressBar`] based on the provided options.
    pub fn to_progress_bar(self, len: u64) -> ProgressBar {
        // Return a hidden Progress bar if we disabled it.
        if !self.enabled {
            return ProgressBar::hidden();
        }

        // Otherwise returns a ProgressBar with the style.
        let style = self.to_progress_style();
        ProgressBar::new(len).with_style(style)
    }

    /// Create a new [`ProgressBarOpts`] for per-download bars.
    pub fn with_task_style() -> Self {
        Self {
            template: Some(ProgressBarOpts::TEMPLATE_TASK.into()),
            progress_chars: Some(ProgressBarOpts::CHARS_LINE.into()),
            enabled: true,
            clear: true,
        }
    }

    /// Set to `true` to clear the progress bar upon completion.
    pub fn set_clear(&mut self, clear: bool) {
        self.clear = clear;
    }

    /// Create a new [`ProgressBarOpts`] which hides the progress bars.
    pub fn hidden() -> Self {
        Self {
            enabled: false,
            ..ProgressBarOpts::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_keeps_main_and_clears_children() {
        let options = StyleOptions::default();
        assert!(options.is_enabled());
        assert!(!options.main().clear);
        assert!(options.child().clear);
    }

    #[test]
    fn test_hidden_bars_are_hidden() {
        let options = StyleOptions::hidden();
        assert!(!options.is_enabled());
        assert!(options.main().clone().to_progress_bar(10).is_hidden());
    }

    #[test]
    fn test_invalid_template_falls_back() {
        let opts = ProgressBarOpts::new(Some("{bar:40.nope".into()), None, true, true);
        // Must not panic.
        let _ = opts.to_progress_style();
    }
}
