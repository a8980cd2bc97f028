//! Terminal progress display for a coordinator.
//!
//! [`ProgressDisplay`] keeps one main bar for the overall progress and one
//! child bar per destination path. Feed it task snapshots from the
//! coordinator's state-change callback and the overall value from
//! [`Coordinator::progress`](crate::downloader::Coordinator::progress).
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use vidqueue::progress::{ProgressDisplay, StyleOptions};
//!
//! let display = Arc::new(ProgressDisplay::new(StyleOptions::hidden()));
//! display.set_overall(0.25);
//! assert_eq!(display.main().position(), 250);
//! display.finish();
//! ```

use crate::download::{TaskSnapshot, TaskState};
use crate::progress::StyleOptions;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Length of every bar; positions are per mille.
pub const BAR_LENGTH: u64 = 1000;

fn per_mille(fraction: f64) -> u64 {
    if fraction.is_nan() {
        return 0;
    }
    (fraction.clamp(0.0, 1.0) * BAR_LENGTH as f64).round() as u64
}

/// Progress display manager that coordinates multiple progress bars.
pub struct ProgressDisplay {
    /// The multi-progress instance for coordinating multiple progress bars.
    multi: Arc<MultiProgress>,
    /// The main progress bar for overall progress.
    main: Arc<ProgressBar>,
    /// Child bars by destination path.
    children: Mutex<HashMap<PathBuf, ProgressBar>>,
    /// Style options for progress bars.
    style_options: StyleOptions,
}

impl ProgressDisplay {
    /// Create a new progress display manager.
    pub fn new(style_options: StyleOptions) -> Self {
        // Prepare the progress bar.
        let multi = match style_options.is_enabled() {
            true => Arc::new(MultiProgress::new()),
            false => Arc::new(MultiProgress::with_draw_target(ProgressDrawTarget::hidden())),
        };

        let main = Arc::new(multi.add(style_options.main().clone().to_progress_bar(BAR_LENGTH)));
        main.tick();

        Self {
            multi,
            main,
            children: Mutex::new(HashMap::new()),
            style_options,
        }
    }

    /// Get the multi-progress instance.
    pub fn multi(&self) -> Arc<MultiProgress> {
        self.multi.clone()
    }

    /// Get the main progress bar.
    pub fn main(&self) -> Arc<ProgressBar> {
        self.main.clone()
    }

    /// Number of child bars currently shown.
    pub fn child_count(&self) -> usize {
        self.children.lock().len()
    }

    /// Show the overall progress.
    pub fn set_overall(&self, fraction: f64) {
        self.main.set_position(per_mille(fraction));
    }

    /// Reflect a task transition in its child bar.
    ///
    /// A bar is created the first time a path is seen and finished once the
    /// task reaches a terminal state.
    pub fn update(&self, snapshot: &TaskSnapshot) {
        let mut children = self.children.lock();

        if snapshot.state.is_terminal() {
            if let Some(pb) = children.remove(&snapshot.path) {
                pb.set_position(per_mille(snapshot.progress));
                pb.set_message(message(snapshot));
                self.finish_child(pb);
            }
            return;
        }

        let pb = children.entry(snapshot.path.clone()).or_insert_with(|| {
            self.multi
                .add(self.style_options.child().clone().to_progress_bar(BAR_LENGTH))
        });
        pb.set_position(per_mille(snapshot.progress));
        pb.set_message(message(snapshot));
    }

    /// Finish the progress display, clearing or keeping bars based on configuration.
    pub fn finish(&self) {
        for (_, pb) in self.children.lock().drain() {
            self.finish_child(pb);
        }
        if self.style_options.main().clear {
            self.main.finish_and_clear();
        } else {
            self.main.finish();
        }
    }

    /// Finish a child progress bar based on configuration.
    fn finish_child(&self, pb: ProgressBar) {
        if self.style_options.child().clear {
            pb.finish_and_clear();
        } else {
            pb.finish();
        }
    }
}

fn message(snapshot: &TaskSnapshot) -> String {
    let name = snapshot.file_name();
    match (snapshot.state, snapshot.stage) {
        (TaskState::Running, Some(stage)) => format!("{} ({})", name, stage),
        (TaskState::Failed, _) => format!(
            "{} (failed: {})",
            name,
            snapshot.fail_reason.as_deref().unwrap_or_default()
        ),
        (state, _) => format!("{} ({})", name, state),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::TaskStage;
    use crate::media::Video;

    fn snapshot(path: &str, state: TaskState, stage: Option<TaskStage>, progress: f64) -> TaskSnapshot {
        TaskSnapshot {
            video: Video::new("id", "title"),
            path: PathBuf::from(path),
            format: "mp4".into(),
            option: None,
            state,
            stage,
            progress,
            fail_reason: None,
        }
    }

    #[test]
    fn test_per_mille() {
        assert_eq!(per_mille(0.0), 0);
        assert_eq!(per_mille(0.5), 500);
        assert_eq!(per_mille(1.5), 1000);
        assert_eq!(per_mille(f64::NAN), 0);
    }

    #[test]
    fn test_child_bars_follow_tasks() {
        let display = ProgressDisplay::new(StyleOptions::hidden());

        display.update(&snapshot("a.mp4", TaskState::Running, Some(TaskStage::Queued), 0.0));
        display.update(&snapshot("b.mp4", TaskState::Running, Some(TaskStage::Transferring), 0.3));
        assert_eq!(display.child_count(), 2);

        display.update(&snapshot("a.mp4", TaskState::Succeeded, None, 1.0));
        assert_eq!(display.child_count(), 1);

        display.finish();
        assert_eq!(display.child_count(), 0);
    }

    #[test]
    fn test_message_shows_stage() {
        let running = snapshot("dir/a.mp4", TaskState::Running, Some(TaskStage::Tagging), 1.0);
        assert_eq!(message(&running), "a.mp4 (tagging)");

        let mut failed = snapshot("a.mp4", TaskState::Failed, None, 0.2);
        failed.fail_reason = Some("boom".into());
        assert_eq!(message(&failed), "a.mp4 (failed: boom)");
    }
}
