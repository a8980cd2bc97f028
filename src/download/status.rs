//! Task state, stage and snapshots.
//!
//! This module contains the [`TaskState`] and [`TaskStage`] enums describing
//! where a [`DownloadTask`](super::DownloadTask) is in its lifecycle, and the
//! [`TaskSnapshot`] handed to observers on every transition.
//!
//! # Examples
//!
//! ```rust
//! use vidqueue::download::{TaskStage, TaskState};
//!
//! assert!(TaskState::Failed.is_terminal());
//! assert!(!TaskState::Idle.is_terminal());
//! assert_eq!(TaskStage::Queued.to_string(), "queued");
//! ```

use super::option::DownloadOption;
use crate::media::Video;

use std::fmt;
use std::path::PathBuf;

/// Download task state.
///
/// `Idle -> Running -> {Succeeded, Canceled, Failed}`; a terminal task can be
/// started again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TaskState {
    /// Created, never started.
    #[default]
    Idle,
    /// Waiting for admission or working.
    Running,
    /// Finished successfully.
    Succeeded,
    /// Stopped by cancellation.
    Canceled,
    /// Stopped by an error.
    Failed,
}

impl TaskState {
    /// Returns `true` for `Succeeded`, `Canceled` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Canceled | Self::Failed)
    }

    /// Returns `true` while the task is running.
    pub fn is_running(self) -> bool {
        self == Self::Running
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Canceled => "canceled",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What a running task is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStage {
    /// Waiting for the admission gate.
    Queued,
    /// Fetching the stream manifest and picking an option.
    Resolving,
    /// Fetching and converting streams.
    Transferring,
    /// Writing metadata tags.
    Tagging,
}

impl fmt::Display for TaskStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Queued => "queued",
            Self::Resolving => "resolving",
            Self::Transferring => "transferring",
            Self::Tagging => "tagging",
        };
        f.write_str(name)
    }
}

/// Immutable view of a task at one instant.
#[derive(Debug, Clone)]
pub struct TaskSnapshot {
    /// The video being downloaded.
    pub video: Video,
    /// Destination file.
    pub path: PathBuf,
    /// Requested format.
    pub format: String,
    /// Chosen option, once assigned or resolved.
    pub option: Option<DownloadOption>,
    /// Lifecycle state.
    pub state: TaskState,
    /// Sub-status, only while running.
    pub stage: Option<TaskStage>,
    /// Completed fraction in `[0, 1]`.
    pub progress: f64,
    /// Failure message, only when failed.
    pub fail_reason: Option<String>,
}

impl TaskSnapshot {
    /// Get the file name part of the destination.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
