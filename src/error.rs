//! Error handling for vidqueue.
//!
//! Every fallible step of a download pipeline reports one of these errors.
//! The task boundary converts them into a terminal state: [`Error::Cancelled`]
//! becomes `Canceled`, anything else becomes `Failed` with the error's
//! display string as the reason.

use std::io;
use thiserror::Error;

/// Errors that can happen while resolving or running a download.
#[derive(Error, Debug)]
pub enum Error {
    /// The run's cancellation scope fired.
    ///
    /// This is never reported as a failure.
    #[error("Download was canceled")]
    Cancelled,

    /// None of the resolved download options has the requested format.
    #[error("No download option matches format \"{format}\"")]
    NoMatchingOption {
        /// The requested container/codec identifier.
        format: String,
    },

    /// The manifest provider could not find or play the video.
    #[error("Video unavailable: {0}")]
    VideoUnavailable(String),

    /// Error reported by a transfer collaborator.
    ///
    /// The message is kept verbatim for diagnostics.
    #[error("{0}")]
    Transfer(String),

    /// Error reported by the tagging collaborator.
    #[error("{0}")]
    Tagging(String),

    /// A subordinate process could not be spawned or exited abnormally.
    #[error("Process error: {0}")]
    Process(String),

    /// A collaborator cannot handle the given option or format.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// I/O Error.
    ///
    /// This variant wraps standard I/O errors that can occur while writing
    /// the destination file.
    #[error("I/O error: {source}")]
    IOError {
        #[from]
        source: io::Error,
    },

    /// Error from the Reqwest library.
    #[error("Reqwest error: {source}")]
    Reqwest {
        #[from]
        source: reqwest::Error,
    },

    /// Error from the HTTP middleware stack (retries, tracing).
    #[error("HTTP middleware error: {source}")]
    Middleware {
        #[from]
        source: reqwest_middleware::Error,
    },
}

impl Error {
    /// Returns `true` if this error stands for a cancellation rather than a
    /// failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

/// Result type alias for operations that can fail with a vidqueue error.
pub type Result<T> = std::result::Result<T, Error>;
