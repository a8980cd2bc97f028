//! Shared utility functions.
//!
//! - [`content_length`] - Size extraction from HTTP responses
//! - [`filename`] - File name templates for downloaded videos
//!
//! # Examples
//!
//! ```rust
//! use vidqueue::utils::FileNameTemplate;
//! use vidqueue::media::Video;
//!
//! let video = Video::new("dQw4w9WgXcQ", "Never: Gonna Give You Up").with_author("Rick");
//! let name = FileNameTemplate::new("$author - $title").render(&video, "mp3", None);
//! assert_eq!(name, "Rick - Never_ Gonna Give You Up.mp3");
//! ```

pub mod content_length;
pub mod filename;

// Re-export commonly used utilities
pub use content_length::{parse_content_range_total, total_size};
pub use filename::FileNameTemplate;
