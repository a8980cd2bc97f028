//! File name templates.
//!
//! A template is plain text with `$`-tokens replaced per video:
//!
//! | Token     | Value                                        |
//! |-----------|----------------------------------------------|
//! | `$num`    | position in a batch, as `[01]`; empty if none |
//! | `$id`     | video id                                     |
//! | `$title`  | video title                                  |
//! | `$author` | video author; empty if unknown               |
//!
//! The rendered name gets `.{format}` appended and every character that is
//! invalid in a file name replaced with `_`.

use crate::media::Video;

/// Characters rejected by common filesystems.
const INVALID_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// A file name template such as `"$num - $title"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNameTemplate(String);

impl Default for FileNameTemplate {
    fn default() -> Self {
        Self::new(Self::DEFAULT)
    }
}

impl FileNameTemplate {
    /// Template used when none is configured.
    pub const DEFAULT: &'static str = "$title";

    /// Creates a template.
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    /// Get the raw template.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Render the file name for `video` in `format`.
    ///
    /// `number` is the already padded batch position, e.g. `"07"`.
    pub fn render(&self, video: &Video, format: &str, number: Option<&str>) -> String {
        let num = number.map(|n| format!("[{}]", n)).unwrap_or_default();
        let rendered = self
            .0
            .replace("$num", &num)
            .replace("$id", &video.id)
            .replace("$title", &video.title)
            .replace("$author", video.author.as_deref().unwrap_or_default());

        let stem = sanitize(rendered.trim());
        format!("{}.{}", stem, format)
    }
}

/// Replace characters that are invalid in file names with `_`.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if INVALID_CHARS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// Zero-pad a 1-based batch position to the width of `total`.
pub fn pad_number(position: usize, total: usize) -> String {
    let width = total.to_string().len();
    format!("{:0width$}", position, width = width)
}
