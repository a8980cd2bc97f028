//! Turning chosen videos into download requests.
//!
//! Planning names each destination with the configured
//! [`FileNameTemplate`], optionally skips files that already hold data, and
//! remembers the chosen format for the next time. It never creates files or
//! directories; the host prepares the placeholders.

use super::config::Settings;
use crate::download::{DownloadOption, DownloadRequest};
use crate::media::Video;
use crate::utils::filename::{pad_number, FileNameTemplate};

use std::path::Path;
use tracing::debug;

/// Plan downloads of `videos` into `directory`, all in `format`.
///
/// Videos are numbered from 1, zero-padded to the width of the count, for
/// the `$num` token. When [`Settings::should_skip_existing_files`] is set,
/// videos whose destination already exists and is not empty are left out.
///
/// # Examples
///
/// ```rust
/// use vidqueue::downloader::{plan_batch, Settings};
/// use vidqueue::media::Video;
///
/// let settings = Settings::default();
/// settings.set_file_name_template("$num $title");
///
/// let videos: Vec<Video> = (1..=10)
///     .map(|i| Video::new(format!("id{}", i), format!("Part {}", i)))
///     .collect();
///
/// let requests = plan_batch(&videos, "/tmp/vidqueue-plan".as_ref(), "mp3", &settings);
/// assert_eq!(requests[0].path.file_name().unwrap(), "[01] Part 1.mp3");
/// assert_eq!(settings.last_format().as_deref(), Some("mp3"));
/// ```
pub fn plan_batch(
    videos: &[Video],
    directory: &Path,
    format: &str,
    settings: &Settings,
) -> Vec<DownloadRequest> {
    let template = FileNameTemplate::new(settings.file_name_template());
    let skip_existing = settings.should_skip_existing_files();
    let total = videos.len();

    let requests = videos
        .iter()
        .enumerate()
        .filter_map(|(i, video)| {
            let number = pad_number(i + 1, total);
            let path = directory.join(template.render(video, format, Some(&number)));
            if skip_existing && is_non_empty_file(&path) {
                debug!("Skipping {}, {:?} already exists", video.id, path);
                return None;
            }
            Some(DownloadRequest::new(video.clone(), path, format))
        })
        .collect();

    settings.set_last_format(format);
    requests
}

/// Plan the download of a single video with a pre-selected option.
pub fn plan_single(
    video: &Video,
    directory: &Path,
    option: DownloadOption,
    settings: &Settings,
) -> DownloadRequest {
    let template = FileNameTemplate::new(settings.file_name_template());
    let path = directory.join(template.render(video, option.format(), None));
    settings.set_last_format(option.format());
    DownloadRequest::with_option(video.clone(), path, option)
}

fn is_non_empty_file(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.len() > 0)
        .unwrap_or(false)
}
