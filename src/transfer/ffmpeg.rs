//! Muxing and transcoding through an `ffmpeg` child process.
//!
//! The process writes machine readable progress to stdout
//! (`-progress pipe:1`); `out_time_ms` is turned into a fraction of the
//! video's duration when the duration is known. Cancelling kills the child
//! and waits for it to exit, and the child is also killed if the run future
//! is dropped.

use super::{Transfer, TransferRequest};
use crate::error::{Error, Result};
use crate::progress::ProgressSink;

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Number of stderr lines kept for error reports.
const STDERR_TAIL_LINES: usize = 8;

/// Output formats that carry audio only.
const AUDIO_FORMATS: &[&str] = &["mp3", "ogg", "opus", "m4a", "flac", "wav"];

/// Configuration for [`FfmpegTransfer`].
#[derive(Debug, Clone)]
pub struct FfmpegConfig {
    /// Path to the ffmpeg binary.
    pub binary_path: PathBuf,
    /// Extra arguments inserted before the output path.
    pub extra_args: Vec<String>,
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        Self {
            binary_path: PathBuf::from("ffmpeg"),
            extra_args: Vec::new(),
        }
    }
}

/// Produces files by running ffmpeg over the option's stream URLs.
#[derive(Debug, Clone, Default)]
pub struct FfmpegTransfer {
    config: FfmpegConfig,
}

impl FfmpegTransfer {
    /// Create a transfer using `ffmpeg` from `PATH`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transfer with a custom configuration.
    pub fn with_config(config: FfmpegConfig) -> Self {
        Self { config }
    }

    /// Build the ffmpeg argument list for a request.
    pub fn build_args(&self, request: &TransferRequest) -> Vec<String> {
        let mut args = Vec::new();
        push_all(&mut args, &["-y", "-nostdin", "-nostats", "-loglevel", "error"]);
        push_all(&mut args, &["-progress", "pipe:1"]);

        let streams = request.option.stream_list();
        for stream in &streams {
            args.push("-i".to_string());
            args.push(stream.url.to_string());
        }

        let format = request.format.to_ascii_lowercase();
        if AUDIO_FORMATS.contains(&format.as_str()) {
            // The audio stream is the last input in every option shape.
            args.push("-map".to_string());
            args.push(format!("{}:a:0", streams.len().saturating_sub(1)));
            args.push("-vn".to_string());
            push_all(&mut args, audio_codec_args(&format));
        } else {
            if streams.len() > 1 {
                push_all(&mut args, &["-map", "0:v:0", "-map", "1:a:0"]);
            }
            let same_container = streams
                .iter()
                .all(|s| s.container.name().eq_ignore_ascii_case(&format));
            if same_container {
                push_all(&mut args, &["-c", "copy"]);
            } else if format == "webm" {
                push_all(&mut args, &["-c:v", "libvpx-vp9", "-c:a", "libopus"]);
            } else {
                push_all(&mut args, &["-c:v", "libx264", "-c:a", "aac"]);
            }
            push_all(&mut args, &["-preset", request.preset.as_str()]);
        }

        args.extend(self.config.extra_args.iter().cloned());
        args.push("-f".to_string());
        args.push(muxer(&format).to_string());
        args.push(request.path.to_string_lossy().into_owned());
        args
    }

    fn command(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.config.binary_path);
        cmd.args(args)
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(windows)]
        cmd.creation_flags(CREATE_NO_WINDOW);
        cmd
    }
}

fn push_all(args: &mut Vec<String>, items: &[&str]) {
    args.extend(items.iter().map(|s| s.to_string()));
}

fn audio_codec_args(format: &str) -> &'static [&'static str] {
    match format {
        "mp3" => &["-c:a", "libmp3lame", "-q:a", "2"],
        "ogg" | "opus" => &["-c:a", "libopus"],
        "m4a" => &["-c:a", "aac"],
        "flac" => &["-c:a", "flac"],
        _ => &[],
    }
}

/// ffmpeg muxer name for an output format.
fn muxer(format: &str) -> &str {
    match format {
        "m4a" => "ipod",
        other => other,
    }
}

/// Parse one `-progress` line into a completed fraction.
pub(crate) fn parse_progress(line: &str, duration: Option<Duration>) -> Option<f64> {
    let (key, value) = line.trim().split_once('=')?;
    match key {
        "progress" if value == "end" => Some(1.0),
        "out_time_ms" | "out_time_us" => {
            let total = duration?.as_micros();
            if total == 0 {
                return None;
            }
            let elapsed: u128 = value.trim().parse().ok()?;
            Some((elapsed as f64 / total as f64).clamp(0.0, 1.0))
        }
        _ => None,
    }
}

async fn kill(child: &mut Child) {
    if let Err(e) = child.kill().await {
        warn!("Failed to kill ffmpeg: {}", e);
    }
}

#[async_trait]
impl Transfer for FfmpegTransfer {
    async fn run(
        &self,
        request: &TransferRequest,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let args = self.build_args(request);
        info!("Starting ffmpeg for {} with args: {:?}", request.video.id, args);

        let mut child = self.command(&args).spawn().map_err(|e| {
            Error::Process(format!(
                "Failed to spawn {}: {}",
                self.config.binary_path.display(),
                e
            ))
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Process("Failed to capture ffmpeg stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::Process("Failed to capture ffmpeg stderr".to_string()))?;

        // Keep the tail of stderr for the failure message.
        let stderr_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
            while let Ok(Some(line)) = lines.next_line().await {
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
            Vec::from(tail).join("\n")
        });

        let duration = request.video.duration;
        let mut lines = BufReader::new(stdout).lines();
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("ffmpeg cancelled for {}", request.video.id);
                    kill(&mut child).await;
                    stderr_task.abort();
                    return Err(Error::Cancelled);
                }
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        if let Some(fraction) = parse_progress(&line, duration) {
                            progress.report(fraction);
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Error reading ffmpeg output for {}: {}", request.video.id, e);
                        break;
                    }
                }
            }
        }

        let status = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                kill(&mut child).await;
                stderr_task.abort();
                return Err(Error::Cancelled);
            }
            status = child.wait() => status?,
        };

        let stderr_tail = stderr_task.await.unwrap_or_default();
        if !status.success() {
            return Err(Error::Process(format!(
                "ffmpeg exited with {}: {}",
                status,
                stderr_tail.trim()
            )));
        }

        progress.report(1.0);
        debug!("ffmpeg finished {:?}", request.path);
        Ok(())
    }
}
