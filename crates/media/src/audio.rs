//! Audio resolver: trims a clip out of a local file or a video URL.
//!
//! Trimming and transcoding run in an external `ffmpeg`. Video page URLs
//! are first turned into a direct audio stream URL by `yt-dlp`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use connect_core::DataUri;

use crate::error::MediaError;
use crate::images::encode_data_uri;

pub const AUDIO_MIME: &str = "audio/mpeg";

pub struct AudioResolver {
    ffmpeg: PathBuf,
    yt_dlp: PathBuf,
}

impl AudioResolver {
    pub fn new(ffmpeg: impl Into<PathBuf>, yt_dlp: impl Into<PathBuf>) -> Self {
        AudioResolver {
            ffmpeg: ffmpeg.into(),
            yt_dlp: yt_dlp.into(),
        }
    }

    /// Clip `[start, start + duration)` seconds of the video at `url`.
    pub fn fetch_remote(&self, url: &str, start: u32, duration: u32) -> Result<DataUri, MediaError> {
        tracing::info!(url, start, duration, "downloading audio");
        let stream = self.stream_url(url)?;
        self.extract(url, OsString::from(stream), start, duration)
    }

    /// Clip `[start, start + duration)` seconds of a local file.
    pub fn clip_local(&self, path: &Path, start: u32, duration: u32) -> Result<DataUri, MediaError> {
        let reference = path.display().to_string();
        std::fs::metadata(path).map_err(|source| MediaError::Io {
            path: reference.clone(),
            source,
        })?;
        tracing::info!(path = %reference, start, duration, "processing audio");
        self.extract(&reference, path.as_os_str().to_owned(), start, duration)
    }

    fn stream_url(&self, url: &str) -> Result<String, MediaError> {
        let stdout = run(&self.yt_dlp, url, yt_dlp_args(url))?;
        let text = String::from_utf8_lossy(&stdout);
        text.lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(str::to_owned)
            .ok_or_else(|| MediaError::Tool {
                tool: self.yt_dlp.display().to_string(),
                reference: url.to_owned(),
                message: "no audio stream found".to_owned(),
            })
    }

    fn extract(
        &self,
        reference: &str,
        input: OsString,
        start: u32,
        duration: u32,
    ) -> Result<DataUri, MediaError> {
        let out = tempfile::Builder::new()
            .prefix("connect-clip-")
            .suffix(".mp3")
            .tempfile()
            .map_err(|source| MediaError::Io {
                path: std::env::temp_dir().display().to_string(),
                source,
            })?;
        run(
            &self.ffmpeg,
            reference,
            ffmpeg_args(input, start, duration, out.path()),
        )?;
        let bytes = std::fs::read(out.path()).map_err(|source| MediaError::Io {
            path: out.path().display().to_string(),
            source,
        })?;
        if bytes.is_empty() {
            return Err(MediaError::Tool {
                tool: self.ffmpeg.display().to_string(),
                reference: reference.to_owned(),
                message: "produced an empty clip".to_owned(),
            });
        }
        Ok(encode_data_uri(AUDIO_MIME, &bytes))
    }
}

fn yt_dlp_args(url: &str) -> Vec<OsString> {
    ["--no-playlist", "--quiet", "-f", "bestaudio", "--get-url", url]
        .into_iter()
        .map(OsString::from)
        .collect()
}

fn ffmpeg_args(input: OsString, start: u32, duration: u32, output: &Path) -> Vec<OsString> {
    let start = start.to_string();
    let duration = duration.to_string();
    let mut args: Vec<OsString> = [
        "-hide_banner",
        "-loglevel",
        "error",
        "-y",
        "-ss",
        start.as_str(),
        "-t",
        duration.as_str(),
        "-i",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();
    args.push(input);
    args.extend(
        ["-vn", "-codec:a", "libmp3lame", "-f", "mp3"]
            .into_iter()
            .map(OsString::from),
    );
    args.push(output.as_os_str().to_owned());
    args
}

fn run(tool: &Path, reference: &str, args: Vec<OsString>) -> Result<Vec<u8>, MediaError> {
    let tool_err = |message: String| MediaError::Tool {
        tool: tool.display().to_string(),
        reference: reference.to_owned(),
        message,
    };
    tracing::debug!(tool = %tool.display(), ?args, "running");
    let output = Command::new(tool)
        .args(&args)
        .output()
        .map_err(|e| tool_err(format!("cannot run: {}", e)))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(tool_err(format!(
            "exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }
    Ok(output.stdout)
}
