//! FFprobe adapter for media file probing
//!
//! Runs `ffprobe` with JSON output and maps the first video and audio streams
//! into [`Metadata`]. Fields that cannot be read are probe errors; no default
//! duration or frame rate is ever substituted.

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::domain::model::{AudioInfo, Metadata};
use crate::error::{ClipBatchError, ClipBatchResult};
use crate::ports::ProbePort;

/// FFprobe-based probe adapter
pub struct FFprobeAdapter {
    program: String,
}

impl FFprobeAdapter {
    /// Create an adapter running the given ffprobe binary
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }
}

impl Default for FFprobeAdapter {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

#[async_trait]
impl ProbePort for FFprobeAdapter {
    async fn probe(&self, path: &Path) -> ClipBatchResult<Metadata> {
        if !path.exists() {
            return Err(probe_error(format!("File not found: {}", path.display())));
        }

        let output = tokio::process::Command::new(&self.program)
            .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ClipBatchError::Launch {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(probe_error(format!(
                "ffprobe failed for {}: {}",
                path.display(),
                stderr.trim()
            )));
        }

        debug!(file = %path.display(), bytes = output.stdout.len(), "ffprobe output received");
        parse_probe_output(&output.stdout)
    }
}

#[derive(Debug, Deserialize)]
struct FFprobeOutput {
    #[serde(default)]
    streams: Vec<FFprobeStream>,
    format: Option<FFprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FFprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    sample_rate: Option<String>,
    channels: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct FFprobeFormat {
    duration: Option<String>,
    bit_rate: Option<String>,
}

/// Map ffprobe's JSON document into metadata
pub fn parse_probe_output(stdout: &[u8]) -> ClipBatchResult<Metadata> {
    let probe: FFprobeOutput = serde_json::from_slice(stdout)
        .map_err(|e| probe_error(format!("Failed to parse ffprobe output: {}", e)))?;

    let format = probe
        .format
        .ok_or_else(|| probe_error("ffprobe reported no format section"))?;
    let duration = format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| probe_error("Could not determine duration"))?;
    let bit_rate = format
        .bit_rate
        .as_deref()
        .and_then(|b| b.parse::<u64>().ok())
        .unwrap_or(0);

    let video = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| probe_error("No video stream found"))?;
    let width = video.width.ok_or_else(|| probe_error("Could not determine video width"))?;
    let height = video.height.ok_or_else(|| probe_error("Could not determine video height"))?;
    let frame_rate = video
        .avg_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .or_else(|| video.r_frame_rate.as_deref().and_then(parse_frame_rate))
        .ok_or_else(|| probe_error("Could not determine frame rate"))?;

    let mut metadata = Metadata::new(
        duration,
        frame_rate,
        bit_rate,
        width,
        height,
        video.codec_name.clone().unwrap_or_else(|| "unknown".to_string()),
    )?;

    if let Some(audio) = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"))
    {
        metadata = metadata.with_audio(AudioInfo {
            sample_rate: audio.sample_rate.as_deref().and_then(|r| r.parse().ok()),
            channels: audio.channels,
            codec: audio.codec_name.clone(),
        });
    }

    Ok(metadata)
}

/// Parse an ffprobe rate such as `30000/1001` or `25`
///
/// `0/0` (unknown) yields `None`.
pub fn parse_frame_rate(rate: &str) -> Option<f64> {
    let value = match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => rate.trim().parse().ok()?,
    };
    (value.is_finite() && value > 0.0).then_some(value)
}

fn probe_error(message: impl Into<String>) -> ClipBatchError {
    ClipBatchError::Probe {
        message: message.into(),
    }
}
