//! Job configuration builder and the worker payload shapes
//!
//! A [`JobConfiguration`] is built once per "process" action and is not
//! mutated while the worker runs. [`JobConfiguration::payload`] renders the
//! JSON document the worker reads from stdin:
//! `{ "files": [...], "config": { ...operation fields... } }`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::errors::DomainError;
use crate::domain::model::MediaFileRef;
use crate::domain::timeline::Timeline;

/// How a file is divided by the split worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMethod {
    /// `value` is the segment length in seconds
    Duration,
    /// `value` is the number of segments
    Segments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SplitSettings {
    pub method: SplitMethod,
    pub value: f64,
    pub fps: f64,
    pub parallel_jobs: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeparateSettings {
    pub sample_rate: u32,
    pub parallel_jobs: u32,
}

/// Largest accepted `ResolutionMode::Scale` percentage
pub const MAX_SCALE_PERCENT: u32 = 400;

/// GIF output size selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionMode {
    Original,
    Scale { percent: u32 },
    Width { width: u32 },
    Custom { width: u32, height: u32 },
}

impl ResolutionMode {
    /// Output dimensions for a source of `width` x `height`
    ///
    /// Computed dimensions saturate at the largest even `u32`.
    pub fn output_size(&self, width: u32, height: u32) -> (u32, u32) {
        const MAX_EVEN: u64 = (u32::MAX - 1) as u64;
        let round_up_even = |v: u64| (v + v % 2).min(MAX_EVEN) as u32;
        match *self {
            ResolutionMode::Original => (width, height),
            ResolutionMode::Scale { percent } => (
                round_up_even(width as u64 * percent as u64 / 100),
                round_up_even(height as u64 * percent as u64 / 100),
            ),
            ResolutionMode::Width { width: target } => {
                if width == 0 {
                    return (target, height);
                }
                let scaled = height as f64 * target as f64 / width as f64;
                let even = ((scaled / 2.0).round() * 2.0).min(MAX_EVEN as f64) as u32;
                (target, even.max(2))
            }
            ResolutionMode::Custom { width, height } => (width, height),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DitherMethod {
    FloydSteinberg,
    Bayer,
    #[serde(rename = "sierra2_4a")]
    Sierra24a,
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GifSettings {
    pub resolution: ResolutionMode,
    pub frame_rate: f64,
    pub speed_multiplier: f64,
    /// 0 loops forever
    pub loop_count: u32,
    pub dither: DitherMethod,
    pub color_count: u32,
}

/// Batch-wide settings; the variant selects the operation family
#[derive(Debug, Clone, PartialEq)]
pub enum GlobalSettings {
    Split(SplitSettings),
    Separate(SeparateSettings),
    Gif(GifSettings),
}

impl GlobalSettings {
    pub fn operation(&self) -> Operation {
        match self {
            GlobalSettings::Split(_) => Operation::Split,
            GlobalSettings::Separate(_) => Operation::Separate,
            GlobalSettings::Gif(_) => Operation::Gif,
        }
    }

    fn validate(&self) -> Result<(), DomainError> {
        let check = |ok: bool, message: &str| {
            if ok {
                Ok(())
            } else {
                Err(DomainError::BadArgs(message.to_string()))
            }
        };

        match self {
            GlobalSettings::Split(s) => {
                check(s.value.is_finite() && s.value > 0.0, "Split value must be positive")?;
                if s.method == SplitMethod::Segments {
                    check(s.value.fract() == 0.0, "Segment count must be a whole number")?;
                }
                check(s.fps.is_finite() && s.fps > 0.0, "Frame rate must be positive")?;
                check(s.parallel_jobs >= 1, "Parallel jobs must be at least 1")
            }
            GlobalSettings::Separate(s) => {
                check(s.sample_rate > 0, "Sample rate must be positive")?;
                check(s.parallel_jobs >= 1, "Parallel jobs must be at least 1")
            }
            GlobalSettings::Gif(s) => {
                check(s.frame_rate.is_finite() && s.frame_rate > 0.0, "Frame rate must be positive")?;
                check(
                    s.speed_multiplier.is_finite() && s.speed_multiplier > 0.0,
                    "Speed multiplier must be positive",
                )?;
                check((2..=256).contains(&s.color_count), "Color count must be between 2 and 256")?;
                match s.resolution {
                    ResolutionMode::Scale { percent } => check(
                        (1..=MAX_SCALE_PERCENT).contains(&percent),
                        "Scale percent must be between 1 and 400",
                    ),
                    ResolutionMode::Width { width } => check(width > 0, "Width must be positive"),
                    ResolutionMode::Custom { width, height } => {
                        check(width > 0 && height > 0, "Custom dimensions must be positive")
                    }
                    ResolutionMode::Original => Ok(()),
                }
            }
        }
    }
}

/// Operation family, used to pick the worker command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Split,
    Separate,
    Gif,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Split => write!(f, "split"),
            Operation::Separate => write!(f, "separate"),
            Operation::Gif => write!(f, "gif"),
        }
    }
}

/// Per-file value replacing the global one
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileOverride {
    FrameRate(f64),
    SampleRate(u32),
}

/// Per-file override table as edited by the user
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerFileOverrides {
    /// "per file" mode; when off every file uses the global value
    pub enabled: bool,
    pub values: BTreeMap<String, FileOverride>,
}

impl PerFileOverrides {
    pub fn per_file() -> Self {
        Self { enabled: true, values: BTreeMap::new() }
    }

    pub fn with(mut self, file_id: impl Into<String>, value: FileOverride) -> Self {
        self.values.insert(file_id.into(), value);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum OverrideMode {
    Single,
    PerFile,
}

/// Trim and cut output of the timeline, as sent to the worker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelinePayload {
    pub trim_start: f64,
    pub trim_end: Option<f64>,
    pub cut_segments: Vec<CutPayload>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CutPayload {
    pub start: f64,
    pub end: f64,
}

impl From<&Timeline> for TimelinePayload {
    fn from(timeline: &Timeline) -> Self {
        let trim = timeline.trim();
        Self {
            trim_start: trim.start,
            trim_end: trim.end,
            cut_segments: timeline
                .segments()
                .iter()
                .map(|segment| CutPayload { start: segment.start, end: segment.end })
                .collect(),
        }
    }
}

impl Default for TimelinePayload {
    fn default() -> Self {
        Self { trim_start: 0.0, trim_end: None, cut_segments: Vec::new() }
    }
}

/// Immutable configuration for one worker invocation
#[derive(Debug, Clone, PartialEq)]
pub struct JobConfiguration {
    files: Vec<MediaFileRef>,
    settings: GlobalSettings,
    per_file_mode: bool,
    /// Complete map (every file present) when `per_file_mode` is on
    overrides: BTreeMap<String, FileOverride>,
    timeline: Option<TimelinePayload>,
}

impl JobConfiguration {
    /// Assemble a configuration from the UI state
    ///
    /// In per-file mode every file gets an entry: its explicit override or the
    /// global value. The timeline only applies to GIF export.
    pub fn build(
        files: Vec<MediaFileRef>,
        settings: GlobalSettings,
        overrides: &PerFileOverrides,
        timeline: Option<&Timeline>,
    ) -> Result<Self, DomainError> {
        if files.is_empty() {
            return Err(DomainError::BadArgs("No files to process".to_string()));
        }
        settings.validate()?;

        for (id, value) in &overrides.values {
            Self::check_override(&settings, id, value)?;
            if !files.iter().any(|file| &file.id == id) {
                warn!(file = %id, "Ignoring override for a file outside the batch");
            }
        }

        let per_file_mode = overrides.enabled && settings.operation() != Operation::Gif;
        let resolved = if per_file_mode {
            let fallback = Self::global_override(&settings);
            files
                .iter()
                .filter_map(|file| {
                    overrides
                        .values
                        .get(&file.id)
                        .copied()
                        .or(fallback)
                        .map(|value| (file.id.clone(), value))
                })
                .collect()
        } else {
            BTreeMap::new()
        };

        let timeline = match (&settings, timeline) {
            (GlobalSettings::Gif(_), Some(timeline)) => {
                timeline.validate()?;
                if timeline.effective_duration() <= 0.0 {
                    return Err(DomainError::InvalidTimeRange(
                        "No content remaining after cuts".to_string(),
                    ));
                }
                Some(TimelinePayload::from(timeline))
            }
            (GlobalSettings::Gif(_), None) => Some(TimelinePayload::default()),
            (_, Some(_)) => {
                debug!(operation = %settings.operation(), "Timeline ignored for this operation");
                None
            }
            (_, None) => None,
        };

        Ok(Self {
            files,
            settings,
            per_file_mode,
            overrides: resolved,
            timeline,
        })
    }

    pub fn files(&self) -> &[MediaFileRef] {
        &self.files
    }

    pub fn settings(&self) -> &GlobalSettings {
        &self.settings
    }

    pub fn operation(&self) -> Operation {
        self.settings.operation()
    }

    pub fn is_per_file(&self) -> bool {
        self.per_file_mode
    }

    /// Resolved override for a file, present for every file in per-file mode
    pub fn override_for(&self, file_id: &str) -> Option<FileOverride> {
        self.overrides.get(file_id).copied()
    }

    pub fn timeline(&self) -> Option<&TimelinePayload> {
        self.timeline.as_ref()
    }

    /// Document written to the worker's stdin
    pub fn payload(&self) -> WorkerPayload {
        let files = self
            .files
            .iter()
            .map(|file| file.path.to_string_lossy().to_string())
            .collect();
        let mode = if self.per_file_mode {
            OverrideMode::PerFile
        } else {
            OverrideMode::Single
        };

        let config = match &self.settings {
            GlobalSettings::Split(s) => OperationPayload::Split(SplitPayload {
                split_method: s.method,
                split_value: s.value,
                fps_mode: mode,
                fps_value: s.fps,
                fps_values: self
                    .overrides
                    .iter()
                    .filter_map(|(id, value)| match value {
                        FileOverride::FrameRate(fps) => Some((id.clone(), *fps)),
                        FileOverride::SampleRate(_) => None,
                    })
                    .collect(),
                parallel_jobs: s.parallel_jobs,
            }),
            GlobalSettings::Separate(s) => OperationPayload::Separate(SeparatePayload {
                sample_rate_mode: mode,
                sample_rate: s.sample_rate,
                sample_rates: self
                    .overrides
                    .iter()
                    .filter_map(|(id, value)| match value {
                        FileOverride::SampleRate(rate) => Some((id.clone(), *rate)),
                        FileOverride::FrameRate(_) => None,
                    })
                    .collect(),
                parallel_jobs: s.parallel_jobs,
            }),
            GlobalSettings::Gif(s) => OperationPayload::Gif(GifPayload {
                resolution: ResolutionPayload::from(s.resolution),
                frame_rate: s.frame_rate,
                speed_multiplier: s.speed_multiplier,
                loop_count: s.loop_count,
                dither_method: s.dither,
                color_count: s.color_count,
                timeline: self.timeline.clone().unwrap_or_default(),
            }),
        };

        WorkerPayload { files, config }
    }

    /// Serialized payload bytes
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.payload())
    }

    fn global_override(settings: &GlobalSettings) -> Option<FileOverride> {
        match settings {
            GlobalSettings::Split(s) => Some(FileOverride::FrameRate(s.fps)),
            GlobalSettings::Separate(s) => Some(FileOverride::SampleRate(s.sample_rate)),
            GlobalSettings::Gif(_) => None,
        }
    }

    fn check_override(settings: &GlobalSettings, id: &str, value: &FileOverride) -> Result<(), DomainError> {
        match (settings, value) {
            (GlobalSettings::Split(_), FileOverride::FrameRate(fps)) => {
                if fps.is_finite() && *fps > 0.0 {
                    Ok(())
                } else {
                    Err(DomainError::BadArgs(format!("Frame rate for {} must be positive", id)))
                }
            }
            (GlobalSettings::Separate(_), FileOverride::SampleRate(rate)) => {
                if *rate > 0 {
                    Ok(())
                } else {
                    Err(DomainError::BadArgs(format!("Sample rate for {} must be positive", id)))
                }
            }
            (settings, value) => Err(DomainError::UnsupportedOverride(format!(
                "{:?} for {} with {} operation",
                value,
                id,
                settings.operation()
            ))),
        }
    }
}

/// Top-level worker input document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerPayload {
    pub files: Vec<String>,
    pub config: OperationPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OperationPayload {
    Split(SplitPayload),
    Separate(SeparatePayload),
    Gif(GifPayload),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitPayload {
    split_method: SplitMethod,
    split_value: f64,
    fps_mode: OverrideMode,
    fps_value: f64,
    fps_values: BTreeMap<String, f64>,
    parallel_jobs: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeparatePayload {
    sample_rate_mode: OverrideMode,
    sample_rate: u32,
    sample_rates: BTreeMap<String, u32>,
    parallel_jobs: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GifPayload {
    resolution: ResolutionPayload,
    frame_rate: f64,
    speed_multiplier: f64,
    loop_count: u32,
    dither_method: DitherMethod,
    color_count: u32,
    #[serde(flatten)]
    timeline: TimelinePayload,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct ResolutionPayload {
    mode: &'static str,
    #[serde(rename = "scalePercent", skip_serializing_if = "Option::is_none")]
    scale_percent: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    height: Option<u32>,
}

impl From<ResolutionMode> for ResolutionPayload {
    fn from(mode: ResolutionMode) -> Self {
        let empty = |mode| Self { mode, scale_percent: None, width: None, height: None };
        match mode {
            ResolutionMode::Original => empty("original"),
            ResolutionMode::Scale { percent } => Self { scale_percent: Some(percent), ..empty("scale") },
            ResolutionMode::Width { width } => Self { width: Some(width), ..empty("width") },
            ResolutionMode::Custom { width, height } => Self {
                width: Some(width),
                height: Some(height),
                ..empty("custom")
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn files(names: &[&str]) -> Vec<MediaFileRef> {
        names
            .iter()
            .map(|name| MediaFileRef::from_path(format!("/media/{}", name)).unwrap())
            .collect()
    }

    fn split_settings() -> GlobalSettings {
        GlobalSettings::Split(SplitSettings {
            method: SplitMethod::Duration,
            value: 60.0,
            fps: 30.0,
            parallel_jobs: 2,
        })
    }

    fn gif_settings() -> GlobalSettings {
        GlobalSettings::Gif(GifSettings {
            resolution: ResolutionMode::Width { width: 480 },
            frame_rate: 15.0,
            speed_multiplier: 1.0,
            loop_count: 0,
            dither: DitherMethod::FloydSteinberg,
            color_count: 256,
        })
    }

    #[test]
    fn test_build_rejects_empty_file_list() {
        let result = JobConfiguration::build(vec![], split_settings(), &PerFileOverrides::default(), None);
        assert!(matches!(result, Err(DomainError::BadArgs(_))));
    }

    #[test]
    fn test_split_payload_single_mode() {
        let job = JobConfiguration::build(
            files(&["a.mp4", "b.mov", "c.mkv"]),
            split_settings(),
            &PerFileOverrides::default(),
            None,
        )
        .unwrap();

        let payload = serde_json::to_value(job.payload()).unwrap();
        assert_eq!(
            payload,
            json!({
                "files": ["/media/a.mp4", "/media/b.mov", "/media/c.mkv"],
                "config": {
                    "split_method": "duration",
                    "split_value": 60.0,
                    "fps_mode": "single",
                    "fps_value": 30.0,
                    "fps_values": {},
                    "parallel_jobs": 2
                }
            })
        );
        assert!(job.override_for("a.mp4").is_none());
    }

    #[test]
    fn test_per_file_mode_fills_every_file() {
        let overrides = PerFileOverrides::per_file().with("b.mov", FileOverride::FrameRate(24.0));
        let job = JobConfiguration::build(files(&["a.mp4", "b.mov"]), split_settings(), &overrides, None).unwrap();

        assert!(job.is_per_file());
        assert_eq!(job.override_for("a.mp4"), Some(FileOverride::FrameRate(30.0)));
        assert_eq!(job.override_for("b.mov"), Some(FileOverride::FrameRate(24.0)));

        let payload = serde_json::to_value(job.payload()).unwrap();
        assert_eq!(payload["config"]["fps_mode"], "per_file");
        assert_eq!(payload["config"]["fps_values"], json!({"a.mp4": 30.0, "b.mov": 24.0}));
    }

    #[test]
    fn test_separate_payload_per_file_sample_rates() {
        let settings = GlobalSettings::Separate(SeparateSettings { sample_rate: 48000, parallel_jobs: 4 });
        let overrides = PerFileOverrides::per_file().with("a.mp4", FileOverride::SampleRate(44100));
        let job = JobConfiguration::build(files(&["a.mp4", "b.mp4"]), settings, &overrides, None).unwrap();

        let payload = serde_json::to_value(job.payload()).unwrap();
        assert_eq!(
            payload["config"],
            json!({
                "sample_rate_mode": "per_file",
                "sample_rate": 48000,
                "sample_rates": {"a.mp4": 44100, "b.mp4": 48000},
                "parallel_jobs": 4
            })
        );
    }

    #[test]
    fn test_mismatched_override_rejected() {
        let overrides = PerFileOverrides::per_file().with("a.mp4", FileOverride::SampleRate(44100));
        let result = JobConfiguration::build(files(&["a.mp4"]), split_settings(), &overrides, None);
        assert!(matches!(result, Err(DomainError::UnsupportedOverride(_))));
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let settings = GlobalSettings::Split(SplitSettings {
            method: SplitMethod::Segments,
            value: 2.5,
            fps: 30.0,
            parallel_jobs: 1,
        });
        assert!(JobConfiguration::build(files(&["a.mp4"]), settings, &PerFileOverrides::default(), None).is_err());

        let settings = GlobalSettings::Separate(SeparateSettings { sample_rate: 48000, parallel_jobs: 0 });
        assert!(JobConfiguration::build(files(&["a.mp4"]), settings, &PerFileOverrides::default(), None).is_err());
    }

    #[test]
    fn test_gif_payload_carries_timeline() {
        let timeline = Timeline::new(30.0)
            .unwrap()
            .with_trim_start(2.0)
            .with_trim_end(20.0)
            .with_cut_range(5.0, 8.0)
            .unwrap();
        let job = JobConfiguration::build(
            files(&["a.mp4"]),
            gif_settings(),
            &PerFileOverrides::default(),
            Some(&timeline),
        )
        .unwrap();

        let payload = serde_json::to_value(job.payload()).unwrap();
        assert_eq!(
            payload["config"],
            json!({
                "resolution": {"mode": "width", "width": 480},
                "frame_rate": 15.0,
                "speed_multiplier": 1.0,
                "loop_count": 0,
                "dither_method": "floyd_steinberg",
                "color_count": 256,
                "trim_start": 2.0,
                "trim_end": 20.0,
                "cut_segments": [{"start": 5.0, "end": 8.0}]
            })
        );
    }

    #[test]
    fn test_gif_without_timeline_uses_full_duration() {
        let job = JobConfiguration::build(files(&["a.mp4"]), gif_settings(), &PerFileOverrides::default(), None)
            .unwrap();
        let payload = serde_json::to_value(job.payload()).unwrap();
        assert_eq!(payload["config"]["trim_start"], 0.0);
        assert!(payload["config"]["trim_end"].is_null());
        assert_eq!(payload["config"]["cut_segments"], json!([]));
    }

    #[test]
    fn test_gif_rejects_timeline_with_nothing_left() {
        let timeline = Timeline::new(10.0)
            .unwrap()
            .with_trim_end(1.0)
            .with_cut_range(0.0, 1.0)
            .unwrap();
        let result = JobConfiguration::build(
            files(&["a.mp4"]),
            gif_settings(),
            &PerFileOverrides::default(),
            Some(&timeline),
        );
        assert!(matches!(result, Err(DomainError::InvalidTimeRange(_))));
    }

    #[test]
    fn test_timeline_ignored_for_split() {
        let timeline = Timeline::new(10.0).unwrap();
        let job = JobConfiguration::build(
            files(&["a.mp4"]),
            split_settings(),
            &PerFileOverrides::default(),
            Some(&timeline),
        )
        .unwrap();
        assert!(job.timeline().is_none());
    }

    #[test]
    fn test_resolution_output_size() {
        assert_eq!(ResolutionMode::Original.output_size(1920, 1080), (1920, 1080));
        assert_eq!(ResolutionMode::Scale { percent: 50 }.output_size(1920, 1080), (960, 540));
        assert_eq!(ResolutionMode::Scale { percent: 33 }.output_size(1280, 720), (422, 238));
        assert_eq!(ResolutionMode::Width { width: 480 }.output_size(1920, 1080), (480, 270));
        assert_eq!(ResolutionMode::Width { width: 500 }.output_size(1920, 1080), (500, 282));
        assert_eq!(
            ResolutionMode::Custom { width: 640, height: 480 }.output_size(1920, 1080),
            (640, 480)
        );
    }

    #[test]
    fn test_output_size_saturates_on_extreme_inputs() {
        let (w, h) = ResolutionMode::Scale { percent: 5_000_000 }.output_size(u32::MAX, 1080);
        assert_eq!(w, u32::MAX - 1);
        assert_eq!(h, 54_000_000);
        assert_eq!(ResolutionMode::Scale { percent: 1 }.output_size(101, 3), (2, 0));
        assert_eq!(
            ResolutionMode::Width { width: u32::MAX }.output_size(1, u32::MAX),
            (u32::MAX, u32::MAX - 1)
        );
        assert_eq!(ResolutionMode::Width { width: 4 }.output_size(1920, 10), (4, 2));
    }

    #[test]
    fn test_scale_percent_bounds() {
        let with_percent = |percent| {
            let GlobalSettings::Gif(settings) = gif_settings() else {
                unreachable!()
            };
            GlobalSettings::Gif(GifSettings {
                resolution: ResolutionMode::Scale { percent },
                ..settings
            })
        };
        let build = |percent| {
            JobConfiguration::build(files(&["a.mp4"]), with_percent(percent), &PerFileOverrides::default(), None)
        };

        assert!(build(1).is_ok());
        assert!(build(MAX_SCALE_PERCENT).is_ok());
        assert!(matches!(build(0), Err(DomainError::BadArgs(_))));
        assert!(matches!(build(MAX_SCALE_PERCENT + 1), Err(DomainError::BadArgs(_))));
        assert!(matches!(build(5_000_000), Err(DomainError::BadArgs(_))));
    }
}
