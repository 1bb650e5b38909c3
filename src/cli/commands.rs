//! Command implementations

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::adapters::toml_config::AppConfig;
use crate::adapters::FFprobeAdapter;
use crate::app::{BatchInteractor, BatchSummary, MediaLibrary};
use crate::cli::args::{GifArgs, InputArgs, ProbeArgs, SeparateArgs, SplitArgs};
use crate::domain::model::BatchStatus;
use crate::domain::timeline::Timeline;
use crate::engine::progress::{ConsoleObserver, JsonObserver, ProgressObserver, ProgressTracker};
use crate::engine::worker::WorkerCommand;
use crate::job::{
    FileOverride, GifSettings, GlobalSettings, JobConfiguration, Operation, PerFileOverrides,
    ResolutionMode, SeparateSettings, SplitMethod, SplitSettings,
};
use crate::utils::time::TimeParser;
use crate::utils::Utils;

/// Exit code for a batch stopped by cancellation
pub const EXIT_CANCELLED: i32 = 130;

/// Settings shared by every command, resolved from config and global flags
pub struct CommandContext {
    pub config: AppConfig,
    pub json: bool,
    pub verbose: bool,
    pub dry_run: bool,
    pub worker: Option<WorkerCommand>,
    pub timeout: Option<Duration>,
}

impl CommandContext {
    fn worker_for(&self, operation: Operation) -> Result<WorkerCommand> {
        self.worker
            .clone()
            .or_else(|| self.config.worker_command(operation))
            .ok_or_else(|| {
                anyhow!(
                    "No worker configured for {}: set [worker.{}] in the config or pass --worker",
                    operation,
                    operation
                )
            })
    }

    fn observer(&self) -> Arc<dyn ProgressObserver> {
        if self.json {
            Arc::new(JsonObserver)
        } else {
            Arc::new(ConsoleObserver::new(self.verbose))
        }
    }
}

/// Execute the split command
pub async fn split(ctx: &CommandContext, args: SplitArgs) -> Result<i32> {
    let files = expand_inputs(&args.input)?;
    let fps = args.fps.unwrap_or(ctx.config.defaults.fps);
    let (method, value) = match (&args.duration, args.segments) {
        (Some(duration), _) => (SplitMethod::Duration, TimeParser::parse_time(duration)?),
        (None, Some(count)) => (SplitMethod::Segments, count as f64),
        (None, None) => bail!("Either --duration or --segments is required"),
    };

    let settings = GlobalSettings::Split(SplitSettings {
        method,
        value,
        fps,
        parallel_jobs: args.jobs.unwrap_or(ctx.config.defaults.parallel_jobs),
    });
    let overrides = parse_overrides(&args.fps_for, FileOverride::FrameRate)?;

    run_batch(ctx, files, settings, &overrides, None).await
}

/// Execute the separate command
pub async fn separate(ctx: &CommandContext, args: SeparateArgs) -> Result<i32> {
    let files = expand_inputs(&args.input)?;
    let settings = GlobalSettings::Separate(SeparateSettings {
        sample_rate: args.sample_rate.unwrap_or(ctx.config.defaults.sample_rate),
        parallel_jobs: args.jobs.unwrap_or(ctx.config.defaults.parallel_jobs),
    });
    let overrides = parse_overrides(&args.rate_for, FileOverride::SampleRate)?;

    run_batch(ctx, files, settings, &overrides, None).await
}

/// Execute the gif command
pub async fn gif(ctx: &CommandContext, args: GifArgs) -> Result<i32> {
    let files = expand_inputs(&args.input)?;

    let resolution = match (args.scale, args.width, &args.size) {
        (Some(percent), _, _) => ResolutionMode::Scale { percent },
        (_, Some(width), _) => ResolutionMode::Width { width },
        (_, _, Some(size)) => {
            let (width, height) = parse_size(size)?;
            ResolutionMode::Custom { width, height }
        }
        _ => ResolutionMode::Original,
    };
    let settings = GlobalSettings::Gif(GifSettings {
        resolution,
        frame_rate: args.fps.unwrap_or(ctx.config.defaults.gif_frame_rate),
        speed_multiplier: args.speed,
        loop_count: args.loop_count,
        dither: args.dither.into(),
        color_count: args.colors.unwrap_or(ctx.config.defaults.color_count),
    });

    let needs_timeline = args.trim_start.is_some() || args.trim_end.is_some() || !args.cut.is_empty();
    let timeline = if needs_timeline {
        let mut library = MediaLibrary::new();
        for file in &files {
            library.add(file)?;
        }
        library
            .probe_all(Arc::new(FFprobeAdapter::new(&ctx.config.probe.ffprobe)))
            .await;
        let duration = library
            .shortest_duration()
            .context("Could not determine media duration for trimming")?;
        Some(build_timeline(duration, &args)?)
    } else {
        None
    };

    run_batch(ctx, files, settings, &PerFileOverrides::default(), timeline.as_ref()).await
}

/// Execute the probe command
pub async fn probe(ctx: &CommandContext, args: ProbeArgs) -> Result<i32> {
    let mut library = MediaLibrary::new();
    for file in expand_inputs(&args.input)? {
        library.add(file)?;
    }
    library
        .probe_all(Arc::new(FFprobeAdapter::new(&ctx.config.probe.ffprobe)))
        .await;

    let mut failures = 0;
    for entry in library.entries() {
        match (&entry.metadata, &entry.probe_error) {
            (Some(metadata), _) => {
                if ctx.json {
                    let line = serde_json::json!({ "file": entry.file.id, "metadata": metadata });
                    println!("{}", line);
                } else {
                    let audio = metadata
                        .audio
                        .as_ref()
                        .and_then(|audio| audio.sample_rate)
                        .map(|rate| format!("{} Hz", rate))
                        .unwrap_or_else(|| "no audio".to_string());
                    println!(
                        "{}: {} {}x{} {:.3} fps {} ({})",
                        entry.file.id,
                        TimeParser::format_time(metadata.duration),
                        metadata.width,
                        metadata.height,
                        metadata.frame_rate,
                        metadata.video_codec,
                        audio
                    );
                }
            }
            (None, error) => {
                failures += 1;
                let message = error.as_deref().unwrap_or("not probed");
                if ctx.json {
                    println!("{}", serde_json::json!({ "file": entry.file.id, "error": message }));
                } else {
                    println!("{}: {}", entry.file.id, message);
                }
            }
        }
    }

    Ok(if failures == 0 { 0 } else { 1 })
}

async fn run_batch(
    ctx: &CommandContext,
    files: Vec<PathBuf>,
    settings: GlobalSettings,
    overrides: &PerFileOverrides,
    timeline: Option<&Timeline>,
) -> Result<i32> {
    let mut library = MediaLibrary::new();
    for file in files {
        library.add(file)?;
    }
    let operation = settings.operation();
    let job = JobConfiguration::build(library.files(), settings, overrides, timeline)?;

    if ctx.dry_run {
        let payload = serde_json::to_string_pretty(&job.payload())?;
        println!("{}", payload);
        return Ok(0);
    }

    let command = ctx.worker_for(operation)?;
    let tracker = ProgressTracker::new();
    tracker.add_observer(ctx.observer());
    let interactor = BatchInteractor::new(tracker).with_deadline(ctx.timeout);

    let controller = interactor.controller();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling batch");
            controller.cancel();
        }
    });

    let result = interactor.process(&command, &job).await;
    ctrl_c.abort();
    let summary = result?;

    report(ctx, &summary);
    Ok(exit_code(&summary))
}

fn report(ctx: &CommandContext, summary: &BatchSummary) {
    if ctx.json {
        let line = serde_json::json!({
            "event": "summary",
            "status": summary.status,
            "succeeded": summary.succeeded(),
            "failed": summary.failed(),
            "reported": summary.reported,
            "elapsed_secs": summary.elapsed.as_secs_f64(),
            "timed_out": summary.timed_out,
            "timestamp": chrono::Utc::now().to_rfc3339()
        });
        println!("{}", line);
        return;
    }

    println!("{} in {}", summary, Utils::format_duration(summary.elapsed));
    if let crate::error::RunOutcome::WorkerFailed { stderr_tail, .. } = &summary.outcome {
        for line in stderr_tail {
            eprintln!("  {}", line);
        }
    }
}

fn exit_code(summary: &BatchSummary) -> i32 {
    match summary.status {
        BatchStatus::Cancelled => EXIT_CANCELLED,
        _ if summary.is_success() => 0,
        _ => 1,
    }
}

/// Expand directories into the video files below them
fn expand_inputs(args: &InputArgs) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in &args.inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(input)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file() && Utils::is_video_file(entry.path()))
                .map(|entry| entry.into_path())
                .collect();
            found.sort();
            debug!(dir = %input.display(), count = found.len(), "Expanded directory");
            files.extend(found);
        } else if input.is_file() {
            files.push(input.clone());
        } else {
            bail!("Input does not exist: {}", input.display());
        }
    }

    if files.is_empty() {
        bail!("No video files found in the given inputs");
    }
    info!(count = files.len(), "Collected input files");
    Ok(files)
}

/// Parse repeated `NAME=VALUE` flags into a per-file table
fn parse_overrides<T, F>(entries: &[String], make: F) -> Result<PerFileOverrides>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(T) -> FileOverride,
{
    if entries.is_empty() {
        return Ok(PerFileOverrides::default());
    }

    let mut overrides = PerFileOverrides::per_file();
    for entry in entries {
        let (name, value) = entry
            .rsplit_once('=')
            .ok_or_else(|| anyhow!("Invalid override {}, expected NAME=VALUE", entry))?;
        let value: T = value
            .trim()
            .parse()
            .map_err(|e| anyhow!("Invalid value in override {}: {}", entry, e))?;
        let name = Path::new(name.trim())
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| anyhow!("Invalid file name in override {}", entry))?;
        overrides = overrides.with(name, make(value));
    }
    Ok(overrides)
}

fn parse_size(size: &str) -> Result<(u32, u32)> {
    let (width, height) = size
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow!("Invalid size {}, expected WIDTHxHEIGHT", size))?;
    Ok((
        width.trim().parse().with_context(|| format!("Invalid width in {}", size))?,
        height.trim().parse().with_context(|| format!("Invalid height in {}", size))?,
    ))
}

fn build_timeline(duration: f64, args: &GifArgs) -> Result<Timeline> {
    let mut timeline = Timeline::new(duration)?;
    if let Some(start) = &args.trim_start {
        timeline = timeline.with_trim_start(TimeParser::parse_time(start)?);
    }
    if let Some(end) = &args.trim_end {
        timeline = timeline.with_trim_end(TimeParser::parse_time(end)?);
    }
    for cut in &args.cut {
        let (start, end) = TimeParser::parse_range(cut)?;
        timeline = timeline
            .with_cut_range(start, end)
            .with_context(|| format!("Cannot apply cut {}", cut))?;
    }
    debug!(
        start = timeline.trim().start,
        end = timeline.effective_end(),
        cuts = timeline.segments().len(),
        "Timeline built"
    );
    Ok(timeline)
}
