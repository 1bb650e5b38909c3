//! Command-line argument definitions

use std::path::PathBuf;

use clap::{Args, ValueEnum};

use crate::job::DitherMethod;

/// Files or directories to process; directories are searched recursively
#[derive(Args, Debug)]
pub struct InputArgs {
    /// Input files or directories
    #[arg(required = true, num_args = 1..)]
    pub inputs: Vec<PathBuf>,
}

/// Arguments for the split command
#[derive(Args, Debug)]
pub struct SplitArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Segment length (seconds, MM:SS or HH:MM:SS)
    #[arg(long, conflicts_with = "segments", required_unless_present = "segments")]
    pub duration: Option<String>,

    /// Number of segments per file
    #[arg(long)]
    pub segments: Option<u32>,

    /// Output frame rate
    #[arg(long)]
    pub fps: Option<f64>,

    /// Frame rate for one file, as NAME=FPS (repeatable; enables per-file mode)
    #[arg(long = "fps-for")]
    pub fps_for: Vec<String>,

    /// Parallel jobs hint for the worker
    #[arg(short, long)]
    pub jobs: Option<u32>,
}

/// Arguments for the separate command
#[derive(Args, Debug)]
pub struct SeparateArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Audio sample rate in Hz
    #[arg(long)]
    pub sample_rate: Option<u32>,

    /// Sample rate for one file, as NAME=HZ (repeatable; enables per-file mode)
    #[arg(long = "rate-for")]
    pub rate_for: Vec<String>,

    /// Parallel jobs hint for the worker
    #[arg(short, long)]
    pub jobs: Option<u32>,
}

/// Dither choices on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DitherArg {
    FloydSteinberg,
    Bayer,
    Sierra24a,
    None,
}

impl From<DitherArg> for DitherMethod {
    fn from(arg: DitherArg) -> Self {
        match arg {
            DitherArg::FloydSteinberg => DitherMethod::FloydSteinberg,
            DitherArg::Bayer => DitherMethod::Bayer,
            DitherArg::Sierra24a => DitherMethod::Sierra24a,
            DitherArg::None => DitherMethod::None,
        }
    }
}

/// Arguments for the gif command
#[derive(Args, Debug)]
pub struct GifArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Scale to a percentage of the source size
    #[arg(long, conflicts_with_all = ["width", "size"])]
    pub scale: Option<u32>,

    /// Fixed output width, height follows the aspect ratio
    #[arg(long, conflicts_with = "size")]
    pub width: Option<u32>,

    /// Exact output size as WIDTHxHEIGHT
    #[arg(long)]
    pub size: Option<String>,

    /// GIF frame rate
    #[arg(long)]
    pub fps: Option<f64>,

    /// Playback speed multiplier
    #[arg(long, default_value_t = 1.0)]
    pub speed: f64,

    /// Loop count (0 loops forever)
    #[arg(long = "loop", default_value_t = 0)]
    pub loop_count: u32,

    /// Dither method
    #[arg(long, value_enum, default_value_t = DitherArg::FloydSteinberg)]
    pub dither: DitherArg,

    /// Palette size (2-256)
    #[arg(long)]
    pub colors: Option<u32>,

    /// Start of the kept window
    #[arg(long)]
    pub trim_start: Option<String>,

    /// End of the kept window
    #[arg(long)]
    pub trim_end: Option<String>,

    /// Range to cut out, as START-END (repeatable)
    #[arg(long)]
    pub cut: Vec<String>,
}

/// Arguments for the probe command
#[derive(Args, Debug)]
pub struct ProbeArgs {
    #[command(flatten)]
    pub input: InputArgs,
}
