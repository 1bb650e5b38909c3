// TOML config adapter - Configuration management using TOML files
//
// Precedence: CLI > Env > File > Defaults. The CLI layer is applied by the
// binary on top of what `TomlConfigAdapter::load` returns.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::engine::worker::WorkerCommand;
use crate::error::{ClipBatchError, ClipBatchResult};
use crate::job::Operation;

/// File looked up in the working directory when no `--config` is given
pub const CONFIG_FILE_NAME: &str = "clipbatch.toml";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub worker: WorkerConfig,
    pub probe: ProbeConfig,
    pub defaults: DefaultsConfig,
    pub run: RunConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Worker command per operation family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WorkerConfig {
    pub split: Option<WorkerEntry>,
    pub separate: Option<WorkerEntry>,
    pub gif: Option<WorkerEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerEntry {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub ffprobe: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ffprobe: "ffprobe".to_string(),
        }
    }
}

/// Fallback values for settings the CLI does not set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub parallel_jobs: u32,
    pub fps: f64,
    pub sample_rate: u32,
    pub gif_frame_rate: f64,
    pub color_count: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            parallel_jobs: num_cpus::get().clamp(1, 8) as u32,
            fps: 30.0,
            sample_rate: 48000,
            gif_frame_rate: 15.0,
            color_count: 256,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RunConfig {
    /// Cancel the worker after this many seconds
    pub timeout_secs: Option<u64>,
}

impl AppConfig {
    /// Worker command configured for an operation
    pub fn worker_command(&self, operation: Operation) -> Option<WorkerCommand> {
        let entry = match operation {
            Operation::Split => self.worker.split.as_ref(),
            Operation::Separate => self.worker.separate.as_ref(),
            Operation::Gif => self.worker.gif.as_ref(),
        }?;
        Some(WorkerCommand::new(&entry.program).args(entry.args.iter().cloned()))
    }
}

/// TOML configuration adapter
pub struct TomlConfigAdapter;

impl TomlConfigAdapter {
    /// Load file and environment layers
    ///
    /// An explicit path must exist; the default file is optional.
    pub fn load(explicit: Option<&Path>) -> ClipBatchResult<AppConfig> {
        let config = match explicit {
            Some(path) => Self::load_file(path)?,
            None => {
                let default_path = PathBuf::from(CONFIG_FILE_NAME);
                if default_path.exists() {
                    Self::load_file(&default_path)?
                } else {
                    AppConfig::default()
                }
            }
        };

        Self::apply_env(config, |key| std::env::var(key).ok())
    }

    /// Read and parse one config file
    pub fn load_file(path: &Path) -> ClipBatchResult<AppConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| ClipBatchError::ConfigFile {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config = Self::parse(&content).map_err(|e| match e {
            ClipBatchError::ConfigFile { message, .. } => ClipBatchError::ConfigFile {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parse TOML content
    pub fn parse(content: &str) -> ClipBatchResult<AppConfig> {
        toml::from_str(content).map_err(|e| ClipBatchError::ConfigFile {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })
    }

    /// Apply `CLIPBATCH_*` overrides read through `lookup`
    pub fn apply_env<F>(mut config: AppConfig, lookup: F) -> ClipBatchResult<AppConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> ClipBatchResult<T>
        where
            T::Err: std::fmt::Display,
        {
            value.trim().parse().map_err(|e: T::Err| ClipBatchError::ConfigFile {
                path: format!("${}", name),
                message: e.to_string(),
            })
        }

        if let Some(level) = lookup("CLIPBATCH_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(ffprobe) = lookup("CLIPBATCH_FFPROBE") {
            config.probe.ffprobe = ffprobe;
        }
        if let Some(jobs) = lookup("CLIPBATCH_PARALLEL_JOBS") {
            config.defaults.parallel_jobs = parse_var("CLIPBATCH_PARALLEL_JOBS", &jobs)?;
        }
        if let Some(timeout) = lookup("CLIPBATCH_TIMEOUT_SECS") {
            config.run.timeout_secs = Some(parse_var("CLIPBATCH_TIMEOUT_SECS", &timeout)?);
        }

        Ok(config)
    }
}
