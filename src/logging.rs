//! Logging
//!
//! Every `tracing` event of the registry and its CLI goes through a single
//! `tracing-subscriber` stack. `IDREG_LOG*` environment variables take
//! precedence over [`LoggingConfig`].

use crate::error::ApiError;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

const ENV_FILTER: &str = "IDREG_LOG";
const ENV_FORMAT: &str = "IDREG_LOG_FORMAT";
const ENV_OUTPUT: &str = "IDREG_LOG_OUTPUT";
const ENV_MODULES: &str = "IDREG_LOG_MODULES";
const ENV_FILE: &str = "IDREG_LOG_FILE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Where log lines are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    Stdout,
    #[default]
    Stderr,
    File,
    #[serde(rename = "file+stderr")]
    #[value(name = "file+stderr")]
    FileAndStderr,
    /// stdout and stderr
    Both,
}

impl LogOutput {
    fn to_stdout(self) -> bool {
        matches!(self, LogOutput::Stdout | LogOutput::Both)
    }

    fn to_stderr(self) -> bool {
        matches!(
            self,
            LogOutput::Stderr | LogOutput::FileAndStderr | LogOutput::Both
        )
    }

    fn to_file(self) -> bool {
        matches!(self, LogOutput::File | LogOutput::FileAndStderr)
    }
}

fn parse_value<T: ValueEnum>(kind: &str, raw: &str) -> Result<T, ApiError> {
    T::from_str(raw.trim(), true)
        .map_err(|_| ApiError::ConfigError(format!("Invalid log {}: {}", kind, raw)))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,

    /// Base filter: trace, debug, info, warn, error or off
    pub level: String,

    pub format: LogFormat,

    pub output: LogOutput,

    /// Log file used by the file outputs; None falls back to the state dir
    pub file: Option<PathBuf>,

    /// ANSI colors for text output on a terminal stream
    pub color: bool,

    /// Per-target level overrides, e.g. `identity_registry::events = "warn"`
    pub modules: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            file: None,
            color: true,
            modules: HashMap::new(),
        }
    }
}

/// Log file path: CLI value, then `IDREG_LOG_FILE`, then config, then the
/// platform state directory.
pub fn resolve_log_file_path(
    cli_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
) -> Result<PathBuf, ApiError> {
    let env_file = std::env::var(ENV_FILE).ok().map(PathBuf::from);
    let chosen = [cli_file, env_file, config_file]
        .into_iter()
        .flatten()
        .find(|p| !p.as_os_str().is_empty());
    match chosen {
        Some(path) => Ok(path),
        None => state_log_file(),
    }
}

fn state_log_file() -> Result<PathBuf, ApiError> {
    let dirs = directories::ProjectDirs::from("", "", "identity-registry").ok_or_else(|| {
        ApiError::ConfigError("No home directory; cannot place the log file".to_string())
    })?;
    let dir = dirs.state_dir().unwrap_or_else(|| dirs.data_local_dir());
    Ok(dir.join("identity-registry.log"))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), ApiError> {
    let defaults = LoggingConfig::default();
    let config = config.unwrap_or(&defaults);

    if !config.enabled {
        return Registry::default()
            .with(EnvFilter::new("off"))
            .try_init()
            .map_err(|e| ApiError::ConfigError(format!("Logger already installed: {}", e)));
    }

    let filter = build_filter(config)?;
    let format = match std::env::var(ENV_FORMAT) {
        Ok(raw) => parse_value::<LogFormat>("format", &raw)?,
        Err(_) => config.format,
    };
    let output = match std::env::var(ENV_OUTPUT) {
        Ok(raw) => parse_value::<LogOutput>("output", &raw)?,
        Err(_) => config.output,
    };
    let writer = open_writer(output, config)?;
    let ansi = config.color && !output.to_file();

    let layer = fmt::layer()
        .with_target(true)
        .with_timer(ChronoUtc::rfc_3339())
        .with_writer(writer);
    let installed = match format {
        LogFormat::Json => Registry::default()
            .with(filter)
            .with(layer.json())
            .try_init(),
        LogFormat::Text => Registry::default()
            .with(filter)
            .with(layer.with_ansi(ansi))
            .try_init(),
    };
    installed.map_err(|e| ApiError::ConfigError(format!("Logger already installed: {}", e)))
}

fn open_writer(output: LogOutput, config: &LoggingConfig) -> Result<BoxMakeWriter, ApiError> {
    if output.to_file() {
        let path = resolve_log_file_path(None, config.file.clone())?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| {
                ApiError::ConfigError(format!("Cannot create log directory {:?}: {}", dir, e))
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| ApiError::ConfigError(format!("Cannot open log file {:?}: {}", path, e)))?;
        let file = Mutex::new(file);
        return Ok(if output.to_stderr() {
            BoxMakeWriter::new(file.and(std::io::stderr))
        } else {
            BoxMakeWriter::new(file)
        });
    }

    Ok(match (output.to_stdout(), output.to_stderr()) {
        (true, true) => BoxMakeWriter::new(std::io::stdout.and(std::io::stderr)),
        (true, false) => BoxMakeWriter::new(std::io::stdout),
        _ => BoxMakeWriter::new(std::io::stderr),
    })
}

/// `IDREG_LOG` replaces the whole filter; otherwise the configured level
/// plus module directives from config and `IDREG_LOG_MODULES`.
fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, ApiError> {
    if let Ok(filter) = EnvFilter::try_from_env(ENV_FILTER) {
        return Ok(filter);
    }

    let mut filter = EnvFilter::new(&config.level);
    if config.level == "off" {
        return Ok(filter);
    }

    let from_env = std::env::var(ENV_MODULES).unwrap_or_default();
    let env_pairs = from_env
        .split(',')
        .filter_map(|pair| pair.split_once('='))
        .map(|(target, level)| (target.trim().to_string(), level.trim().to_string()));
    let config_pairs = config
        .modules
        .iter()
        .map(|(target, level)| (target.clone(), level.clone()));

    for (target, level) in config_pairs.chain(env_pairs) {
        filter = filter.add_directive(module_directive(&target, &level)?);
    }
    Ok(filter)
}

fn module_directive(target: &str, level: &str) -> Result<Directive, ApiError> {
    format!("{}={}", target, level)
        .parse()
        .map_err(|e| ApiError::ConfigError(format!("Invalid log directive {}={}: {}", target, level, e)))
}
