//! Structured logging setup driven by `TABULA_*` environment variables.
//!
//! - `TABULA_TRACE`: an `EnvFilter` directive such as `debug` or
//!   `tabula_core=debug`. Defaults to `off`.
//! - `TABULA_LOG_FORMAT`: `pretty` (default) or `json`.
//! - `TABULA_LOG_FILE`: optional path; events are appended there as well as
//!   written to stderr.

use std::env;
use std::fs::{File, OpenOptions};
use std::io;
use std::sync::Mutex;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

pub const TRACE_ENV: &str = "TABULA_TRACE";
pub const FORMAT_ENV: &str = "TABULA_LOG_FORMAT";
pub const FILE_ENV: &str = "TABULA_LOG_FILE";

/// Output format of the log layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    pub fn parse(value: &str) -> Result<Self, LoggingError> {
        if value.eq_ignore_ascii_case("pretty") {
            Ok(Self::Pretty)
        } else if value.eq_ignore_ascii_case("json") {
            Ok(Self::Json)
        } else {
            Err(LoggingError::InvalidFormat {
                value: value.to_string(),
            })
        }
    }
}

/// Errors raised while installing the global subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoggingError {
    InvalidFilter { directive: String, reason: String },
    InvalidFormat { value: String },
    LogFile { path: String, reason: String },
    Init { reason: String },
}

impl LoggingError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFilter { .. } => "LOG_INVALID_FILTER",
            Self::InvalidFormat { .. } => "LOG_INVALID_FORMAT",
            Self::LogFile { .. } => "LOG_FILE_UNAVAILABLE",
            Self::Init { .. } => "LOG_INIT_FAILED",
        }
    }
}

impl std::fmt::Display for LoggingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = self.code();
        match self {
            Self::InvalidFilter { directive, reason } => {
                write!(f, "[{code}] invalid log filter '{directive}': {reason}")
            }
            Self::InvalidFormat { value } => write!(
                f,
                "[{code}] invalid {FORMAT_ENV} '{value}' (expected 'json' or 'pretty')"
            ),
            Self::LogFile { path, reason } => {
                write!(f, "[{code}] failed to open log file '{path}': {reason}")
            }
            Self::Init { reason } => write!(f, "[{code}] failed to initialize logging: {reason}"),
        }
    }
}

impl std::error::Error for LoggingError {}

fn parse_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    if level.eq_ignore_ascii_case("off") {
        return Ok(EnvFilter::default().add_directive(LevelFilter::OFF.into()));
    }
    EnvFilter::try_new(level).map_err(|err| LoggingError::InvalidFilter {
        directive: level.to_string(),
        reason: err.to_string(),
    })
}

fn open_log_file(path: &str) -> Result<File, LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|err| LoggingError::LogFile {
            path: path.to_string(),
            reason: err.to_string(),
        })
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

fn output_layers(format: LogFormat, file: Option<File>) -> Vec<BoxedLayer> {
    let mut layers: Vec<BoxedLayer> = Vec::with_capacity(2);
    match format {
        LogFormat::Json => {
            layers.push(tracing_subscriber::fmt::layer().with_writer(io::stderr).json().boxed());
            if let Some(file) = file {
                layers.push(
                    tracing_subscriber::fmt::layer()
                        .with_writer(Mutex::new(file))
                        .with_ansi(false)
                        .json()
                        .boxed(),
                );
            }
        }
        LogFormat::Pretty => {
            layers.push(tracing_subscriber::fmt::layer().with_writer(io::stderr).pretty().boxed());
            if let Some(file) = file {
                layers.push(
                    tracing_subscriber::fmt::layer()
                        .with_writer(Mutex::new(file))
                        .with_ansi(false)
                        .pretty()
                        .boxed(),
                );
            }
        }
    }
    layers
}

/// Install the global tracing subscriber.
///
/// `level` overrides `TABULA_TRACE`. Returns `Ok(false)` without touching
/// anything when a subscriber is already installed.
///
/// # Errors
///
/// Returns an error for a malformed filter or format, an unopenable log file,
/// or a failed installation.
pub fn enable_logging(level: Option<&str>) -> Result<bool, LoggingError> {
    if tracing::dispatcher::has_been_set() {
        return Ok(false);
    }

    let level = level
        .map(str::to_string)
        .or_else(|| env::var(TRACE_ENV).ok())
        .unwrap_or_else(|| "off".to_string());
    let filter = parse_filter(&level)?;
    let format = match env::var(FORMAT_ENV) {
        Ok(value) => LogFormat::parse(&value)?,
        Err(_) => LogFormat::default(),
    };
    let file = env::var(FILE_ENV)
        .ok()
        .map(|path| open_log_file(&path))
        .transpose()?;

    tracing_subscriber::registry()
        .with(output_layers(format, file))
        .with(filter)
        .try_init()
        .map_err(|err| LoggingError::Init {
            reason: err.to_string(),
        })?;
    Ok(true)
}
