use crate::config::{ConfigError, Overlay};
use clap::{Args, ValueEnum};
use serde::Deserialize;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to install tracing subscriber: {0}")]
    Init(String),
}

#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Resolved logging settings.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
pub struct Logger {
    pub format: LogFormat,
    pub level: LogLevel,
}

impl Logger {
    pub fn new(format: LogFormat, level: LogLevel) -> Self {
        Self { format, level }
    }

    /// Install the global subscriber. Output goes to stderr; stdout carries
    /// command results.
    ///
    /// `RUST_LOG` takes precedence over the configured level when set.
    pub fn init(&self) -> Result<(), LoggingError> {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level.as_str()));
        let registry = tracing_subscriber::registry().with(filter);
        let result = match self.format {
            LogFormat::Json => registry
                .with(
                    fmt::layer()
                        .json()
                        .with_current_span(false)
                        .with_writer(std::io::stderr),
                )
                .try_init(),
            LogFormat::Text => registry
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_writer(std::io::stderr),
                )
                .try_init(),
        };
        result.map_err(|e| LoggingError::Init(e.to_string()))
    }
}

#[derive(Args, Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LoggerArgs {
    /// Log format
    #[arg(long, env = "DAPRCTL_LOG_FORMAT", value_enum)]
    pub log_format: Option<LogFormat>,

    /// Log level
    #[arg(long, env = "DAPRCTL_LOG_LEVEL", value_enum)]
    pub log_level: Option<LogLevel>,
}

impl Overlay for LoggerArgs {
    fn overlay(self, over: Self) -> Self {
        Self {
            log_format: self.log_format.overlay(over.log_format),
            log_level: self.log_level.overlay(over.log_level),
        }
    }
}

impl TryFrom<LoggerArgs> for Logger {
    type Error = ConfigError;

    fn try_from(args: LoggerArgs) -> Result<Self, Self::Error> {
        Ok(Logger::new(
            args.log_format.unwrap_or_default(),
            args.log_level.unwrap_or_default(),
        ))
    }
}
