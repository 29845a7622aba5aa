//! Structured logging setup.
//!
//! JSON formatting for production, pretty formatting for development,
//! optional file output with daily rotation. Configured entirely from
//! environment variables so deployments can switch formats without a
//! rebuild.

use anyhow::{Context, Result};
use std::env;
use std::io;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Configuration for logging setup.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log format: "json" or "pretty"
    pub format: LogFormat,
    /// Log output: "stdout", "stderr", or "file"
    pub output: LogOutput,
    /// Directory for log files (when output is "file")
    pub log_dir: PathBuf,
    /// Log file name prefix
    pub log_file_prefix: String,
    /// Environment (e.g., "dev", "staging", "production")
    pub environment: String,
    /// Enable daily log rotation
    pub enable_rotation: bool,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON structured logging (production)
    Json,
    /// Human-readable pretty output (development)
    Pretty,
}

/// Log output destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    Stderr,
    File,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let is_production = environment == "production" || environment == "prod";

        Self {
            format: if is_production {
                LogFormat::Json
            } else {
                LogFormat::Pretty
            },
            output: LogOutput::Stderr,
            log_dir: PathBuf::from("logs"),
            log_file_prefix: "cafeito".to_string(),
            environment,
            enable_rotation: true,
        }
    }
}

impl LoggingConfig {
    /// Create a logging configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(format) = env::var("LOG_FORMAT") {
            config.format = match format.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                _ => config.format,
            };
        }

        if let Ok(output) = env::var("LOG_OUTPUT") {
            config.output = match output.to_lowercase().as_str() {
                "stdout" => LogOutput::Stdout,
                "stderr" => LogOutput::Stderr,
                "file" => LogOutput::File,
                _ => config.output,
            };
        }

        if let Ok(log_dir) = env::var("LOG_DIR") {
            config.log_dir = PathBuf::from(log_dir);
        }

        if let Ok(rotation) = env::var("LOG_ROTATION") {
            config.enable_rotation = rotation != "0" && rotation.to_lowercase() != "false";
        }

        config
    }
}

/// Initialize structured logging with the given configuration.
///
/// Returns a WorkerGuard that must be held for the lifetime of the
/// application so buffered logs are flushed on exit.
pub fn init_logging(config: LoggingConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let default_level = if config.environment == "production" || config.environment == "prod" {
            "info"
        } else {
            "debug"
        };
        EnvFilter::new(format!("{},hyper=info,tower=info,sqlx=warn", default_level))
    });

    let (writer, guard) = match config.output {
        LogOutput::Stdout => {
            let (non_blocking, guard) = tracing_appender::non_blocking(io::stdout());
            (non_blocking, Some(guard))
        }
        LogOutput::Stderr => {
            let (non_blocking, guard) = tracing_appender::non_blocking(io::stderr());
            (non_blocking, Some(guard))
        }
        LogOutput::File => {
            std::fs::create_dir_all(&config.log_dir).context("Failed to create log directory")?;

            let file_appender = if config.enable_rotation {
                tracing_appender::rolling::daily(&config.log_dir, &config.log_file_prefix)
            } else {
                tracing_appender::rolling::never(&config.log_dir, &config.log_file_prefix)
            };

            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            (non_blocking, Some(guard))
        }
    };

    let registry = tracing_subscriber::registry();

    match config.format {
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_writer(writer)
                .with_target(true)
                .with_level(true)
                .with_line_number(true)
                .with_file(true)
                .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
                .with_current_span(true)
                .with_filter(env_filter);
            registry.with(fmt_layer).init();
        }
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .pretty()
                .with_writer(writer)
                .with_target(true)
                .with_level(true)
                .with_ansi(true)
                .with_filter(env_filter);
            registry.with(fmt_layer).init();
        }
    }

    tracing::info!(
        format = ?config.format,
        output = ?config.output,
        environment = %config.environment,
        "logging initialized"
    );

    Ok(guard)
}
