//! tracing subscriber setup: stderr output plus an optional daily log file.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

use crate::dealflow_config::{DealflowConfig, LogFormat};

const LOG_FILE_PREFIX: &str = "dealflow.log";

#[derive(Debug, Clone)]
pub struct LogSettings {
    /// Fallback filter when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
    pub file_dir: Option<PathBuf>,
}

impl LogSettings {
    pub fn from_config(config: &DealflowConfig) -> Self {
        Self {
            level: config.log_level(),
            format: config.toml.logging.format,
            file_dir: config.toml.logging.file.then(|| config.log_dir()),
        }
    }
}

/// Keeps the file writer flushing until dropped.
pub struct LogGuard {
    _guards: Vec<WorkerGuard>,
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(settings: &LogSettings) -> LogGuard {
    let filter = build_filter(&settings.level);

    let mut guards = Vec::new();
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    layers.push(stderr_layer(settings.format));

    let mut file_error = None;
    if let Some(dir) = &settings.file_dir {
        match std::fs::create_dir_all(dir) {
            Ok(()) => {
                let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                layers.push(file_layer(settings.format, writer));
                guards.push(guard);
            }
            Err(e) => file_error = Some(format!("log dir init failed for {}: {e}", dir.display())),
        }
    }

    layers.push(Box::new(filter));
    let _ = Registry::default().with(layers).try_init();

    if let Some(error) = file_error {
        tracing::warn!("{error}");
    }

    LogGuard { _guards: guards }
}

/// `RUST_LOG` wins over the configured level; an unparsable level falls back to `info`.
fn build_filter(level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

fn stderr_layer(format: LogFormat) -> Box<dyn Layer<Registry> + Send + Sync> {
    match format {
        LogFormat::Pretty => Box::new(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr)
                .with_target(true),
        ),
        LogFormat::Json => Box::new(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_current_span(true),
        ),
    }
}

fn file_layer(
    format: LogFormat,
    writer: tracing_appender::non_blocking::NonBlocking,
) -> Box<dyn Layer<Registry> + Send + Sync> {
    match format {
        LogFormat::Pretty => Box::new(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        ),
        LogFormat::Json => Box::new(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_target(true),
        ),
    }
}
