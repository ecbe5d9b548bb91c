//! Subscriber setup driven by [`LoggingConfig`].
//!
//! Built once at process start. Components only ever talk to the `tracing`
//! macros, so tests can swap in their own subscriber with
//! `tracing::subscriber::set_default`.

use std::path::Path;

use config::ConfigError;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::config::{LogFormat, LogSink, LoggingConfig};
use crate::utils::error::{AppError, Result};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Keeps the non-blocking file writers alive. Dropping it flushes them.
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _guards: Vec<WorkerGuard>,
}

/// `RUST_LOG`, when present, wins over the configured level.
pub fn build_filter(level: &str, env_override: Option<&str>) -> Result<EnvFilter> {
    let directives = env_override.filter(|s| !s.trim().is_empty()).unwrap_or(level);
    EnvFilter::try_new(directives).map_err(|e| {
        AppError::Config(ConfigError::Message(format!(
            "Invalid log level '{}': {}",
            directives, e
        )))
    })
}

/// Builds the subscriber without installing it.
pub fn build_subscriber(
    config: &LoggingConfig,
    env_override: Option<&str>,
) -> Result<(impl Subscriber + Send + Sync + 'static, LogGuard)> {
    let filter = build_filter(&config.level, env_override)?;

    let mut layers: Vec<BoxedLayer> = Vec::with_capacity(config.sinks.len());
    let mut guards = Vec::new();

    for sink in &config.sinks {
        match sink {
            LogSink::Console => {
                layers.push(format_layer(config.format, std::io::stderr, true));
            }
            LogSink::File { path } => {
                let (writer, guard) = file_writer(path)?;
                layers.push(format_layer(config.format, writer, false));
                guards.push(guard);
            }
        }
    }

    let subscriber = tracing_subscriber::registry().with(layers).with(filter);
    Ok((subscriber, LogGuard { _guards: guards }))
}

/// Installs the global subscriber. Call once, before the run starts.
pub fn init(config: &LoggingConfig) -> Result<LogGuard> {
    let env_override = std::env::var("RUST_LOG").ok();
    let (subscriber, guard) = build_subscriber(config, env_override.as_deref())?;

    tracing::subscriber::set_global_default(subscriber).map_err(|e| {
        AppError::Config(ConfigError::Message(format!(
            "Logging already initialized: {}",
            e
        )))
    })?;

    Ok(guard)
}

fn format_layer<W>(format: LogFormat, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer().with_writer(writer).with_ansi(ansi);
    match format {
        LogFormat::Full => layer.boxed(),
        LogFormat::Compact => layer.compact().boxed(),
        LogFormat::Json => layer.json().boxed(),
    }
}

fn file_writer(path: &Path) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path.file_name().ok_or_else(|| {
        AppError::Config(ConfigError::Message(format!(
            "Log file path '{}' has no file name",
            path.display()
        )))
    })?;

    std::fs::create_dir_all(directory).map_err(|e| AppError::storage(directory, e))?;

    // Appends, never rotates
    let appender = tracing_appender::rolling::never(directory, file_name);
    Ok(tracing_appender::non_blocking(appender))
}
