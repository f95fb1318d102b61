//! Tracing setup: a stderr layer, an optional rolling file layer, and log
//! retention for the file layer.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

use crate::config::{FileLoggingConfig, LogFormat, LogRotation, LoggingConfig};
use crate::paths;

const LOG_FILE_PREFIX: &str = "elobot.log";
const FILTER_ENV: &str = "ELOBOT_LOG";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    pub verbosity: u8,
    pub logging: LoggingConfig,
}

impl TelemetryConfig {
    pub fn new(verbosity: u8, logging: LoggingConfig) -> Self {
        Self { verbosity, logging }
    }
}

pub fn is_test_env() -> bool {
    std::env::var_os("ELOBOT_TESTING").is_some()
        || std::env::var_os("RUST_TEST_THREADS").is_some()
}

/// The long-running bot logs to a file unless told otherwise.
pub fn apply_daemon_logging_defaults(logging: &mut LoggingConfig) {
    apply_daemon_logging_defaults_inner(logging, is_test_env());
}

fn apply_daemon_logging_defaults_inner(logging: &mut LoggingConfig, is_test_env: bool) {
    if is_test_env {
        return;
    }
    logging.file.enabled = true;
}

/// Keeps the non-blocking file writer alive; drop it last.
pub struct TelemetryGuard {
    _guards: Vec<WorkerGuard>,
}

pub fn init(config: TelemetryConfig) -> TelemetryGuard {
    let directive = config
        .logging
        .filter
        .clone()
        .unwrap_or_else(|| level_from_verbosity(config.verbosity).to_string());
    let filter = EnvFilter::builder()
        .with_env_var(FILTER_ENV)
        .try_from_env()
        .unwrap_or_else(|_| EnvFilter::new(directive));

    let mut guards = Vec::new();
    let mut layers: Vec<BoxedLayer> = Vec::new();

    if config.logging.stdout {
        layers.push(stderr_layer(config.logging.stdout_format));
    }

    let mut notes = Vec::new();
    if config.logging.file.enabled {
        let dir = resolve_log_dir(&config.logging.file);
        match fs::create_dir_all(&dir) {
            Ok(()) => {
                let retention = RetentionLimits::from_file_config(&config.logging.file);
                if retention.is_enabled() {
                    match prune_logs(&dir, LOG_FILE_PREFIX, retention, SystemTime::now()) {
                        Ok(report) if report.removed + report.failed > 0 => {
                            notes.push(Note::Pruned(report));
                        }
                        Ok(_) => {}
                        Err(err) => notes.push(Note::Failed(format!("log retention failed: {err}"))),
                    }
                }
                let (writer, guard) = file_writer(&config.logging.file, &dir);
                layers.push(file_layer(config.logging.file.format, writer));
                guards.push(guard);
            }
            Err(err) => notes.push(Note::Failed(format!(
                "log dir init failed for {}: {err}",
                dir.display()
            ))),
        }
    }

    layers.push(Box::new(filter));
    if Registry::default().with(layers).try_init().is_err() {
        // Another subscriber is already installed (tests).
        return TelemetryGuard { _guards: guards };
    }

    for note in notes {
        match note {
            Note::Pruned(report) => tracing::info!(
                pruned = report.removed,
                failed = report.failed,
                candidates = report.candidates,
                "log retention applied"
            ),
            Note::Failed(message) => tracing::warn!("{message}"),
        }
    }

    TelemetryGuard { _guards: guards }
}

enum Note {
    Pruned(PruneReport),
    Failed(String),
}

fn stderr_layer(format: LogFormat) -> BoxedLayer {
    let fmt = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);
    match format {
        LogFormat::Tree => Box::new(tracing_tree::HierarchicalLayer::new(2)),
        LogFormat::Pretty => Box::new(fmt.pretty()),
        LogFormat::Compact => Box::new(fmt.compact()),
        LogFormat::Json => Box::new(fmt.json().with_current_span(true)),
    }
}

fn file_writer(config: &FileLoggingConfig, dir: &Path) -> (NonBlocking, WorkerGuard) {
    let rotation = match config.rotation {
        LogRotation::Daily => Rotation::DAILY,
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Minutely => Rotation::MINUTELY,
        LogRotation::Never => Rotation::NEVER,
    };
    tracing_appender::non_blocking(RollingFileAppender::new(rotation, dir, LOG_FILE_PREFIX))
}

fn file_layer(format: LogFormat, writer: NonBlocking) -> BoxedLayer {
    if let LogFormat::Tree = format {
        return Box::new(
            tracing_tree::HierarchicalLayer::new(2)
                .with_ansi(false)
                .with_writer(writer),
        );
    }
    let fmt = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_names(true);
    match format {
        LogFormat::Pretty => Box::new(fmt.pretty()),
        LogFormat::Json => Box::new(fmt.json().with_current_span(true).with_span_list(true)),
        LogFormat::Compact | LogFormat::Tree => Box::new(fmt.compact()),
    }
}

fn level_from_verbosity(verbosity: u8) -> tracing::metadata::LevelFilter {
    match verbosity {
        0 => tracing::metadata::LevelFilter::WARN,
        1 => tracing::metadata::LevelFilter::INFO,
        _ => tracing::metadata::LevelFilter::DEBUG,
    }
}

fn resolve_log_dir(config: &FileLoggingConfig) -> PathBuf {
    config.dir.clone().unwrap_or_else(paths::log_dir)
}

#[derive(Clone, Copy, Debug, Default)]
struct RetentionLimits {
    max_age: Option<Duration>,
    max_files: Option<usize>,
}

impl RetentionLimits {
    fn from_file_config(config: &FileLoggingConfig) -> Self {
        Self {
            max_age: config
                .retention_max_age_days
                .map(|days| Duration::from_secs(days.saturating_mul(24 * 60 * 60))),
            max_files: config.retention_max_files,
        }
    }

    fn is_enabled(&self) -> bool {
        self.max_age.is_some() || self.max_files.is_some()
    }
}

#[derive(Clone, Debug)]
struct LogEntry {
    path: PathBuf,
    modified: SystemTime,
}

#[derive(Clone, Debug, Default)]
struct PruneReport {
    candidates: usize,
    removed: usize,
    failed: usize,
}

fn prune_logs(
    dir: &Path,
    prefix: &str,
    retention: RetentionLimits,
    now: SystemTime,
) -> std::io::Result<PruneReport> {
    let mut entries = collect_log_entries(dir, prefix, now)?;
    let mut report = PruneReport {
        candidates: entries.len(),
        ..PruneReport::default()
    };
    for path in prune_log_entries(&mut entries, retention, now) {
        match fs::remove_file(&path) {
            Ok(()) => report.removed += 1,
            Err(_) => report.failed += 1,
        }
    }
    Ok(report)
}

fn collect_log_entries(
    dir: &Path,
    prefix: &str,
    now: SystemTime,
) -> std::io::Result<Vec<LogEntry>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(prefix));
        if !matches {
            continue;
        }
        let meta = entry.metadata()?;
        if meta.is_file() {
            entries.push(LogEntry {
                path,
                modified: meta.modified().unwrap_or(now),
            });
        }
    }
    Ok(entries)
}

/// Drops entries older than the age limit, then the oldest beyond the
/// file-count limit. Returns the paths to delete.
fn prune_log_entries(
    entries: &mut Vec<LogEntry>,
    retention: RetentionLimits,
    now: SystemTime,
) -> Vec<PathBuf> {
    let mut removed = Vec::new();

    if let Some(max_age) = retention.max_age {
        let (stale, keep): (Vec<_>, Vec<_>) = entries.drain(..).partition(|entry| {
            now.duration_since(entry.modified).unwrap_or(Duration::ZERO) > max_age
        });
        removed.extend(stale.into_iter().map(|entry| entry.path));
        *entries = keep;
    }

    if let Some(max_files) = retention.max_files {
        entries.sort_by_key(|entry| entry.modified);
        let excess = entries.len().saturating_sub(max_files);
        removed.extend(entries.drain(..excess).map(|entry| entry.path));
    }

    removed
}
