//! Global tracing subscriber for the drill binary.

use std::io;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Keeps the non-blocking file writer alive; drop it last.
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

fn filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Daily rolling appender under `config.dir`, or `None` when file logging is
/// off or the directory cannot be created.
fn file_appender(config: &LoggingConfig) -> Option<RollingFileAppender> {
    if !config.file_enabled {
        return None;
    }
    if let Err(err) = std::fs::create_dir_all(&config.dir) {
        eprintln!(
            "file logging disabled, cannot create {}: {err}",
            config.dir.display()
        );
        return None;
    }
    Some(RollingFileAppender::new(
        Rotation::DAILY,
        &config.dir,
        &config.file_name,
    ))
}

/// Installs the global subscriber. Console output goes to stderr, leaving
/// stdout to the drill prompt.
pub fn init_tracing(config: &LoggingConfig) -> Option<FileLogGuard> {
    let (file_layer, guard) = match file_appender(config) {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true);
            (Some(layer), Some(FileLogGuard { _guard: guard }))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter(config))
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .with(file_layer)
        .init();

    guard
}
