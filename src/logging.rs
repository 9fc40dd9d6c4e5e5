use std::{
    path::PathBuf,
    sync::{Mutex, PoisonError},
};

use tracing::{debug, info, metadata::LevelFilter, trace, Level};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::prelude::*;

struct LoggingState {
    initialized: bool,

    // Dropping this flushes the file writer.
    file_guard: Option<WorkerGuard>,
}

static LOGGING: Mutex<LoggingState> = Mutex::new(LoggingState {
    initialized: false,
    file_guard: None,
});

fn do_init(stdout_level: Level, file_logging: Option<(Level, PathBuf)>) -> Option<WorkerGuard> {
    let mut message = String::from("Logging with: stdout");

    let stdout_layer =
        tracing_subscriber::fmt::layer().with_filter(LevelFilter::from(stdout_level));

    let (maybe_file_layer, guard) = match file_logging {
        Some((level, output_dir)) => {
            message += &format!(", file (in dir {output_dir:?})");

            let appender = RollingFileAppender::new(Rotation::DAILY, output_dir, "gps-splitter.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);

            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(LevelFilter::from(level));

            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(maybe_file_layer)
        .init();

    debug!(message);

    guard
}

/// Initialize tracing.
///
/// Will only initialize once, so tests may call this.
pub fn init(stdout_level: Level, file_logging: Option<(Level, PathBuf)>) {
    let mut state = LOGGING.lock().unwrap_or_else(PoisonError::into_inner);

    if state.initialized {
        return;
    }

    state.file_guard = do_init(stdout_level, file_logging);
    state.initialized = true;

    info!("Logging initialized");
}

/// Flush file logging, if any.
/// Call this right before the process exits.
pub fn shutdown() {
    trace!("Shutting down");

    let mut state = LOGGING.lock().unwrap_or_else(PoisonError::into_inner);
    state.file_guard.take();
}
