use std::fs::OpenOptions;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::EnvFilter;

use crate::error::AppError;

/// Log to a file; the terminal belongs to the UI. Keep the guard alive until
/// exit or buffered lines are lost.
pub fn init(path: &Path) -> Result<WorkerGuard, AppError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| AppError::Logging { path: path.to_path_buf(), source })?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(false)
        .with_writer(writer)
        .init();
    Ok(guard)
}
