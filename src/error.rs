use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Audio failures never leave the audio boundary; they are logged and dropped.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio output failed: {0}")]
    Io(#[from] io::Error),
    #[error("audio is muted")]
    Muted,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to open log file {path}: {source}")]
    Logging {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
