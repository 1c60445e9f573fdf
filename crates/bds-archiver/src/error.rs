use std::{io, path::PathBuf, time::Duration};

use bds_palette::PaletteError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiverError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid config {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Palette(#[from] PaletteError),

    #[error("failed to spawn {}: {source}", .path.display())]
    Spawn { path: PathBuf, source: io::Error },

    #[error("game server wrote to stderr during startup: {0}")]
    ServerStderr(String),

    #[error("game server exited before it was ready")]
    ServerExited,

    #[error("{what} timed out after {timeout:?}")]
    Timeout {
        what: &'static str,
        timeout: Duration,
    },

    #[error("hand-off failed: {0}")]
    HandOff(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("usage: {0}")]
    Usage(String),
}

pub type Result<T> = std::result::Result<T, ArchiverError>;
