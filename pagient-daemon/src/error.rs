use std::path::PathBuf;

use thiserror::Error;

use pagient_api::ApiError;
use pagient_sync::SyncError;

/// Error surface for the watcher pipeline and its restart loop.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The directory holding the patient file cannot be watched.
    #[error("cannot watch {path}: {source}")]
    Setup {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// Login rejected by the patient service.
    #[error("failed to authenticate with patient service: {0}")]
    Authentication(#[source] ApiError),

    #[error("patient service error: {0}")]
    Api(#[from] ApiError),

    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("channel closed: {0}")]
    ChannelClosed(&'static str),

    #[error("task join failure: {0}")]
    TaskJoin(String),

    #[error("signal handler failed: {0}")]
    Signal(String),
}

impl DaemonError {
    /// Remote failures during a session are retried with a fresh pipeline;
    /// everything else stops the process.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DaemonError::Api(_) | DaemonError::Sync(SyncError::Api(_)))
    }
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        path: path.into(),
        source,
    }
}
