//! Error types for pagient-sync.

use std::path::PathBuf;

use thiserror::Error;

use pagient_api::ApiError;
use pagient_core::ParseError;

/// All errors that can abort a reconciliation cycle.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The patient file could not be read.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The patient file was read but does not hold a valid record.
    #[error("malformed patient file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    /// A remote call failed; the cycle was abandoned part way.
    #[error("patient service error: {0}")]
    Api(#[from] ApiError),
}

impl SyncError {
    /// Local failures heal on the next file write and never reach the
    /// patient service.
    pub fn is_local(&self) -> bool {
        !matches!(self, SyncError::Api(_))
    }
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
