//! Error types for pagient-core.

use std::path::PathBuf;

use thiserror::Error;

/// Layout the surgery software writes, used in error messages.
pub const RECORD_LAYOUT: &str = "id|lastname|firstname|birthdate|ssn|sex||";

/// The patient file could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The first record does not have the fixed number of fields.
    #[error("patient file has {found} fields, expected {expected} (\"{RECORD_LAYOUT}\")")]
    FieldCount { expected: usize, found: usize },

    /// The identifier field is not an integer.
    #[error("patient id {value:?} is not an integer")]
    InvalidId { value: String },
}

/// All errors that can arise from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure reading the config file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error, with the file that failed.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The file parsed but a value is unusable.
    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    /// `dirs::config_dir()` returned `None` and no path was given.
    #[error("cannot determine config directory; pass --config explicitly")]
    ConfigDirNotFound,
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
