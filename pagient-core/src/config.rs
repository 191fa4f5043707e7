//! YAML configuration.
//!
//! # Layout
//!
//! ```yaml
//! general:
//!   watch_file: C:/praxis/patakt.txt
//!   root: .                 # log directory, defaults to the config file's directory
//!   restart_delay_secs: 10
//!   initial_sync: true
//! backend:
//!   url: https://pagient.example.org
//!   user: watcher
//!   password: secret
//!   timeout_secs: 10
//! log:
//!   level: info
//!   colored: false
//!   pretty: true
//! ```
//!
//! # API pattern
//!
//! - `load_at(path)` reads an explicit file; used by tests and `--config`.
//! - `load()` derives the path from `dirs::config_dir()` and delegates.
//!
//! Relative `watch_file` and `root` values resolve against the directory the
//! config file lives in.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{io_err, ConfigError};

pub const CONFIG_DIR_NAME: &str = "pagient";
pub const CONFIG_FILE_NAME: &str = "config.yaml";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub general: GeneralConfig,
    pub backend: BackendConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    /// File the surgery software rewrites on every focus change.
    pub watch_file: PathBuf,
    #[serde(default)]
    pub root: PathBuf,
    #[serde(default = "default_restart_delay_secs")]
    pub restart_delay_secs: u64,
    /// Reconcile once on startup instead of waiting for the first write.
    #[serde(default = "default_true")]
    pub initial_sync: bool,
}

impl GeneralConfig {
    pub fn restart_delay(&self) -> Duration {
        Duration::from_secs(self.restart_delay_secs)
    }
}

#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    pub url: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &"********")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub colored: bool,
    #[serde(default = "default_true")]
    pub pretty: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            colored: false,
            pretty: true,
        }
    }
}

fn default_restart_delay_secs() -> u64 {
    10
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// `<config_dir>/pagient/config.yaml` — pure, no I/O.
pub fn default_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
        .ok_or(ConfigError::ConfigDirNotFound)
}

/// Load, resolve and validate the config file at `path`.
pub fn load_at(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let base = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let config: Config = serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    config.resolve(&base)
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<Config, ConfigError> {
    load_at(&default_path()?)
}

impl Config {
    /// Normalise paths and URL against `base`, then validate.
    pub fn resolve(mut self, base: &Path) -> Result<Self, ConfigError> {
        if self.general.watch_file.is_relative() {
            self.general.watch_file = base.join(&self.general.watch_file);
        }
        if self.general.root.as_os_str().is_empty() {
            self.general.root = base.to_path_buf();
        } else if self.general.root.is_relative() {
            self.general.root = base.join(&self.general.root);
        }
        self.backend.url = self.backend.url.trim().trim_end_matches('/').to_string();
        self.log.level = self.log.level.trim().to_ascii_lowercase();

        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.general.watch_file.file_name().is_none() {
            return Err(ConfigError::Invalid {
                field: "general.watch_file",
                reason: format!("{} does not name a file", self.general.watch_file.display()),
            });
        }
        if self.backend.url.is_empty() {
            return Err(ConfigError::Invalid {
                field: "backend.url",
                reason: "must not be empty".to_string(),
            });
        }
        if !(self.backend.url.starts_with("http://") || self.backend.url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                field: "backend.url",
                reason: format!("{} is not an http(s) URL", self.backend.url),
            });
        }
        if self.backend.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "backend.timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if !LOG_LEVELS.contains(&self.log.level.as_str()) {
            return Err(ConfigError::Invalid {
                field: "log.level",
                reason: format!(
                    "unknown level '{}'; expected one of: {}",
                    self.log.level,
                    LOG_LEVELS.join(", ")
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = "\
general:
  watch_file: patakt.txt
backend:
  url: http://localhost:8080/
";

    fn parse(yaml: &str) -> Result<Config, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml).expect("yaml");
        config.resolve(Path::new("/etc/pagient"))
    }

    #[test]
    fn minimal_config_gets_defaults() {
        let config = parse(MINIMAL).expect("config");
        assert_eq!(
            config.general.watch_file,
            PathBuf::from("/etc/pagient/patakt.txt")
        );
        assert_eq!(config.general.root, PathBuf::from("/etc/pagient"));
        assert_eq!(config.general.restart_delay(), Duration::from_secs(10));
        assert!(config.general.initial_sync);
        assert_eq!(config.backend.url, "http://localhost:8080");
        assert_eq!(config.backend.timeout(), Duration::from_secs(10));
        assert_eq!(config.log.level, "info");
        assert!(config.log.pretty);
        assert!(!config.log.colored);
    }

    #[test]
    fn absolute_paths_are_kept() {
        let yaml = "\
general:
  watch_file: /data/patakt.txt
  root: /var/log/pagient
backend:
  url: https://pagient.example.org
";
        let config = parse(yaml).expect("config");
        assert_eq!(config.general.watch_file, PathBuf::from("/data/patakt.txt"));
        assert_eq!(config.general.root, PathBuf::from("/var/log/pagient"));
    }

    #[test]
    fn rejects_non_http_url() {
        let yaml = "\
general:
  watch_file: patakt.txt
backend:
  url: ftp://example.org
";
        let err = parse(yaml).unwrap_err();
        assert!(
            matches!(err, ConfigError::Invalid { field: "backend.url", .. }),
            "got: {err}"
        );
    }

    #[test]
    fn rejects_unknown_log_level() {
        let yaml = format!("{MINIMAL}log:\n  level: chatty\n");
        let err = parse(&yaml).unwrap_err();
        assert!(err.to_string().contains("log.level"), "got: {err}");
    }

    #[test]
    fn debug_output_masks_password() {
        let yaml = format!("{MINIMAL}  password: hunter2\n");
        let config = parse(&yaml).expect("config");
        let rendered = format!("{:?}", config.backend);
        assert!(!rendered.contains("hunter2"), "got: {rendered}");
        assert_eq!(config.backend.password, "hunter2");
    }
}
