pub mod check_config;
pub mod parse;
pub mod watch;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use pagient_core::Config;

/// `--config` if given, otherwise the per-user default location.
pub fn load_config(explicit: Option<&Path>) -> Result<(PathBuf, Config)> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => pagient_core::config::default_path().context("cannot locate the config directory")?,
    };
    let config = pagient_core::config::load_at(&path)
        .with_context(|| format!("invalid configuration at '{}'", path.display()))?;
    Ok((path, config))
}
