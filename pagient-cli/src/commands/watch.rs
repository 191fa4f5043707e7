//! `pagient watch [--config <path>]` — run the file watcher in the foreground.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use super::load_config;

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Config file; defaults to `<config dir>/pagient/config.yaml`.
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,
}

impl WatchArgs {
    pub fn run(self) -> Result<()> {
        let (_, config) = load_config(self.config.as_deref())?;
        pagient_daemon::start_blocking(config).context("file watcher exited with error")?;
        Ok(())
    }
}
