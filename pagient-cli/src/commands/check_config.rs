//! `pagient check-config [--config <path>]`

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use pagient_core::Config;

use super::load_config;

const MASK: &str = "********";

#[derive(Args, Debug)]
pub struct CheckConfigArgs {
    /// Config file; defaults to `<config dir>/pagient/config.yaml`.
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,
}

#[derive(Tabled)]
struct SettingRow {
    #[tabled(rename = "setting")]
    key: &'static str,
    #[tabled(rename = "value")]
    value: String,
}

impl CheckConfigArgs {
    pub fn run(self) -> Result<()> {
        let (path, config) = load_config(self.config.as_deref())?;

        println!("{} {}", "config OK:".green().bold(), path.display());
        let mut table = Table::new(rows(&config));
        table.with(Style::rounded());
        println!("{table}");

        if !config.general.watch_file.parent().map(|dir| dir.is_dir()).unwrap_or(false) {
            println!(
                "{} directory of {} does not exist yet; the watcher will refuse to start",
                "warning:".yellow().bold(),
                config.general.watch_file.display()
            );
        }
        Ok(())
    }
}

fn rows(config: &Config) -> Vec<SettingRow> {
    let password = if config.backend.password.is_empty() {
        String::new()
    } else {
        MASK.to_string()
    };
    vec![
        SettingRow {
            key: "general.watch_file",
            value: config.general.watch_file.display().to_string(),
        },
        SettingRow {
            key: "general.root",
            value: config.general.root.display().to_string(),
        },
        SettingRow {
            key: "general.restart_delay_secs",
            value: config.general.restart_delay_secs.to_string(),
        },
        SettingRow {
            key: "general.initial_sync",
            value: config.general.initial_sync.to_string(),
        },
        SettingRow {
            key: "backend.url",
            value: config.backend.url.clone(),
        },
        SettingRow {
            key: "backend.user",
            value: config.backend.user.clone(),
        },
        SettingRow {
            key: "backend.password",
            value: password,
        },
        SettingRow {
            key: "backend.timeout_secs",
            value: config.backend.timeout_secs.to_string(),
        },
        SettingRow {
            key: "log.level",
            value: config.log.level.clone(),
        },
        SettingRow {
            key: "log.colored",
            value: config.log.colored.to_string(),
        },
        SettingRow {
            key: "log.pretty",
            value: config.log.pretty.to_string(),
        },
    ]
}
