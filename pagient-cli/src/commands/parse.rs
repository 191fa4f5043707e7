//! `pagient parse <file> [--json]` — show what the watcher would read.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use pagient_core::parse_patient_bytes;

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Patient file written by the surgery software.
    pub file: PathBuf,

    /// Emit the record as JSON.
    #[arg(long)]
    pub json: bool,
}

impl ParseArgs {
    pub fn run(self) -> Result<()> {
        let bytes = std::fs::read(&self.file)
            .with_context(|| format!("cannot read '{}'", self.file.display()))?;
        let record = parse_patient_bytes(&bytes)
            .with_context(|| format!("malformed patient file '{}'", self.file.display()))?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&record).context("failed to serialize patient JSON")?
            );
            return Ok(());
        }

        match record {
            Some(record) => {
                println!("{} {}", "id:".bold(), record.id);
                println!("{} {}", "name:".bold(), record.name);
                println!("{} {}", "ssn:".bold(), record.ssn);
            }
            None => println!("{}", "no active patient".bright_black()),
        }
        Ok(())
    }
}
