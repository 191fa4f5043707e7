//! Pagient — mirror the surgery software's active patient into the patient
//! service.
//!
//! # Usage
//!
//! ```text
//! pagient watch [--config <path>]
//! pagient parse <file> [--json]
//! pagient check-config [--config <path>]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{check_config::CheckConfigArgs, parse::ParseArgs, watch::WatchArgs};

#[derive(Parser, Debug)]
#[command(
    name = "pagient",
    version,
    about = "Keep the patient service in sync with the surgery's active patient",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Watch the patient file and reconcile every change until stopped.
    Watch(WatchArgs),

    /// Parse a patient file once and print the record it names.
    Parse(ParseArgs),

    /// Load and validate the configuration, then print the effective values.
    CheckConfig(CheckConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Watch(args) => args.run(),
        Commands::Parse(args) => args.run(),
        Commands::CheckConfig(args) => args.run(),
    }
}
