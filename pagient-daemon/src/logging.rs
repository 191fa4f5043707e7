use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, EnvFilter};

use pagient_core::LogConfig;

use crate::error::{io_err, DaemonError};
use crate::paths::log_path;

/// Install the global subscriber. With a `root` the log goes to
/// `<root>/pagient.log` (appended), otherwise to stderr. `RUST_LOG` wins over
/// the configured level. Later calls are no-ops.
pub fn init_tracing(config: &LogConfig, root: Option<&Path>) -> Result<(), DaemonError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let writer = match root {
        Some(root) => {
            fs::create_dir_all(root).map_err(|e| io_err(root, e))?;
            let path = log_path(root);
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|e| io_err(&path, e))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(config.colored)
        .with_writer(writer);

    let _ = if config.pretty {
        builder.try_init()
    } else {
        builder.json().try_init()
    };
    Ok(())
}
