use std::path::{Path, PathBuf};
use std::time::Duration;

/// Quiet period after the last change before the file is re-read.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_secs(1);

pub const LOG_FILE_NAME: &str = "pagient.log";

pub fn log_path(root: &Path) -> PathBuf {
    root.join(LOG_FILE_NAME)
}

/// Directory that has to be watched to see writes to `file`.
///
/// Replacing a file does not always raise an event on the file itself, so
/// the subscription goes on its parent.
pub fn watch_dir(file: &Path) -> PathBuf {
    file.parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
