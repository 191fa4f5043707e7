//! File watcher daemon: watcher → debouncer → reconciler, supervised as one
//! actor group and restarted on recoverable failures.

mod debounce;
mod error;
pub mod logging;
pub mod paths;
mod runtime;
pub mod shutdown;
pub mod supervisor;
mod watcher;

pub use debounce::Debouncer;
pub use error::DaemonError;
pub use runtime::{start_blocking, Connector, Daemon, HttpConnector, StopHandle};
pub use shutdown::{Shutdown, ShutdownTrigger};
pub use supervisor::ActorGroup;
pub use watcher::FileWatcher;
