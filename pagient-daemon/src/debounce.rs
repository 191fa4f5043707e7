//! Trailing-edge debouncer between the file watcher and the reconciler.
//!
//! Every trigger pushes the deadline out to `now + window`; one fire is
//! emitted once the deadline passes without another trigger. A fire that
//! finds the reconciler busy is dropped: the reconciler re-reads the whole
//! file anyway, so one queued fire covers any number of skipped ones.

use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::{sleep_until, Instant};

use crate::error::DaemonError;
use crate::paths::DEBOUNCE_WINDOW;
use crate::shutdown::Shutdown;

#[derive(Debug, Clone, Copy)]
pub struct Debouncer {
    window: Duration,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEBOUNCE_WINDOW)
    }
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Coalesce `triggers` into `fires` until shutdown or until the watcher
    /// side hangs up. A closed `fires` channel means the reconciler is gone.
    pub async fn run(
        self,
        mut triggers: mpsc::UnboundedReceiver<()>,
        fires: mpsc::Sender<()>,
        mut shutdown: Shutdown,
    ) -> Result<(), DaemonError> {
        let mut deadline: Option<Instant> = None;

        loop {
            tokio::select! {
                biased;

                _ = shutdown.recv() => return Ok(()),
                trigger = triggers.recv() => {
                    if trigger.is_none() {
                        return Err(DaemonError::ChannelClosed("watcher triggers"));
                    }
                    deadline = Some(Instant::now() + self.window);
                }
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    deadline = None;
                    match fires.try_send(()) {
                        Ok(()) => tracing::debug!("quiet period elapsed, reconciling"),
                        Err(TrySendError::Full(())) => {
                            tracing::debug!("reconcile already pending, dropping fire");
                        }
                        Err(TrySendError::Closed(())) => {
                            return Err(DaemonError::ChannelClosed("reconcile fires"));
                        }
                    }
                }
            }
        }
    }
}
