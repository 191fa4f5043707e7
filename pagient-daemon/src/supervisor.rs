//! Actor group: run a fixed set of long-lived tasks as one unit.
//!
//! Every actor receives a [`Shutdown`]. As soon as any actor returns, with or
//! without an error, the group fires the shared trigger and keeps joining
//! until every actor has actually stopped. The first error to come back is
//! the group's result.

use std::future::Future;

use tokio::task::JoinSet;

use crate::error::DaemonError;
use crate::shutdown::{Shutdown, ShutdownTrigger};

type ActorExit = (&'static str, Result<(), DaemonError>);

pub struct ActorGroup {
    shutdown: ShutdownTrigger,
    actors: JoinSet<ActorExit>,
}

impl Default for ActorGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl ActorGroup {
    pub fn new() -> Self {
        Self {
            shutdown: ShutdownTrigger::new(),
            actors: JoinSet::new(),
        }
    }

    /// Trigger that cancels the whole group from outside.
    pub fn shutdown_trigger(&self) -> ShutdownTrigger {
        self.shutdown.clone()
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Start `actor` immediately. It must return promptly once its
    /// `Shutdown` fires.
    pub fn spawn<F, Fut>(&mut self, name: &'static str, actor: F)
    where
        F: FnOnce(Shutdown) -> Fut,
        Fut: Future<Output = Result<(), DaemonError>> + Send + 'static,
    {
        let future = actor(self.shutdown.subscribe());
        self.actors.spawn(async move { (name, future.await) });
        tracing::debug!(actor = name, "actor started");
    }

    /// Wait for the first exit, cancel the rest, and join them all.
    pub async fn run(mut self) -> Result<(), DaemonError> {
        let mut first_error: Option<DaemonError> = None;

        while let Some(joined) = self.actors.join_next().await {
            if !self.shutdown.is_triggered() {
                tracing::debug!("first actor exited, cancelling the rest");
                self.shutdown.trigger();
            }

            let failure = match joined {
                Ok((name, Ok(()))) => {
                    tracing::debug!(actor = name, "actor stopped");
                    None
                }
                Ok((name, Err(err))) => {
                    tracing::debug!(actor = name, error = %err, "actor failed");
                    Some(err)
                }
                Err(err) => Some(DaemonError::TaskJoin(format!("actor task failed: {err}"))),
            };

            if first_error.is_none() {
                first_error = failure;
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
