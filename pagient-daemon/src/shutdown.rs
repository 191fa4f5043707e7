//! Level-triggered stop signal shared by a set of tasks.
//!
//! Unlike a broadcast channel, a [`Shutdown`] created after the trigger fired
//! still observes it, so late subscribers cannot miss a stop.

use std::sync::Arc;

use tokio::sync::watch;

/// Sending half. Cheap to clone; triggering is idempotent.
#[derive(Debug, Clone)]
pub struct ShutdownTrigger {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for ShutdownTrigger {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownTrigger {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> Shutdown {
        Shutdown {
            rx: self.tx.subscribe(),
        }
    }
}

/// Receiving half handed to every task.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// Resolves once the trigger fired (immediately if it already has).
    pub async fn recv(&mut self) {
        // A dropped sender can never fire again; treat it as a stop.
        let _ = self.rx.wait_for(|stopped| *stopped).await;
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }
}
