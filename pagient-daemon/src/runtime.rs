//! Daemon runtime: the restart loop and the supervised pipeline it drives.
//!
//! A cycle runs on the blocking pool and cannot be cancelled once its HTTP
//! calls are under way. A process stop does not wait for it: the reconciler
//! abandons the cycle and the runtime gives blocking work
//! [`SHUTDOWN_GRACE`] before exiting. Any other pipeline failure waits for
//! the cycle to finish so a restarted pipeline never overlaps it.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use pagient_api::{ApiClient, ApiError, PatientApi};
use pagient_core::{decode_latin1, BackendConfig, Config};
use pagient_sync::{CycleOutcome, PublishedSlot, Reconciler, SyncError};

use crate::debounce::Debouncer;
use crate::error::{io_err, DaemonError};
use crate::logging::init_tracing;
use crate::shutdown::{Shutdown, ShutdownTrigger};
use crate::supervisor::ActorGroup;
use crate::watcher::FileWatcher;

/// How long the runtime waits for an abandoned cycle on exit.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Opens a session with the patient service. Called once per pipeline run,
/// on the blocking pool.
pub trait Connector: Send + Sync + 'static {
    fn connect(&self) -> Result<Arc<dyn PatientApi>, ApiError>;
}

/// Logs in over HTTP with the configured credentials.
pub struct HttpConnector {
    client: ApiClient,
    user: String,
    password: String,
}

impl HttpConnector {
    pub fn from_config(backend: &BackendConfig) -> Self {
        Self {
            client: ApiClient::from_config(backend),
            user: backend.user.clone(),
            password: backend.password.clone(),
        }
    }
}

impl Connector for HttpConnector {
    fn connect(&self) -> Result<Arc<dyn PatientApi>, ApiError> {
        let session = self.client.authenticate(&self.user, &self.password)?;
        Ok(Arc::new(session))
    }
}

/// Requests a clean stop of a running [`Daemon`], including one that is
/// waiting out its restart delay.
#[derive(Debug, Clone)]
pub struct StopHandle(ShutdownTrigger);

impl StopHandle {
    pub fn stop(&self) {
        self.0.trigger();
    }
}

/// Restart loop around the watcher pipeline.
pub struct Daemon<C> {
    config: Config,
    connector: Arc<C>,
    stop: ShutdownTrigger,
    debouncer: Debouncer,
    restart_delay: Duration,
    published: PublishedSlot,
}

impl<C: Connector> Daemon<C> {
    pub fn new(config: Config, connector: C) -> Self {
        let restart_delay = config.general.restart_delay();
        Self {
            config,
            connector: Arc::new(connector),
            stop: ShutdownTrigger::new(),
            debouncer: Debouncer::default(),
            restart_delay,
            published: PublishedSlot::new(),
        }
    }

    pub fn with_debounce_window(mut self, window: Duration) -> Self {
        self.debouncer = Debouncer::new(window);
        self
    }

    pub fn with_restart_delay(mut self, delay: Duration) -> Self {
        self.restart_delay = delay;
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(self.stop.clone())
    }

    /// Run pipelines until a clean stop or a fatal error. Recoverable
    /// failures restart the pipeline, with fresh state, after the delay. A
    /// patient left active by a failed pipeline is retired by the next one.
    pub async fn run(&self) -> Result<(), DaemonError> {
        loop {
            let err = match self.run_once().await {
                Ok(()) => {
                    tracing::info!("file watcher stopped gracefully");
                    return Ok(());
                }
                Err(err) => err,
            };

            if !err.is_recoverable() {
                tracing::error!(error = %err, "file watcher failed");
                return Err(err);
            }

            tracing::warn!(
                error = %err,
                delay_secs = self.restart_delay.as_secs_f64(),
                "file watcher failed, restarting after delay",
            );

            let mut stop = self.stop.subscribe();
            tokio::select! {
                _ = stop.recv() => {
                    tracing::info!("stop requested during restart delay");
                    return Ok(());
                }
                signal = os_signal() => {
                    tracing::info!(signal = signal?, "received signal during restart delay");
                    self.stop.trigger();
                    return Ok(());
                }
                _ = tokio::time::sleep(self.restart_delay) => {}
            }
        }
    }

    /// One supervised pipeline: interrupt listener, watcher, debouncer and
    /// reconciler. Returns when any of them stops.
    async fn run_once(&self) -> Result<(), DaemonError> {
        if self.stop.is_triggered() {
            return Ok(());
        }

        let api = self.connect().await?;
        let watch_file = self.config.general.watch_file.clone();
        let watcher = FileWatcher::subscribe(&watch_file)?;

        let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();
        let (fire_tx, fire_rx) = mpsc::channel(1);
        if self.config.general.initial_sync {
            // Cannot fail: the receiver is alive until the debouncer starts.
            let _ = trigger_tx.send(());
        }

        let reconciler = Reconciler::new(api, watch_file).with_published(self.published.clone());
        let debouncer = self.debouncer;
        let stop = self.stop.clone();
        let requested = self.stop.subscribe();

        let mut group = ActorGroup::new();
        group.spawn("interrupt", move |shutdown| interrupt(stop, shutdown));
        group.spawn("watcher", move |shutdown| watcher.run(trigger_tx, shutdown));
        group.spawn("debouncer", move |shutdown| debouncer.run(trigger_rx, fire_tx, shutdown));
        group.spawn("reconciler", move |shutdown| reconcile(reconciler, fire_rx, shutdown, requested));
        group.run().await
    }

    async fn connect(&self) -> Result<Arc<dyn PatientApi>, DaemonError> {
        let connector = self.connector.clone();
        let connected = tokio::task::spawn_blocking(move || connector.connect())
            .await
            .map_err(|e| DaemonError::TaskJoin(format!("connect task failed: {e}")))?;

        match connected {
            Ok(api) => {
                tracing::info!("connected to patient service");
                Ok(api)
            }
            Err(err) if err.is_unauthorized() => Err(DaemonError::Authentication(err)),
            Err(err) => Err(DaemonError::Api(err)),
        }
    }
}

/// Load config, install logging, and block the current thread on the daemon.
pub fn start_blocking(config: Config) -> Result<(), DaemonError> {
    init_tracing(&config.log, Some(&config.general.root))?;
    tracing::info!(
        watch_file = %config.general.watch_file.display(),
        backend = %config.backend.url,
        "starting pagient watcher",
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    let connector = HttpConnector::from_config(&config.backend);
    let result = runtime.block_on(Daemon::new(config, connector).run());
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

async fn interrupt(stop: ShutdownTrigger, mut shutdown: Shutdown) -> Result<(), DaemonError> {
    let mut requested = stop.subscribe();
    tokio::select! {
        _ = shutdown.recv() => Ok(()),
        _ = requested.recv() => {
            tracing::info!("stop requested, shutting down");
            Ok(())
        }
        signal = os_signal() => {
            tracing::info!(signal = signal?, "received signal, shutting down");
            stop.trigger();
            Ok(())
        }
    }
}

async fn reconcile(
    mut reconciler: Reconciler,
    mut fires: mpsc::Receiver<()>,
    mut shutdown: Shutdown,
    mut requested: Shutdown,
) -> Result<(), DaemonError> {
    loop {
        tokio::select! {
            _ = shutdown.recv() => return Ok(()),
            fire = fires.recv() => {
                if fire.is_none() {
                    return Err(DaemonError::ChannelClosed("reconcile fires"));
                }

                // The reconciler travels to the blocking pool and back, so
                // cycles never overlap.
                let cycle = tokio::task::spawn_blocking(move || {
                    let result = reconciler.run_cycle();
                    (reconciler, result)
                });
                let joined = tokio::select! {
                    joined = cycle => joined,
                    _ = requested.recv() => {
                        tracing::info!("stop requested, abandoning in-flight reconcile cycle");
                        return Ok(());
                    }
                };
                let (returned, result) =
                    joined.map_err(|e| DaemonError::TaskJoin(format!("reconcile task failed: {e}")))?;
                reconciler = returned;

                match result {
                    Ok(outcome) => log_outcome(&outcome),
                    Err(err) if err.is_local() => log_local_failure(&err, reconciler.watch_file()),
                    Err(err) => return Err(err.into()),
                }
            }
        }
    }
}

fn log_outcome(outcome: &CycleOutcome) {
    match outcome {
        CycleOutcome::Idle => tracing::debug!("no patient in focus"),
        CycleOutcome::Unchanged(id) => tracing::debug!(patient_id = %id, "active patient unchanged"),
        CycleOutcome::Switched { retired, activated } => tracing::info!(
            retired = ?retired,
            activated = ?activated,
            "active patient switched",
        ),
    }
}

fn log_local_failure(err: &SyncError, file: &Path) {
    match err {
        SyncError::Malformed { .. } => {
            let contents = std::fs::read(file)
                .map(|bytes| decode_latin1(&bytes))
                .unwrap_or_default();
            tracing::warn!(error = %err, contents = %contents, "skipping malformed patient file");
        }
        _ => tracing::warn!(error = %err, "skipping unreadable patient file"),
    }
}

/// Resolves with the signal name on Ctrl-C or, on Unix, SIGTERM.
async fn os_signal() -> Result<&'static str, DaemonError> {
    let signal_err = |e: std::io::Error| DaemonError::Signal(e.to_string());

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate()).map_err(signal_err)?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.map(|()| "ctrl-c").map_err(signal_err),
            _ = terminate.recv() => Ok("SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.map_err(signal_err)?;
        Ok("ctrl-c")
    }
}
