//! Filesystem subscription for the patient file.
//!
//! The parent directory is watched non-recursively because the surgery
//! software may replace the file instead of writing it in place. Events are
//! filtered down to creations, content changes and renames onto the target
//! path.

use std::path::{Path, PathBuf};

use notify::event::{ModifyKind, RenameMode};
use notify::{recommended_watcher, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::error::DaemonError;
use crate::paths::watch_dir;
use crate::shutdown::Shutdown;

pub struct FileWatcher {
    target: PathBuf,
    // Dropping the watcher ends the subscription.
    _watcher: RecommendedWatcher,
    events: mpsc::UnboundedReceiver<notify::Result<Event>>,
}

impl FileWatcher {
    /// Start watching the directory that holds `file`. Fails when the
    /// directory does not exist or cannot be watched.
    pub fn subscribe(file: &Path) -> Result<Self, DaemonError> {
        let dir = watch_dir(file);
        let setup_err = |source: notify::Error| DaemonError::Setup {
            path: dir.clone(),
            source,
        };

        let file_name = file
            .file_name()
            .ok_or_else(|| setup_err(notify::Error::generic("watch path does not name a file")))?;
        // Backends report real paths (e.g. /private/var on macOS); compare
        // against the canonical form.
        let canonical_dir = std::fs::canonicalize(&dir).map_err(|e| setup_err(notify::Error::io(e)))?;
        let target = canonical_dir.join(file_name);

        let (event_tx, events) = mpsc::unbounded_channel();
        let mut watcher = recommended_watcher(move |event| {
            let _ = event_tx.send(event);
        })
        .map_err(setup_err)?;
        watcher
            .watch(&canonical_dir, RecursiveMode::NonRecursive)
            .map_err(setup_err)?;

        tracing::info!(dir = %canonical_dir.display(), file = %target.display(), "watching patient file");
        Ok(Self {
            target,
            _watcher: watcher,
            events,
        })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Forward relevant events as triggers until shutdown.
    pub async fn run(
        mut self,
        triggers: mpsc::UnboundedSender<()>,
        mut shutdown: Shutdown,
    ) -> Result<(), DaemonError> {
        loop {
            tokio::select! {
                _ = shutdown.recv() => return Ok(()),
                event = self.events.recv() => {
                    let Some(event) = event else {
                        return Err(DaemonError::ChannelClosed("filesystem events"));
                    };
                    let event = match event {
                        Ok(event) => event,
                        Err(err) => {
                            tracing::warn!(error = %err, "watcher event error");
                            continue;
                        }
                    };
                    if !is_relevant_event_kind(&event.kind) || !concerns_target(&event, &self.target) {
                        continue;
                    }
                    tracing::trace!(kind = ?event.kind, "patient file changed");
                    if triggers.send(()).is_err() {
                        return Err(DaemonError::ChannelClosed("watcher triggers"));
                    }
                }
            }
        }
    }
}

fn is_relevant_event_kind(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_)
            | EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Any)
            // A file renamed over the target replaces it.
            | EventKind::Modify(ModifyKind::Name(RenameMode::To | RenameMode::Both | RenameMode::Any))
    )
}

fn concerns_target(event: &Event, target: &Path) -> bool {
    event.paths.iter().any(|path| path == target)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, RemoveKind};
    use tempfile::TempDir;

    use super::*;
    use crate::shutdown::ShutdownTrigger;

    #[test]
    fn creations_and_content_changes_are_relevant() {
        assert!(is_relevant_event_kind(&EventKind::Create(CreateKind::File)));
        assert!(is_relevant_event_kind(&EventKind::Modify(ModifyKind::Data(DataChange::Content))));
        assert!(is_relevant_event_kind(&EventKind::Modify(ModifyKind::Any)));
    }

    #[test]
    fn renames_onto_the_target_are_relevant() {
        for mode in [RenameMode::To, RenameMode::Both, RenameMode::Any] {
            assert!(
                is_relevant_event_kind(&EventKind::Modify(ModifyKind::Name(mode))),
                "{mode:?}"
            );
        }
        assert!(!is_relevant_event_kind(&EventKind::Modify(ModifyKind::Name(RenameMode::From))));
    }

    #[test]
    fn rename_pair_counts_when_the_target_is_the_destination() {
        let target = Path::new("/data/praxis/patakt.txt");
        let both = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(PathBuf::from("/data/praxis/patakt.tmp"))
            .add_path(target.to_path_buf());
        assert!(is_relevant_event_kind(&both.kind));
        assert!(concerns_target(&both, target));
    }

    #[test]
    fn metadata_access_and_removal_are_ignored() {
        assert!(!is_relevant_event_kind(&EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any))));
        assert!(!is_relevant_event_kind(&EventKind::Access(AccessKind::Any)));
        assert!(!is_relevant_event_kind(&EventKind::Remove(RemoveKind::File)));
    }

    #[test]
    fn only_events_on_the_target_count() {
        let target = Path::new("/data/praxis/patakt.txt");
        let hit = Event::new(EventKind::Create(CreateKind::File)).add_path(target.to_path_buf());
        let sibling =
            Event::new(EventKind::Create(CreateKind::File)).add_path(PathBuf::from("/data/praxis/other.txt"));
        assert!(concerns_target(&hit, target));
        assert!(!concerns_target(&sibling, target));
    }

    #[test]
    fn missing_directory_is_a_setup_error() {
        let dir = TempDir::new().expect("tempdir");
        let err = FileWatcher::subscribe(&dir.path().join("gone").join("patakt.txt"))
            .err()
            .expect("subscribe must fail");
        assert!(matches!(err, DaemonError::Setup { .. }), "got: {err}");
    }

    #[tokio::test]
    async fn write_to_target_produces_a_trigger() {
        let dir = TempDir::new().expect("tempdir");
        let file = dir.path().join("patakt.txt");
        std::fs::write(&file, "").expect("create");

        let watcher = FileWatcher::subscribe(&file).expect("subscribe");
        assert_eq!(watcher.target().file_name(), file.file_name());

        let (tx, mut rx) = mpsc::unbounded_channel();
        let stop = ShutdownTrigger::new();
        let task = tokio::spawn(watcher.run(tx, stop.subscribe()));

        std::fs::write(&file, "7|Doe|Jane|1980-01-01|123456|F||").expect("write");
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("event within timeout")
            .expect("trigger");

        stop.trigger();
        task.await.expect("join").expect("clean stop");
    }

    #[tokio::test]
    async fn rename_over_target_produces_a_trigger() {
        let dir = TempDir::new().expect("tempdir");
        let file = dir.path().join("patakt.txt");
        let staged = dir.path().join("patakt.tmp");
        std::fs::write(&file, "").expect("create");
        std::fs::write(&staged, "7|Doe|Jane|1980-01-01|123456|F||").expect("stage");

        let watcher = FileWatcher::subscribe(&file).expect("subscribe");
        let (tx, mut rx) = mpsc::unbounded_channel();
        let stop = ShutdownTrigger::new();
        let task = tokio::spawn(watcher.run(tx, stop.subscribe()));

        // Nothing has touched the target since subscribing.
        tokio::time::sleep(Duration::from_millis(200)).await;
        while rx.try_recv().is_ok() {}

        std::fs::rename(&staged, &file).expect("rename over target");
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("rename must trigger within timeout")
            .expect("trigger");

        stop.trigger();
        task.await.expect("join").expect("clean stop");
    }
}
