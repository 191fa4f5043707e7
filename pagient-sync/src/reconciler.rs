//! Reconciliation cycle: read → parse → plan → apply.
//!
//! ## Cycle protocol
//!
//! 1. Read and decode the watched file, parse it. Read or parse failures are
//!    returned as local errors before any remote call.
//! 2. [`plan`] against the last published patient; `Idle` and `Unchanged`
//!    stop here without touching the service.
//! 3. Retire the previous patient: remove it if no pager was handed out,
//!    otherwise mark it inactive. A patient the service no longer knows is
//!    already retired.
//! 4. Publish the new patient: add it if unknown, else update name, SSN and
//!    set it active.
//! 5. Only after every remote call succeeded is the new patient remembered.
//!    A failure anywhere leaves the previous state in place so the next
//!    cycle repeats the whole transition.
//!
//! ## Across restarts
//!
//! A [`PublishedSlot`] tracks the patient this process made active remotely
//! and has not retired yet. It outlives any single reconciler: a fresh
//! reconciler starts without a remembered patient, and on its first cycle
//! takes over whatever the slot still holds so that patient is retired
//! before another one is activated.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use pagient_api::{ApiError, PatientApi};
use pagient_core::{parse_patient_bytes, PatientId, PatientRecord, RemotePatient};

use crate::error::{io_err, SyncError};
use crate::plan::{plan, Transition};

/// How the previously published patient was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retirement {
    /// No pager was assigned; the patient was deleted.
    Removed(PatientId),
    /// A pager was assigned; the patient was kept and marked inactive.
    Deactivated(PatientId),
    /// The service did not know the patient any more.
    AlreadyGone(PatientId),
}

/// How the new patient was published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Created(PatientId),
    Updated(PatientId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Idle,
    Unchanged(PatientId),
    Switched {
        retired: Option<Retirement>,
        activated: Option<Activation>,
    },
}

/// Patient made active remotely and not yet retired. Clones share one slot.
#[derive(Debug, Clone, Default)]
pub struct PublishedSlot(Arc<Mutex<Option<PatientRecord>>>);

impl PublishedSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<PatientRecord> {
        self.lock().clone()
    }

    fn set(&self, record: Option<PatientRecord>) {
        *self.lock() = record;
    }

    fn lock(&self) -> MutexGuard<'_, Option<PatientRecord>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Owns the last published patient for the lifetime of one pipeline run.
pub struct Reconciler {
    api: Arc<dyn PatientApi>,
    watch_file: PathBuf,
    last_active: Option<PatientRecord>,
    published: PublishedSlot,
}

impl Reconciler {
    pub fn new(api: Arc<dyn PatientApi>, watch_file: impl Into<PathBuf>) -> Self {
        Self {
            api,
            watch_file: watch_file.into(),
            last_active: None,
            published: PublishedSlot::new(),
        }
    }

    /// Share `slot` with earlier and later reconcilers of this process.
    pub fn with_published(mut self, slot: PublishedSlot) -> Self {
        self.published = slot;
        self
    }

    pub fn watch_file(&self) -> &Path {
        &self.watch_file
    }

    pub fn last_active(&self) -> Option<&PatientRecord> {
        self.last_active.as_ref()
    }

    /// Run one full cycle against the current file contents.
    pub fn run_cycle(&mut self) -> Result<CycleOutcome, SyncError> {
        let bytes = std::fs::read(&self.watch_file).map_err(|e| io_err(&self.watch_file, e))?;
        let next = parse_patient_bytes(&bytes).map_err(|source| SyncError::Malformed {
            path: self.watch_file.clone(),
            source,
        })?;

        match &next {
            Some(record) => tracing::debug!(
                patient_id = %record.id,
                patient = %record.name,
                "read patient from file",
            ),
            None => tracing::debug!("patient file names no patient"),
        }

        Ok(self.apply(next)?)
    }

    /// Apply an already parsed file state.
    pub fn apply(&mut self, next: Option<PatientRecord>) -> Result<CycleOutcome, ApiError> {
        if self.last_active.is_none() {
            if let Some(outstanding) = self.published.get() {
                tracing::info!(
                    patient_id = %outstanding.id,
                    "taking over patient left active by an earlier run",
                );
                self.last_active = Some(outstanding);
            }
        }

        let (retire, activate) = match plan(self.last_active.as_ref(), next.as_ref()) {
            Transition::Idle => return Ok(CycleOutcome::Idle),
            Transition::Unchanged(id) => return Ok(CycleOutcome::Unchanged(id)),
            Transition::Switch { retire, activate } => (retire, activate),
        };

        let retired = match &retire {
            Some(previous) => {
                let retirement = self.retire(previous)?;
                self.published.set(None);
                Some(retirement)
            }
            None => None,
        };

        let activated = match &activate {
            Some(record) => {
                let activation = self.activate(record)?;
                self.published.set(Some(record.activated()));
                Some(activation)
            }
            None => None,
        };

        self.last_active = activate.map(|record| record.activated());
        Ok(CycleOutcome::Switched { retired, activated })
    }

    fn retire(&self, previous: &PatientRecord) -> Result<Retirement, ApiError> {
        let remote = match self.api.get_patient(previous.id) {
            Ok(remote) => remote,
            Err(err) if err.is_not_found() => {
                tracing::warn!(patient_id = %previous.id, "previous patient already gone remotely");
                return Ok(Retirement::AlreadyGone(previous.id));
            }
            Err(err) => return Err(err),
        };

        if remote.has_pager() {
            let inactive = RemotePatient {
                active: false,
                ..remote
            };
            self.api.update_patient(&inactive)?;
            tracing::info!(patient_id = %previous.id, "deactivated previous patient (pager assigned)");
            return Ok(Retirement::Deactivated(previous.id));
        }

        match self.api.remove_patient(previous.id) {
            Ok(()) => {
                tracing::info!(patient_id = %previous.id, "removed previous patient");
                Ok(Retirement::Removed(previous.id))
            }
            Err(err) if err.is_not_found() => Ok(Retirement::AlreadyGone(previous.id)),
            Err(err) => Err(err),
        }
    }

    fn activate(&self, record: &PatientRecord) -> Result<Activation, ApiError> {
        match self.api.get_patient(record.id) {
            Ok(existing) => {
                let updated = RemotePatient {
                    name: record.name.clone(),
                    ssn: record.ssn.clone(),
                    active: true,
                    ..existing
                };
                self.api.update_patient(&updated)?;
                tracing::info!(patient_id = %record.id, patient = %record.name, "updated active patient");
                Ok(Activation::Updated(record.id))
            }
            Err(err) if err.is_not_found() => {
                self.api.add_patient(&RemotePatient::from(&record.activated()))?;
                tracing::info!(patient_id = %record.id, patient = %record.name, "added active patient");
                Ok(Activation::Created(record.id))
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use pagient_api::fake::{ApiCall, FakeApi};

    use super::*;

    fn reconciler(api: &Arc<FakeApi>) -> Reconciler {
        Reconciler::new(api.clone(), "/nonexistent/patakt.txt")
    }

    #[test]
    fn unchanged_reports_the_published_id() {
        let api = Arc::new(FakeApi::new());
        let mut reconciler = reconciler(&api);
        let jane = PatientRecord::new(7, "Jane Doe", "123456");

        reconciler.apply(Some(jane.clone())).expect("first");
        api.clear_calls();

        let outcome = reconciler.apply(Some(jane)).expect("second");
        assert_eq!(outcome, CycleOutcome::Unchanged(PatientId(7)));
        assert!(api.calls().is_empty());
    }

    #[test]
    fn slot_follows_activation_and_retirement() {
        let api = Arc::new(FakeApi::new());
        let slot = PublishedSlot::new();
        let mut reconciler = reconciler(&api).with_published(slot.clone());

        reconciler
            .apply(Some(PatientRecord::new(7, "Jane Doe", "123456")))
            .expect("activate");
        assert_eq!(slot.get().map(|r| r.id), Some(PatientId(7)));

        reconciler.apply(None).expect("retire");
        assert_eq!(slot.get(), None);
    }

    #[test]
    fn remembered_patient_is_marked_active() {
        let api = Arc::new(FakeApi::new());
        let mut reconciler = reconciler(&api);
        reconciler
            .apply(Some(PatientRecord::new(7, "Jane Doe", "123456")))
            .expect("apply");
        assert!(reconciler.last_active().expect("last").active);
        assert_eq!(
            api.calls(),
            vec![
                ApiCall::Get(PatientId(7)),
                ApiCall::Add(RemotePatient {
                    id: PatientId(7),
                    name: "Jane Doe".to_string(),
                    ssn: "123456".to_string(),
                    pager_id: None,
                    active: true,
                }),
            ]
        );
    }
}
