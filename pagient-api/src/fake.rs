//! In-memory [`PatientApi`] that records every call.
//!
//! Enabled for downstream tests through the `test-util` feature.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use pagient_core::{PatientId, RemotePatient};

use crate::client::PatientApi;
use crate::error::ApiError;

/// One remote call as observed by [`FakeApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    Get(PatientId),
    Add(RemotePatient),
    Update(RemotePatient),
    Remove(PatientId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Get,
    Add,
    Update,
    Remove,
}

#[derive(Debug, Default)]
struct FakeState {
    patients: BTreeMap<PatientId, RemotePatient>,
    calls: Vec<ApiCall>,
    failures: HashMap<Operation, ApiError>,
}

#[derive(Debug, Default)]
pub struct FakeApi {
    state: Mutex<FakeState>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_patient(self, patient: RemotePatient) -> Self {
        self.insert(patient);
        self
    }

    pub fn insert(&self, patient: RemotePatient) {
        self.lock().patients.insert(patient.id, patient);
    }

    pub fn patient(&self, id: PatientId) -> Option<RemotePatient> {
        self.lock().patients.get(&id).cloned()
    }

    pub fn patients(&self) -> Vec<RemotePatient> {
        self.lock().patients.values().cloned().collect()
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.lock().calls.clone()
    }

    /// Calls other than `Get`, in order.
    pub fn mutations(&self) -> Vec<ApiCall> {
        self.lock()
            .calls
            .iter()
            .filter(|call| !matches!(call, ApiCall::Get(_)))
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Make the next call of `operation` fail with `error`. The call is
    /// still recorded.
    pub fn fail_next(&self, operation: Operation, error: ApiError) {
        self.lock().failures.insert(operation, error);
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, call: ApiCall, operation: Operation) -> Result<MutexGuard<'_, FakeState>, ApiError> {
        let mut state = self.lock();
        state.calls.push(call);
        let failure = state.failures.remove(&operation);
        match failure {
            Some(err) => Err(err),
            None => Ok(state),
        }
    }
}

impl PatientApi for FakeApi {
    fn get_patient(&self, id: PatientId) -> Result<RemotePatient, ApiError> {
        let state = self.record(ApiCall::Get(id), Operation::Get)?;
        state.patients.get(&id).cloned().ok_or(ApiError::NotFound {
            resource: format!("patient {id}"),
        })
    }

    fn add_patient(&self, patient: &RemotePatient) -> Result<(), ApiError> {
        let mut state = self.record(ApiCall::Add(patient.clone()), Operation::Add)?;
        state.patients.insert(patient.id, patient.clone());
        Ok(())
    }

    fn update_patient(&self, patient: &RemotePatient) -> Result<(), ApiError> {
        let mut state = self.record(ApiCall::Update(patient.clone()), Operation::Update)?;
        match state.patients.get_mut(&patient.id) {
            Some(existing) => {
                *existing = patient.clone();
                Ok(())
            }
            None => Err(ApiError::NotFound {
                resource: format!("patient {}", patient.id),
            }),
        }
    }

    fn remove_patient(&self, id: PatientId) -> Result<(), ApiError> {
        let mut state = self.record(ApiCall::Remove(id), Operation::Remove)?;
        match state.patients.remove(&id) {
            Some(_) => Ok(()),
            None => Err(ApiError::NotFound {
                resource: format!("patient {id}"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient(id: i64) -> RemotePatient {
        RemotePatient {
            id: PatientId(id),
            name: "Jane Doe".to_string(),
            ssn: "123456".to_string(),
            pager_id: None,
            active: false,
        }
    }

    #[test]
    fn injected_failure_fires_once_and_is_recorded() {
        let api = FakeApi::new().with_patient(patient(1));
        api.fail_next(Operation::Get, ApiError::Transport("down".into()));

        assert!(api.get_patient(PatientId(1)).is_err());
        assert!(api.get_patient(PatientId(1)).is_ok());
        assert_eq!(
            api.calls(),
            vec![ApiCall::Get(PatientId(1)), ApiCall::Get(PatientId(1))]
        );
    }

    #[test]
    fn missing_patient_is_not_found() {
        let api = FakeApi::new();
        let err = api.get_patient(PatientId(9)).unwrap_err();
        assert!(err.is_not_found());
    }
}
