//! Domain types shared by the parser, the remote client and the reconciler.
//!
//! A [`PatientRecord`] is what the surgery software wrote into the watched
//! file. A [`RemotePatient`] is the patient service's view of the same person,
//! which additionally knows whether a pager has been handed out.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Stable external identifier assigned by the surgery software.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(pub i64);

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for PatientId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// One patient as read from the watched file.
///
/// `active` stays `false` until the reconciler decides to publish the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id: PatientId,
    /// `"<given> <surname>"`.
    pub name: String,
    pub ssn: String,
    #[serde(default)]
    pub active: bool,
}

impl PatientRecord {
    pub fn new(id: i64, name: impl Into<String>, ssn: impl Into<String>) -> Self {
        Self {
            id: PatientId(id),
            name: name.into(),
            ssn: ssn.into(),
            active: false,
        }
    }

    /// Copy of this record flagged as the active patient.
    pub fn activated(&self) -> Self {
        Self {
            active: true,
            ..self.clone()
        }
    }
}

/// Patient as stored by the remote patient service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePatient {
    pub id: PatientId,
    pub name: String,
    pub ssn: String,
    /// Set by the paging workflow. Updates carry it back unchanged; creates never send it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pager_id: Option<i64>,
    #[serde(default)]
    pub active: bool,
}

impl RemotePatient {
    pub fn has_pager(&self) -> bool {
        self.pager_id.is_some()
    }
}

impl From<&PatientRecord> for RemotePatient {
    fn from(record: &PatientRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            ssn: record.ssn.clone(),
            pager_id: None,
            active: record.active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activated_copies_identity_and_sets_flag() {
        let record = PatientRecord::new(7, "Jane Doe", "123456");
        let active = record.activated();
        assert!(!record.active);
        assert!(active.active);
        assert_eq!(active.id, PatientId(7));
        assert_eq!(active.name, "Jane Doe");
    }

    #[test]
    fn remote_patient_omits_missing_pager() {
        let remote = RemotePatient::from(&PatientRecord::new(3, "Max Muster", "999").activated());
        let encoded = serde_yaml::to_string(&remote).expect("encode");
        assert!(!encoded.contains("pager_id"), "got: {encoded}");
        assert!(encoded.contains("active: true"), "got: {encoded}");
    }

    #[test]
    fn remote_patient_defaults_pager_to_none() {
        let remote: RemotePatient =
            serde_yaml::from_str("id: 4\nname: A B\nssn: '1'\n").expect("decode");
        assert_eq!(remote.pager_id, None);
        assert!(!remote.active);
        assert!(!remote.has_pager());
    }
}
