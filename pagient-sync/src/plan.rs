//! Pure transition planning: what does the record in the file mean, given
//! the record published last?

use pagient_core::{PatientId, PatientRecord};

/// What a reconciliation cycle has to do remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// No patient in focus, none published.
    Idle,
    /// The file still names the published patient.
    Unchanged(PatientId),
    /// Focus moved. `retire` is the published patient to resolve first,
    /// `activate` the one to publish afterwards.
    Switch {
        retire: Option<PatientRecord>,
        activate: Option<PatientRecord>,
    },
}

pub fn plan(last_active: Option<&PatientRecord>, next: Option<&PatientRecord>) -> Transition {
    match (last_active, next) {
        (None, None) => Transition::Idle,
        (Some(last), Some(next)) if last.id == next.id => Transition::Unchanged(last.id),
        (last, next) => Transition::Switch {
            retire: last.cloned(),
            activate: next.cloned(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jane() -> PatientRecord {
        PatientRecord::new(7, "Jane Doe", "123456")
    }

    fn max() -> PatientRecord {
        PatientRecord::new(8, "Max Muster", "654321")
    }

    #[test]
    fn nothing_before_and_nothing_now_is_idle() {
        assert_eq!(plan(None, None), Transition::Idle);
    }

    #[test]
    fn same_id_is_unchanged_even_if_name_differs() {
        let renamed = PatientRecord::new(7, "Jane Roe", "123456");
        assert_eq!(plan(Some(&jane()), Some(&renamed)), Transition::Unchanged(PatientId(7)));
    }

    #[test]
    fn first_patient_only_activates() {
        assert_eq!(
            plan(None, Some(&jane())),
            Transition::Switch {
                retire: None,
                activate: Some(jane())
            }
        );
    }

    #[test]
    fn cleared_file_only_retires() {
        assert_eq!(
            plan(Some(&jane()), None),
            Transition::Switch {
                retire: Some(jane()),
                activate: None
            }
        );
    }

    #[test]
    fn new_patient_retires_then_activates() {
        assert_eq!(
            plan(Some(&jane()), Some(&max())),
            Transition::Switch {
                retire: Some(jane()),
                activate: Some(max())
            }
        );
    }
}
