//! Patient file parser.
//!
//! The surgery software rewrites a single-line, pipe-delimited file whenever
//! the patient in focus changes:
//!
//! ```text
//! id|lastname|firstname|birthdate|ssn|sex||
//! ```
//!
//! An empty file means no patient is in focus. The file is ISO-8859-1
//! encoded; callers holding raw bytes should go through [`parse_patient_bytes`].

use crate::error::ParseError;
use crate::types::PatientRecord;

pub const FIELD_DELIMITER: char = '|';
pub const FIELD_COUNT: usize = 8;

const ID_FIELD: usize = 0;
const SURNAME_FIELD: usize = 1;
const GIVEN_NAME_FIELD: usize = 2;
const SSN_FIELD: usize = 4;

/// Decode ISO-8859-1 bytes. Every byte maps to the code point of equal value,
/// so this cannot fail.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().copied().map(char::from).collect()
}

/// Decode and parse raw file contents.
pub fn parse_patient_bytes(bytes: &[u8]) -> Result<Option<PatientRecord>, ParseError> {
    parse_patient(&decode_latin1(bytes))
}

/// Parse decoded file contents into the record in focus.
///
/// Returns `Ok(None)` when the file holds no record, or when the record's
/// national id is blank (the surgery software's way of clearing focus).
/// Only the first non-blank line is considered.
pub fn parse_patient(content: &str) -> Result<Option<PatientRecord>, ParseError> {
    let Some(line) = content.lines().find(|line| !line.trim().is_empty()) else {
        return Ok(None);
    };

    let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();
    if fields.len() != FIELD_COUNT {
        return Err(ParseError::FieldCount {
            expected: FIELD_COUNT,
            found: fields.len(),
        });
    }

    let raw_id = fields[ID_FIELD];
    let id = raw_id
        .trim()
        .parse::<i64>()
        .map_err(|_| ParseError::InvalidId {
            value: raw_id.to_string(),
        })?;

    let ssn = fields[SSN_FIELD].trim();
    if ssn.is_empty() {
        return Ok(None);
    }

    let name = format!("{} {}", fields[GIVEN_NAME_FIELD], fields[SURNAME_FIELD]);
    Ok(Some(PatientRecord::new(id, name, ssn)))
}
