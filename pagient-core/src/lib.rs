//! Pagient core library — domain types, patient file parser, configuration.
//!
//! - [`types`] — newtypes and domain structs
//! - [`parser`] — patient file → [`PatientRecord`]
//! - [`config`] — YAML configuration load / validate
//! - [`error`] — [`ParseError`], [`ConfigError`]

pub mod config;
pub mod error;
pub mod parser;
pub mod types;

pub use config::{BackendConfig, Config, GeneralConfig, LogConfig};
pub use error::{ConfigError, ParseError};
pub use parser::{decode_latin1, parse_patient, parse_patient_bytes};
pub use types::{PatientId, PatientRecord, RemotePatient};
