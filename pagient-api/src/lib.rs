//! # pagient-api
//!
//! Client side of the remote patient service.
//!
//! Everything the watcher needs from the service goes through the
//! [`PatientApi`] capability. [`ApiClient`] implements it over HTTP; call
//! [`ApiClient::authenticate`] to obtain a session-scoped client first.

pub mod client;
pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod fake;

pub use client::{ApiClient, PatientApi};
pub use error::ApiError;
