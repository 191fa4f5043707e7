//! # pagient-sync
//!
//! Reconciles the patient file with the remote patient service.
//!
//! [`plan::plan`] decides what a change of focus means; a [`Reconciler`]
//! owns the last published patient and applies the decision remotely, one
//! cycle at a time.

pub mod error;
pub mod plan;
pub mod reconciler;

pub use error::SyncError;
pub use plan::{plan, Transition};
pub use reconciler::{Activation, CycleOutcome, PublishedSlot, Reconciler, Retirement};
