//! Trustmesh reconciliation for Baseledger.
//!
//! When the ledger reports the outcome of a locally broadcast transaction,
//! the [`ReconciliationEngine`] advances the matching trustmesh entry from
//! `Pending` to `Committed` or `Invalid`, performing the side effects that
//! belong to the entry's workstep first:
//!
//! - outgoing suggestions and feedback are forwarded to the counterparty
//! - received suggestions have their business object proof checked against
//!   the committed ledger payload; a mismatch is answered with reject
//!   feedback
//! - received feedback is (optionally) checked the same way and handed to the
//!   downstream processor
//!
//! All collaborators are passed in through [`Collaborators`]. The
//! [`ReconciliationWorker`] drains a channel of results with bounded
//! concurrency.

pub mod config;
pub mod engine;
pub mod error;
pub mod outcome;
pub mod processor;
pub mod state_machine;
pub mod worker;

#[cfg(test)]
mod testing;

pub use config::EngineConfig;
pub use engine::{Collaborators, ReconciliationEngine};
pub use error::{EngineError, EngineResult, FailureCategory};
pub use outcome::{ReconcileAction, ReconcileOutcome};
pub use processor::{
    BusinessObjectProcessor, LoggingProcessor, ProcessedKind, ProcessedObject, RecordingProcessor,
};
pub use state_machine::{EntryStateMachine, Transition};
pub use worker::{ReconciliationWorker, WorkerReport};
