//! Foundation types for Baseledger trustmesh reconciliation.
//!
//! Every other `bl-*` crate depends on `bl-types`. The records here are the
//! data contracts shared between the reconciliation engine and its external
//! collaborators (ledger, stores, messaging).
//!
//! # Key Types
//!
//! - [`TrustmeshEntry`]: one local step of a cross-organization exchange
//! - [`TransactionResult`]: an observed ledger commit event for an entry
//! - [`OffchainProcessMessage`]: correlation metadata and proof material
//! - [`BaseledgerTransactionPayload`]: cleartext of an on-ledger payload
//! - [`EntryType`] / [`CommitmentState`]: the state machine's vocabulary
//! - [`Digest`]: BLAKE3 digest used for business object proofs

pub mod digest;
pub mod entry;
pub mod error;
pub mod message;
pub mod transaction;
pub mod workgroup;

pub use digest::Digest;
pub use entry::{CommitmentState, EntryType, TrustmeshEntry};
pub use error::TypeError;
pub use message::{OffchainProcessMessage, SynchronizationFeedback};
pub use transaction::{
    BaseledgerTransactionPayload, CommittedTransaction, CommittedTransactionResponse, Job,
    TransactionResult, TxInfo,
};
pub use workgroup::{Organization, Workgroup, WorkgroupMember};
