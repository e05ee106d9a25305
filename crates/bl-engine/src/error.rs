use std::fmt;
use std::time::Duration;

use bl_crypto::{CipherError, SyncTreeError};
use bl_ledger::LedgerError;
use bl_messaging::MessagingError;
use bl_store::StoreError;
use uuid::Uuid;

/// How an aborted reconciliation should be treated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureCategory {
    /// Infrastructure hiccup. The entry stays `Pending` and redelivery is safe.
    Transient,
    /// Payload or proof material could not be read: tampering, a key
    /// mismatch or a malformed configured key. Redelivery will not help and
    /// the entry stays `Pending`.
    Integrity,
    /// A programming or configuration fault. Processing must stop.
    Fatal,
}

impl FailureCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transient => "transient",
            Self::Integrity => "integrity",
            Self::Fatal => "fatal",
        }
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that abort a reconciliation attempt.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("unknown trustmesh entry type: {0}")]
    UnknownEntryType(String),

    #[error("offchain process message {0} not found")]
    MessageNotFound(Uuid),

    #[error("no trustmesh entry for transaction {0}")]
    UnknownTransaction(Uuid),

    /// Zero rows changed while the entry is still pending.
    #[error("conditional update for transaction {0} matched no pending entry")]
    UpdateConflict(Uuid),

    #[error("conditional update for transaction {tx_id} changed {rows} rows")]
    UnexpectedRowCount { tx_id: Uuid, rows: u64 },

    #[error("could not fetch committed transaction {tx_id}: {source}")]
    LedgerFetch {
        tx_id: Uuid,
        #[source]
        source: LedgerError,
    },

    #[error("could not resolve key for workgroup {workgroup_id}: {source}")]
    KeyResolution {
        workgroup_id: Uuid,
        #[source]
        source: StoreError,
    },

    #[error("payload decryption failed: {0}")]
    Decryption(#[source] CipherError),

    #[error("payload could not be decoded: {0}")]
    PayloadDecode(String),

    #[error("sync tree error: {0}")]
    SyncTree(#[from] SyncTreeError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("messaging error: {0}")]
    Messaging(#[from] MessagingError),

    #[error("business object processing failed: {0}")]
    Processor(String),

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}

impl EngineError {
    pub fn category(&self) -> FailureCategory {
        match self {
            Self::UnknownEntryType(_) => FailureCategory::Fatal,
            // a malformed configured key never heals on redelivery
            Self::KeyResolution {
                source: StoreError::InvalidKey { .. },
                ..
            }
            | Self::Decryption(_)
            | Self::PayloadDecode(_)
            | Self::SyncTree(_)
            | Self::UnknownTransaction(_)
            | Self::UnexpectedRowCount { .. } => FailureCategory::Integrity,
            Self::MessageNotFound(_)
            | Self::UpdateConflict(_)
            | Self::LedgerFetch { .. }
            | Self::KeyResolution { .. }
            | Self::Store(_)
            | Self::Messaging(_)
            | Self::Processor(_)
            | Self::Timeout { .. } => FailureCategory::Transient,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.category() == FailureCategory::Fatal
    }
}

impl From<CipherError> for EngineError {
    fn from(err: CipherError) -> Self {
        match err {
            CipherError::Serialization(msg) => Self::PayloadDecode(msg),
            other => Self::Decryption(other),
        }
    }
}

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_entry_type_is_fatal() {
        let err = EngineError::UnknownEntryType("Gossip".into());
        assert!(err.is_fatal());
        assert_eq!(err.category().to_string(), "fatal");
    }

    #[test]
    fn cipher_errors_split_into_decryption_and_decode() {
        let decrypt: EngineError = CipherError::DecryptionFailed.into();
        assert!(matches!(decrypt, EngineError::Decryption(_)));
        assert_eq!(decrypt.category(), FailureCategory::Integrity);

        let decode: EngineError = CipherError::Serialization("eof".into()).into();
        assert!(matches!(decode, EngineError::PayloadDecode(_)));
        assert_eq!(decode.category(), FailureCategory::Integrity);
    }

    #[test]
    fn infrastructure_failures_are_transient() {
        let fetch = EngineError::LedgerFetch {
            tx_id: Uuid::nil(),
            source: LedgerError::Timeout,
        };
        assert_eq!(fetch.category(), FailureCategory::Transient);
        assert_eq!(
            EngineError::MessageNotFound(Uuid::nil()).category(),
            FailureCategory::Transient
        );
        assert_eq!(
            EngineError::Timeout {
                operation: "ledger fetch",
                after: Duration::from_millis(5)
            }
            .category(),
            FailureCategory::Transient
        );
        assert!(!fetch.is_fatal());
    }

    #[test]
    fn key_resolution_splits_on_cause() {
        let workgroup_id = Uuid::new_v4();
        let missing = EngineError::KeyResolution {
            workgroup_id,
            source: StoreError::WorkgroupNotFound(workgroup_id),
        };
        assert_eq!(missing.category(), FailureCategory::Transient);

        let malformed = EngineError::KeyResolution {
            workgroup_id,
            source: StoreError::InvalidKey {
                workgroup_id,
                reason: "expected 32 bytes, got 2".into(),
            },
        };
        assert_eq!(malformed.category(), FailureCategory::Integrity);
    }
}
