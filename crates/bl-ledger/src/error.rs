use uuid::Uuid;

/// Errors produced by ledger reads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("committed transaction {0} not found")]
    NotFound(Uuid),

    #[error("ledger transport error: {0}")]
    Transport(String),

    #[error("could not decode committed transaction: {0}")]
    Deserialization(String),

    #[error("ledger request timed out")]
    Timeout,
}

impl From<reqwest::Error> for LedgerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Deserialization(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
