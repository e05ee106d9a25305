use uuid::Uuid;

/// Errors from store and directory operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The workgroup is unknown to the directory.
    #[error("workgroup not found: {0}")]
    WorkgroupNotFound(Uuid),

    /// The workgroup's configured key cannot be used.
    #[error("invalid key for workgroup {workgroup_id}: {reason}")]
    InvalidKey { workgroup_id: Uuid, reason: String },

    /// The backing store failed or is unavailable.
    #[error("store backend error: {0}")]
    Backend(String),

    #[error("store lock poisoned")]
    LockPoisoned,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
