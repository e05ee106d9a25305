use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagingError {
    #[error("no endpoint for organization {organization_id} in workgroup {workgroup_id}")]
    NoRoute {
        workgroup_id: Uuid,
        organization_id: Uuid,
    },

    #[error("message topic is not a workgroup id: {0}")]
    InvalidTopic(String),

    #[error("workgroup directory error: {0}")]
    Directory(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("recipient rejected delivery with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl From<reqwest::Error> for MessagingError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<bl_store::StoreError> for MessagingError {
    fn from(err: bl_store::StoreError) -> Self {
        Self::Directory(err.to_string())
    }
}

pub type MessagingResult<T> = Result<T, MessagingError>;
