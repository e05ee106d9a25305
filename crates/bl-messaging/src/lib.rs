//! Offchain messaging between Baseledger organizations.
//!
//! Process messages travel unencrypted between organizations over an
//! offchain transport, correlated with the ledger transaction they belong to.
//! Reject feedback is submitted back into the local proxy.

pub mod config;
pub mod envelope;
pub mod error;
pub mod feedback;
pub mod recording;
pub mod transport;

pub use config::MessagingConfig;
pub use envelope::OffchainEnvelope;
pub use error::{MessagingError, MessagingResult};
pub use feedback::{FeedbackSubmitter, HttpFeedbackSubmitter};
pub use recording::{RecordingFeedbackSubmitter, RecordingTransport};
pub use transport::{HttpTransport, OffchainTransport};
