use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bl_types::{OffchainProcessMessage, SynchronizationFeedback};
use uuid::Uuid;

use crate::envelope::OffchainEnvelope;
use crate::error::{MessagingError, MessagingResult};
use crate::feedback::FeedbackSubmitter;
use crate::transport::OffchainTransport;

/// Transport that records every envelope instead of delivering it.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<OffchainEnvelope>>,
    failing: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail with a transport error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<OffchainEnvelope> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl OffchainTransport for RecordingTransport {
    async fn send(
        &self,
        message: &OffchainProcessMessage,
        recipient_org_id: Uuid,
        correlation_id: &str,
    ) -> MessagingResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MessagingError::Transport("recipient unreachable".into()));
        }
        self.sent
            .lock()
            .map_err(|_| MessagingError::Transport("recorder poisoned".into()))?
            .push(OffchainEnvelope::new(
                message.clone(),
                recipient_org_id,
                correlation_id,
            ));
        Ok(())
    }
}

/// Feedback submitter that records instead of submitting.
#[derive(Debug, Default)]
pub struct RecordingFeedbackSubmitter {
    submitted: Mutex<Vec<SynchronizationFeedback>>,
}

impl RecordingFeedbackSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submitted(&self) -> Vec<SynchronizationFeedback> {
        self.submitted.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl FeedbackSubmitter for RecordingFeedbackSubmitter {
    async fn submit_feedback(&self, feedback: &SynchronizationFeedback) -> MessagingResult<()> {
        self.submitted
            .lock()
            .map_err(|_| MessagingError::Transport("recorder poisoned".into()))?
            .push(feedback.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn failing_transport_records_nothing() {
        let transport = RecordingTransport::new();
        transport.set_failing(true);
        let msg: OffchainProcessMessage = serde_json::from_value(serde_json::json!({
            "id": Uuid::nil(),
            "sender_id": Uuid::nil(),
            "receiver_id": Uuid::nil(),
            "topic": Uuid::nil().to_string(),
            "referenced_offchain_process_message_id": null,
            "baseledger_sync_tree_json": "{}",
            "business_object_proof": "",
            "baseledger_business_object_id": null,
            "referenced_baseledger_business_object_id": null,
            "baseledger_transaction_id_of_stored_proof": Uuid::nil(),
            "tendermint_transaction_id_of_stored_proof": Uuid::nil(),
            "referenced_baseledger_transaction_id": null
        }))
        .unwrap();
        assert!(transport.send(&msg, Uuid::nil(), "h").await.is_err());
        assert!(transport.sent().is_empty());

        transport.set_failing(false);
        transport.send(&msg, Uuid::nil(), "h").await.unwrap();
        assert_eq!(transport.sent().len(), 1);
    }
}
