use async_trait::async_trait;
use bl_types::SynchronizationFeedback;
use reqwest::Client;

use crate::config::MessagingConfig;
use crate::error::{MessagingError, MessagingResult};

/// Submission of synchronization feedback into the local proxy, which
/// broadcasts it and forwards it like any other process step.
#[async_trait]
pub trait FeedbackSubmitter: Send + Sync {
    async fn submit_feedback(&self, feedback: &SynchronizationFeedback) -> MessagingResult<()>;
}

pub struct HttpFeedbackSubmitter {
    client: Client,
    url: String,
}

impl HttpFeedbackSubmitter {
    pub fn new(config: &MessagingConfig) -> MessagingResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            url: config.feedback_url.clone(),
        })
    }
}

#[async_trait]
impl FeedbackSubmitter for HttpFeedbackSubmitter {
    async fn submit_feedback(&self, feedback: &SynchronizationFeedback) -> MessagingResult<()> {
        let response = self.client.post(&self.url).json(feedback).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(MessagingError::Rejected {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        tracing::info!(
            recipient = %feedback.recipient,
            approved = feedback.approved,
            original_message = %feedback.original_offchain_process_message_id,
            "synchronization feedback submitted"
        );
        Ok(())
    }
}
