use std::sync::Mutex;

use async_trait::async_trait;
use bl_types::OffchainProcessMessage;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

/// Downstream hand-off of proven business objects, e.g. to the system of
/// record.
///
/// Delivery is at-least-once. Concurrent deliveries of one result can each
/// reach this hook before a single commit wins, and a failed commit after a
/// successful hand-off is retried, so implementations must be idempotent on
/// `message.id`.
#[async_trait]
pub trait BusinessObjectProcessor: Send + Sync {
    async fn process_suggestion(
        &self,
        message: &OffchainProcessMessage,
        workgroup_id: Uuid,
        business_object: &Value,
    ) -> EngineResult<()>;

    async fn process_feedback(
        &self,
        message: &OffchainProcessMessage,
        workgroup_id: Uuid,
        business_object: &Value,
    ) -> EngineResult<()>;
}

/// Processor that only logs what it would hand off.
#[derive(Debug, Default)]
pub struct LoggingProcessor;

#[async_trait]
impl BusinessObjectProcessor for LoggingProcessor {
    async fn process_suggestion(
        &self,
        message: &OffchainProcessMessage,
        workgroup_id: Uuid,
        business_object: &Value,
    ) -> EngineResult<()> {
        tracing::info!(
            message_id = %message.id,
            %workgroup_id,
            business_object_type = %message.business_object_type,
            fields = business_object.as_object().map_or(0, |o| o.len()),
            "suggested business object accepted"
        );
        Ok(())
    }

    async fn process_feedback(
        &self,
        message: &OffchainProcessMessage,
        workgroup_id: Uuid,
        business_object: &Value,
    ) -> EngineResult<()> {
        tracing::info!(
            message_id = %message.id,
            %workgroup_id,
            status = %message.status_text_message,
            fields = business_object.as_object().map_or(0, |o| o.len()),
            "feedback business object accepted"
        );
        Ok(())
    }
}

/// Which processor hook was called.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessedKind {
    Suggestion,
    Feedback,
}

/// One recorded hand-off.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProcessedObject {
    pub kind: ProcessedKind,
    pub message_id: Uuid,
    pub workgroup_id: Uuid,
    pub business_object: Value,
}

/// Processor that records every hand-off, for tests and dry runs. Can be
/// told to fail.
#[derive(Debug, Default)]
pub struct RecordingProcessor {
    processed: Mutex<Vec<ProcessedObject>>,
    fail_with: Mutex<Option<String>>,
}

impl RecordingProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn processed(&self) -> Vec<ProcessedObject> {
        self.processed.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn fail_with(&self, reason: Option<&str>) {
        if let Ok(mut slot) = self.fail_with.lock() {
            *slot = reason.map(str::to_string);
        }
    }

    fn record(
        &self,
        kind: ProcessedKind,
        message: &OffchainProcessMessage,
        workgroup_id: Uuid,
        business_object: &Value,
    ) -> EngineResult<()> {
        if let Some(reason) = self.fail_with.lock().ok().and_then(|r| r.clone()) {
            return Err(EngineError::Processor(reason));
        }
        self.processed
            .lock()
            .map_err(|_| EngineError::Processor("recorder poisoned".into()))?
            .push(ProcessedObject {
                kind,
                message_id: message.id,
                workgroup_id,
                business_object: business_object.clone(),
            });
        Ok(())
    }
}

#[async_trait]
impl BusinessObjectProcessor for RecordingProcessor {
    async fn process_suggestion(
        &self,
        message: &OffchainProcessMessage,
        workgroup_id: Uuid,
        business_object: &Value,
    ) -> EngineResult<()> {
        self.record(ProcessedKind::Suggestion, message, workgroup_id, business_object)
    }

    async fn process_feedback(
        &self,
        message: &OffchainProcessMessage,
        workgroup_id: Uuid,
        business_object: &Value,
    ) -> EngineResult<()> {
        self.record(ProcessedKind::Feedback, message, workgroup_id, business_object)
    }
}
