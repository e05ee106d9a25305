use bl_types::OffchainProcessMessage;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wire form of an offchain process message delivered to another
/// organization. The correlation id is the ledger transaction hash the
/// message belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffchainEnvelope {
    pub correlation_id: String,
    pub recipient_org_id: Uuid,
    pub message: OffchainProcessMessage,
}

impl OffchainEnvelope {
    pub fn new(
        message: OffchainProcessMessage,
        recipient_org_id: Uuid,
        correlation_id: impl Into<String>,
    ) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            recipient_org_id,
            message,
        }
    }
}
