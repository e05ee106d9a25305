use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Correlation metadata and proof material exchanged between organizations
/// for one step of a business process. Travels unencrypted over the
/// messaging transport; the matching ledger payload is encrypted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffchainProcessMessage {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    /// Workgroup the exchange belongs to.
    pub topic: String,
    #[serde(default)]
    pub workstep_type: String,
    pub referenced_offchain_process_message_id: Option<Uuid>,
    /// Serialized sync tree covering the business object.
    pub baseledger_sync_tree_json: String,
    /// Hex digest of the business object at send time.
    pub business_object_proof: String,
    pub baseledger_business_object_id: Option<Uuid>,
    pub referenced_baseledger_business_object_id: Option<Uuid>,
    #[serde(default)]
    pub status_text_message: String,
    /// Ledger transaction whose payload carries the proof for this step.
    pub baseledger_transaction_id_of_stored_proof: Uuid,
    pub tendermint_transaction_id_of_stored_proof: Uuid,
    #[serde(default)]
    pub business_object_type: String,
    #[serde(default)]
    pub baseledger_transaction_type: String,
    pub referenced_baseledger_transaction_id: Option<Uuid>,
    #[serde(default)]
    pub entry_type: String,
}

/// Approval or rejection of a suggested business object, submitted back
/// into the local proxy so it is broadcast and forwarded like any other step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynchronizationFeedback {
    pub workgroup_id: Uuid,
    #[serde(default)]
    pub business_object_type: String,
    /// Organization that receives the feedback.
    pub recipient: Uuid,
    pub approved: bool,
    pub baseledger_business_object_id_of_approved_object: Option<Uuid>,
    pub hash_of_object_to_approve: String,
    pub original_baseledger_transaction_id: Uuid,
    pub original_offchain_process_message_id: Uuid,
    #[serde(default)]
    pub feedback_message: String,
    #[serde(default)]
    pub baseledger_proven_business_object_json: String,
}

impl SynchronizationFeedback {
    pub const PROOF_MISMATCH: &'static str =
        "business object proof does not match the committed transaction";

    /// Reject `message`, addressed back to the organization that sent it.
    pub fn reject(message: &OffchainProcessMessage, workgroup_id: Uuid) -> Self {
        Self {
            workgroup_id,
            business_object_type: message.business_object_type.clone(),
            recipient: message.sender_id,
            approved: false,
            baseledger_business_object_id_of_approved_object: message
                .baseledger_business_object_id,
            hash_of_object_to_approve: message.business_object_proof.clone(),
            original_baseledger_transaction_id: message.baseledger_transaction_id_of_stored_proof,
            original_offchain_process_message_id: message.id,
            feedback_message: Self::PROOF_MISMATCH.to_string(),
            baseledger_proven_business_object_json: message.baseledger_sync_tree_json.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> OffchainProcessMessage {
        OffchainProcessMessage {
            id: Uuid::new_v4(),
            sender_id: Uuid::new_v4(),
            receiver_id: Uuid::new_v4(),
            topic: Uuid::new_v4().to_string(),
            workstep_type: "NewVersion".into(),
            referenced_offchain_process_message_id: None,
            baseledger_sync_tree_json: "{}".into(),
            business_object_proof: "ab".repeat(32),
            baseledger_business_object_id: Some(Uuid::new_v4()),
            referenced_baseledger_business_object_id: None,
            status_text_message: "NewVersion suggested".into(),
            baseledger_transaction_id_of_stored_proof: Uuid::new_v4(),
            tendermint_transaction_id_of_stored_proof: Uuid::new_v4(),
            business_object_type: "PurchaseOrder".into(),
            baseledger_transaction_type: "Suggest".into(),
            referenced_baseledger_transaction_id: None,
            entry_type: "SuggestionReceived".into(),
        }
    }

    #[test]
    fn reject_is_addressed_to_sender() {
        let msg = message();
        let workgroup = Uuid::new_v4();
        let feedback = SynchronizationFeedback::reject(&msg, workgroup);
        assert!(!feedback.approved);
        assert_eq!(feedback.recipient, msg.sender_id);
        assert_eq!(feedback.workgroup_id, workgroup);
        assert_eq!(feedback.original_offchain_process_message_id, msg.id);
        assert_eq!(
            feedback.original_baseledger_transaction_id,
            msg.baseledger_transaction_id_of_stored_proof
        );
        assert_eq!(feedback.hash_of_object_to_approve, msg.business_object_proof);
        assert_eq!(feedback.business_object_type, "PurchaseOrder");
    }

    #[test]
    fn message_serde_roundtrip() {
        let msg = message();
        let json = serde_json::to_string(&msg).unwrap();
        let parsed: OffchainProcessMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, msg);
    }
}
