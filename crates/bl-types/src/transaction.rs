use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entry::TrustmeshEntry;

/// Ledger-side status of a broadcast transaction, as observed by a poller.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInfo {
    /// Block height; empty until the transaction is in a block.
    #[serde(default)]
    pub tx_height: String,
    /// Block timestamp; empty until the transaction is in a block.
    #[serde(default)]
    pub tx_timestamp: String,
    #[serde(default)]
    pub tx_valid: bool,
    #[serde(default)]
    pub tx_code: u32,
    #[serde(default)]
    pub tx_log: String,
}

impl TxInfo {
    /// A valid transaction committed at `height`.
    pub fn committed(height: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            tx_height: height.into(),
            tx_timestamp: timestamp.into(),
            tx_valid: true,
            tx_code: 0,
            tx_log: String::new(),
        }
    }

    /// A transaction the ledger included but rejected.
    pub fn rejected(
        height: impl Into<String>,
        timestamp: impl Into<String>,
        code: u32,
        log: impl Into<String>,
    ) -> Self {
        Self {
            tx_height: height.into(),
            tx_timestamp: timestamp.into(),
            tx_valid: false,
            tx_code: code,
            tx_log: log.into(),
        }
    }

    /// A transaction that is not in a block yet.
    pub fn pending() -> Self {
        Self::default()
    }

    /// Both height and timestamp are known.
    pub fn is_final(&self) -> bool {
        !self.tx_height.trim().is_empty() && !self.tx_timestamp.trim().is_empty()
    }
}

/// The local job a transaction result correlates to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub trustmesh_entry: TrustmeshEntry,
}

/// One observed ledger commit event for a locally broadcast transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResult {
    pub job: Job,
    pub tx_info: TxInfo,
}

impl TransactionResult {
    pub fn new(entry: TrustmeshEntry, tx_info: TxInfo) -> Self {
        Self {
            job: Job {
                trustmesh_entry: entry,
            },
            tx_info,
        }
    }

    pub fn entry(&self) -> &TrustmeshEntry {
        &self.job.trustmesh_entry
    }

    pub fn tx_id(&self) -> Uuid {
        self.job.trustmesh_entry.tendermint_transaction_id
    }
}

/// A transaction record as stored by the ledger's baseledger module.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommittedTransaction {
    pub id: String,
    #[serde(default)]
    pub creator: String,
    pub baseledger_transaction_id: String,
    /// Hex `nonce || ciphertext || tag` produced by the payload cipher.
    pub payload: String,
}

/// Envelope returned by the ledger's REST query endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedTransactionResponse {
    #[serde(rename = "BaseledgerTransaction")]
    pub baseledger_transaction: CommittedTransaction,
}

/// Cleartext content of an on-ledger transaction before privatization.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseledgerTransactionPayload {
    #[serde(default)]
    pub phonebook_identifier: String,
    /// "Suggest", "Approve" or "Reject".
    pub transaction_type: String,
    pub offchain_message_id: Uuid,
    pub referenced_offchain_message_id: Option<Uuid>,
    pub baseledger_transaction_id: Uuid,
    pub referenced_baseledger_transaction_id: Option<Uuid>,
    /// Hex digest of the business object (sync tree root).
    pub proof: String,
    pub baseledger_business_object_id: Option<Uuid>,
    pub referenced_baseledger_business_object_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryType;

    #[test]
    fn finality_needs_height_and_timestamp() {
        assert!(TxInfo::committed("100", "2021-05-28T21:42:59Z").is_final());
        assert!(!TxInfo::pending().is_final());
        assert!(!TxInfo::committed("100", "").is_final());
        assert!(!TxInfo::committed("  ", "2021-05-28T21:42:59Z").is_final());
    }

    #[test]
    fn rejected_is_final_but_invalid() {
        let info = TxInfo::rejected("7", "2021-05-28T21:42:59Z", 11, "out of gas");
        assert!(info.is_final());
        assert!(!info.tx_valid);
        assert_eq!(info.tx_code, 11);
    }

    #[test]
    fn result_exposes_entry() {
        let tx = Uuid::new_v4();
        let entry = TrustmeshEntry::new(tx, EntryType::SuggestionSent, Uuid::new_v4());
        let result = TransactionResult::new(entry.clone(), TxInfo::pending());
        assert_eq!(result.tx_id(), tx);
        assert_eq!(result.entry(), &entry);
    }

    #[test]
    fn committed_response_wire_shape() {
        let json = r#"{
            "BaseledgerTransaction": {
                "id": "0",
                "creator": "baseledger1xyz",
                "baseledgerTransactionId": "6f1c0b7e-2f43-4c36-9a43-2b9c4f6f9a10",
                "payload": "abcd"
            }
        }"#;
        let resp: CommittedTransactionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.baseledger_transaction.payload, "abcd");
        assert_eq!(resp.baseledger_transaction.creator, "baseledger1xyz");
    }

    #[test]
    fn tx_info_defaults_missing_fields() {
        let info: TxInfo = serde_json::from_str(r#"{"tx_valid": true}"#).unwrap();
        assert!(info.tx_valid);
        assert!(!info.is_final());
    }
}
