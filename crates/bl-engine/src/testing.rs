//! In-memory wiring shared by the engine and worker tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bl_crypto::{PayloadCipher, PrivatizeKey, SyncTree};
use bl_ledger::{InMemoryLedger, LedgerReader, LedgerResult};
use bl_messaging::{RecordingFeedbackSubmitter, RecordingTransport};
use bl_store::{CommitmentStore, InMemoryStore, StoreResult};
use bl_types::{
    BaseledgerTransactionPayload, CommitmentState, CommittedTransaction, Digest, EntryType,
    OffchainProcessMessage, TransactionResult, TrustmeshEntry, TxInfo, Workgroup,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::engine::{Collaborators, ReconciliationEngine};
use crate::processor::RecordingProcessor;

/// Ledger that answers only after `delay`.
struct SlowLedger {
    inner: Arc<InMemoryLedger>,
    delay: Duration,
}

#[async_trait]
impl LedgerReader for SlowLedger {
    async fn fetch_committed_transaction(&self, id: Uuid) -> LedgerResult<CommittedTransaction> {
        tokio::time::sleep(self.delay).await;
        self.inner.fetch_committed_transaction(id).await
    }
}

/// Commitment store whose lookups and updates answer only after their
/// delay. A delayed update has not been applied while it waits.
struct SlowCommitments {
    inner: Arc<InMemoryStore>,
    lookup_delay: Duration,
    update_delay: Duration,
}

#[async_trait]
impl CommitmentStore for SlowCommitments {
    async fn update_commitment_state(
        &self,
        tx_id: Uuid,
        state: CommitmentState,
        block_height: &str,
        timestamp: &str,
    ) -> StoreResult<u64> {
        tokio::time::sleep(self.update_delay).await;
        self.inner
            .update_commitment_state(tx_id, state, block_height, timestamp)
            .await
    }

    async fn find_entry(&self, tx_id: Uuid) -> StoreResult<Option<TrustmeshEntry>> {
        tokio::time::sleep(self.lookup_delay).await;
        self.inner.find_entry(tx_id).await
    }
}

/// Artificial latency per collaborator. Zero means no wrapper at all.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Delays {
    pub ledger: Duration,
    pub entry_lookup: Duration,
    pub commitment_update: Duration,
}

pub(crate) struct Harness {
    pub engine: ReconciliationEngine,
    pub store: Arc<InMemoryStore>,
    pub ledger: Arc<InMemoryLedger>,
    pub transport: Arc<RecordingTransport>,
    pub feedback: Arc<RecordingFeedbackSubmitter>,
    pub processor: Arc<RecordingProcessor>,
    pub workgroup: Uuid,
    pub key: PrivatizeKey,
}

/// Knobs for how one seeded exchange deviates from the happy path.
pub(crate) struct SeedOptions {
    /// Proof carried in the encrypted ledger payload.
    pub ledger_proof: String,
    /// Key the ledger payload is sealed with.
    pub ledger_key: PrivatizeKey,
    pub publish_to_ledger: bool,
    pub sync_tree_json: String,
}

/// One seeded exchange: a pending entry, its message and ledger record.
pub(crate) struct Seed {
    pub result: TransactionResult,
    pub message: OffchainProcessMessage,
    pub receiver_org: Uuid,
    pub proof: Digest,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_delays(config, Delays::default())
    }

    pub fn with_slow_ledger(config: EngineConfig, delay: Duration) -> Self {
        Self::with_delays(
            config,
            Delays {
                ledger: delay,
                ..Delays::default()
            },
        )
    }

    pub fn with_delays(config: EngineConfig, delays: Delays) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let ledger = Arc::new(InMemoryLedger::new());
        let transport = Arc::new(RecordingTransport::new());
        let feedback = Arc::new(RecordingFeedbackSubmitter::new());
        let processor = Arc::new(RecordingProcessor::new());

        let workgroup = Uuid::new_v4();
        let key = PrivatizeKey::generate();
        store
            .insert_workgroup(Workgroup {
                id: workgroup,
                description: "purchase orders".into(),
                privatize_key: key.to_hex(),
            })
            .unwrap();

        let reader: Arc<dyn LedgerReader> = if delays.ledger.is_zero() {
            ledger.clone()
        } else {
            Arc::new(SlowLedger {
                inner: ledger.clone(),
                delay: delays.ledger,
            })
        };
        let commitments: Arc<dyn CommitmentStore> =
            if delays.entry_lookup.is_zero() && delays.commitment_update.is_zero() {
                store.clone()
            } else {
                Arc::new(SlowCommitments {
                    inner: store.clone(),
                    lookup_delay: delays.entry_lookup,
                    update_delay: delays.commitment_update,
                })
            };

        let engine = ReconciliationEngine::new(
            config,
            Collaborators {
                ledger: reader,
                messages: store.clone(),
                commitments,
                workgroups: store.clone(),
                transport: transport.clone(),
                feedback: feedback.clone(),
                processor: processor.clone(),
            },
        );

        Self {
            engine,
            store,
            ledger,
            transport,
            feedback,
            processor,
            workgroup,
            key,
        }
    }

    pub fn business_object() -> Value {
        json!({"id": "PO-4711", "amount": 1250, "currency": "EUR", "approved": false})
    }

    pub fn seed(&self, entry_type: EntryType) -> Seed {
        self.seed_with(entry_type, |_| {})
    }

    pub fn seed_with(&self, entry_type: EntryType, tweak: impl FnOnce(&mut SeedOptions)) -> Seed {
        let tree = SyncTree::from_business_object(&Self::business_object()).unwrap();
        let proof = tree.root_proof;

        let mut opts = SeedOptions {
            ledger_proof: proof.to_hex(),
            ledger_key: self.key.clone(),
            publish_to_ledger: true,
            sync_tree_json: tree.to_json().unwrap(),
        };
        tweak(&mut opts);

        let sender_org = Uuid::new_v4();
        let receiver_org = Uuid::new_v4();
        let ledger_tx_id = Uuid::new_v4();
        let tx_id = Uuid::new_v4();

        let message = OffchainProcessMessage {
            id: Uuid::new_v4(),
            sender_id: sender_org,
            receiver_id: receiver_org,
            topic: self.workgroup.to_string(),
            workstep_type: "NewVersion".into(),
            referenced_offchain_process_message_id: None,
            baseledger_sync_tree_json: opts.sync_tree_json,
            business_object_proof: proof.to_hex(),
            baseledger_business_object_id: Some(Uuid::new_v4()),
            referenced_baseledger_business_object_id: None,
            status_text_message: String::new(),
            baseledger_transaction_id_of_stored_proof: ledger_tx_id,
            tendermint_transaction_id_of_stored_proof: tx_id,
            business_object_type: "PurchaseOrder".into(),
            baseledger_transaction_type: "Suggest".into(),
            referenced_baseledger_transaction_id: None,
            entry_type: entry_type.as_str().into(),
        };

        if opts.publish_to_ledger {
            let payload = BaseledgerTransactionPayload {
                transaction_type: "Suggest".into(),
                offchain_message_id: message.id,
                baseledger_transaction_id: ledger_tx_id,
                proof: opts.ledger_proof,
                ..BaseledgerTransactionPayload::default()
            };
            self.ledger.insert(
                ledger_tx_id,
                CommittedTransaction {
                    id: "1".into(),
                    creator: "baseledger1creator".into(),
                    baseledger_transaction_id: ledger_tx_id.to_string(),
                    payload: PayloadCipher::privatize_payload(&payload, &opts.ledger_key).unwrap(),
                },
            );
        }

        let mut entry = TrustmeshEntry::new(tx_id, entry_type, message.id);
        entry.sender_org_id = sender_org;
        entry.receiver_org_id = receiver_org;
        entry.workgroup_id = self.workgroup;
        entry.baseledger_transaction_id = ledger_tx_id;
        entry.business_object_type = "PurchaseOrder".into();
        entry.transaction_hash = Digest::of(tx_id.as_bytes()).to_hex();

        self.store.insert_message(message.clone()).unwrap();
        self.store.insert_entry(entry.clone()).unwrap();

        Seed {
            result: TransactionResult::new(entry, TxInfo::committed("42", "2021-05-28T21:42:59Z")),
            message,
            receiver_org,
            proof,
        }
    }

    pub fn state(&self, seed: &Seed) -> Option<CommitmentState> {
        self.store.commitment_state(seed.result.tx_id())
    }
}
