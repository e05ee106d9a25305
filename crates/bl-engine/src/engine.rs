use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bl_crypto::{PayloadCipher, PrivatizeKey, ProofVerification, ProofVerifier, SyncTree};
use bl_ledger::LedgerReader;
use bl_messaging::{FeedbackSubmitter, OffchainTransport};
use bl_store::{CommitmentStore, OffchainMessageStore, WorkgroupDirectory};
use bl_types::{
    BaseledgerTransactionPayload, CommitmentState, CommittedTransaction, EntryType,
    OffchainProcessMessage, SynchronizationFeedback, TransactionResult, TrustmeshEntry,
};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult, FailureCategory};
use crate::outcome::{ReconcileAction, ReconcileOutcome};
use crate::processor::BusinessObjectProcessor;
use crate::state_machine::{EntryStateMachine, Transition};

/// Everything the engine talks to. Passed in explicitly; the engine holds no
/// other state.
#[derive(Clone)]
pub struct Collaborators {
    pub ledger: Arc<dyn LedgerReader>,
    pub messages: Arc<dyn OffchainMessageStore>,
    pub commitments: Arc<dyn CommitmentStore>,
    pub workgroups: Arc<dyn WorkgroupDirectory>,
    pub transport: Arc<dyn OffchainTransport>,
    pub feedback: Arc<dyn FeedbackSubmitter>,
    pub processor: Arc<dyn BusinessObjectProcessor>,
}

/// Applies ledger commit results to local trustmesh entries.
///
/// Each call to [`Self::reconcile`] is independent, so results may be
/// reconciled concurrently; the store's conditional update is the only
/// serialization point. The state transition happens once, but side effects
/// are at-least-once: overlapping deliveries that all pass the precheck each
/// run their step, and the losers report [`ReconcileOutcome::Superseded`].
/// An aborted attempt leaves the entry `Pending` and the engine never
/// schedules retries itself.
pub struct ReconciliationEngine {
    config: EngineConfig,
    collaborators: Collaborators,
}

impl ReconciliationEngine {
    pub fn new(config: EngineConfig, collaborators: Collaborators) -> Self {
        Self {
            config,
            collaborators,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Reconcile one transaction result.
    ///
    /// Order of checks: finality, ledger validity, entry type, then the
    /// stored entry (already terminal means duplicate delivery), then the
    /// correlated offchain message, then the per-type step. The entry is
    /// persisted last, so every failure before that leaves it `Pending`.
    #[tracing::instrument(
        name = "reconcile",
        skip_all,
        fields(tx_id = %result.tx_id(), entry_type = %result.entry().entry_type)
    )]
    pub async fn reconcile(&self, result: &TransactionResult) -> EngineResult<ReconcileOutcome> {
        let started = Instant::now();
        let outcome = self.run(result).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &outcome {
            Ok(o) => tracing::info!(outcome = o.as_str(), elapsed_ms, "reconciliation finished"),
            Err(e) if e.category() == FailureCategory::Transient => {
                tracing::warn!(category = %e.category(), error = %e, elapsed_ms, "reconciliation aborted")
            }
            Err(e) => {
                tracing::error!(category = %e.category(), error = %e, elapsed_ms, "reconciliation aborted")
            }
        }
        outcome
    }

    async fn run(&self, result: &TransactionResult) -> EngineResult<ReconcileOutcome> {
        let tx_id = result.tx_id();
        let entry = result.entry();

        let entry_type = match EntryStateMachine::classify(result)? {
            Transition::Defer => {
                tracing::info!(tx_hash = %entry.transaction_hash, "transaction not yet committed");
                return Ok(ReconcileOutcome::Deferred);
            }
            Transition::Invalidate => {
                tracing::warn!(
                    code = result.tx_info.tx_code,
                    log = %result.tx_info.tx_log,
                    "transaction rejected by the ledger"
                );
                return self
                    .persist(result, CommitmentState::Invalid, ReconcileOutcome::Invalidated)
                    .await;
            }
            Transition::Process(entry_type) => entry_type,
        };

        match self.current_state(tx_id).await? {
            None => return Err(EngineError::UnknownTransaction(tx_id)),
            Some(state) if state.is_terminal() => {
                tracing::info!(%state, "duplicate delivery, entry already final");
                return Ok(ReconcileOutcome::AlreadyApplied { state });
            }
            Some(_) => {}
        }

        let message = self.find_message(entry.offchain_process_message_id).await?;

        let action = match (entry_type, EntryStateMachine::forward_recipient(entry_type, entry)) {
            (_, Some(recipient)) => self.forward(entry, &message, recipient).await?,
            (EntryType::SuggestionReceived, None) => {
                self.receive_suggestion(entry, &message).await?
            }
            (_, None) => self.receive_feedback(entry, &message).await?,
        };

        self.persist(
            result,
            CommitmentState::Committed,
            ReconcileOutcome::Committed { action },
        )
        .await
    }

    async fn forward(
        &self,
        entry: &TrustmeshEntry,
        message: &OffchainProcessMessage,
        recipient: Uuid,
    ) -> EngineResult<ReconcileAction> {
        self.collaborators
            .transport
            .send(message, recipient, &entry.transaction_hash)
            .await?;
        Ok(ReconcileAction::Forwarded { recipient })
    }

    async fn receive_suggestion(
        &self,
        entry: &TrustmeshEntry,
        message: &OffchainProcessMessage,
    ) -> EngineResult<ReconcileAction> {
        let committed = self.fetch_committed(message).await?;
        let payload = self.open_payload(entry, &committed).await?;
        let tree = SyncTree::from_json(&message.baseledger_sync_tree_json)?;

        match ProofVerifier::verify_tree(&payload.proof, &message.business_object_proof, &tree)? {
            ProofVerification::Match { root } => {
                self.collaborators
                    .processor
                    .process_suggestion(message, entry.workgroup_id, &tree.business_object_json())
                    .await?;
                Ok(ReconcileAction::SuggestionAccepted { root })
            }
            ProofVerification::Mismatch { computed, .. } => {
                tracing::warn!(
                    recipient = %message.sender_id,
                    "suggestion rejected, sending feedback"
                );
                let feedback = SynchronizationFeedback::reject(message, entry.workgroup_id);
                self.collaborators.feedback.submit_feedback(&feedback).await?;
                Ok(ReconcileAction::ProofRejected {
                    recipient: feedback.recipient,
                    computed,
                })
            }
        }
    }

    async fn receive_feedback(
        &self,
        entry: &TrustmeshEntry,
        message: &OffchainProcessMessage,
    ) -> EngineResult<ReconcileAction> {
        let committed = self.fetch_committed(message).await?;
        let tree = SyncTree::from_json(&message.baseledger_sync_tree_json)?;

        let root = if self.config.verify_feedback_proofs {
            let payload = self.open_payload(entry, &committed).await?;
            match ProofVerifier::verify_tree(&payload.proof, &message.business_object_proof, &tree)?
            {
                ProofVerification::Match { root } => Some(root),
                ProofVerification::Mismatch { computed, .. } => {
                    tracing::warn!(message_id = %message.id, "discarding unproven feedback");
                    return Ok(ReconcileAction::FeedbackDiscarded { computed });
                }
            }
        } else {
            tracing::debug!(creator = %committed.creator, "feedback proof verification disabled");
            None
        };

        self.collaborators
            .processor
            .process_feedback(message, entry.workgroup_id, &tree.business_object_json())
            .await?;
        Ok(ReconcileAction::FeedbackAccepted { root })
    }

    async fn fetch_committed(
        &self,
        message: &OffchainProcessMessage,
    ) -> EngineResult<CommittedTransaction> {
        let tx_id = message.baseledger_transaction_id_of_stored_proof;
        let ledger = &self.collaborators.ledger;
        bounded(self.config.fetch_timeout(), "ledger fetch", async {
            ledger
                .fetch_committed_transaction(tx_id)
                .await
                .map_err(|source| EngineError::LedgerFetch { tx_id, source })
        })
        .await
    }

    async fn resolve_key(&self, workgroup_id: Uuid) -> EngineResult<PrivatizeKey> {
        let workgroups = &self.collaborators.workgroups;
        bounded(self.config.store_timeout(), "key resolution", async {
            workgroups
                .resolve_key(workgroup_id)
                .await
                .map_err(|source| EngineError::KeyResolution {
                    workgroup_id,
                    source,
                })
        })
        .await
    }

    async fn open_payload(
        &self,
        entry: &TrustmeshEntry,
        committed: &CommittedTransaction,
    ) -> EngineResult<BaseledgerTransactionPayload> {
        let key = self.resolve_key(entry.workgroup_id).await?;
        Ok(PayloadCipher::deprivatize_payload(&committed.payload, &key)?)
    }

    async fn find_message(&self, id: Uuid) -> EngineResult<OffchainProcessMessage> {
        let messages = &self.collaborators.messages;
        bounded(self.config.store_timeout(), "message lookup", async {
            messages.find_offchain_message(id).await.map_err(EngineError::from)
        })
        .await?
        .ok_or(EngineError::MessageNotFound(id))
    }

    async fn current_state(&self, tx_id: Uuid) -> EngineResult<Option<CommitmentState>> {
        let commitments = &self.collaborators.commitments;
        let entry = bounded(self.config.store_timeout(), "entry lookup", async {
            commitments.find_entry(tx_id).await.map_err(EngineError::from)
        })
        .await?;
        Ok(entry.map(|e| e.commitment_state))
    }

    async fn persist(
        &self,
        result: &TransactionResult,
        state: CommitmentState,
        outcome: ReconcileOutcome,
    ) -> EngineResult<ReconcileOutcome> {
        let tx_id = result.tx_id();
        let info = &result.tx_info;
        let commitments = &self.collaborators.commitments;
        let rows = bounded(self.config.store_timeout(), "commitment update", async {
            commitments
                .update_commitment_state(tx_id, state, &info.tx_height, &info.tx_timestamp)
                .await
                .map_err(EngineError::from)
        })
        .await?;

        match rows {
            1 => {
                tracing::info!(%state, height = %info.tx_height, "commitment state persisted");
                Ok(outcome)
            }
            0 => {
                let current = self.current_state(tx_id).await?;
                let resolved = EntryStateMachine::resolve_unapplied(tx_id, current)?;
                match (resolved, outcome) {
                    (
                        ReconcileOutcome::AlreadyApplied { state },
                        ReconcileOutcome::Committed { action },
                    ) => {
                        tracing::warn!(%state, ?action, "concurrent delivery committed first");
                        Ok(ReconcileOutcome::Superseded { state, action })
                    }
                    (resolved, _) => {
                        tracing::info!(
                            state = %resolved.resulting_state(),
                            "duplicate delivery, entry already final"
                        );
                        Ok(resolved)
                    }
                }
            }
            rows => Err(EngineError::UnexpectedRowCount { tx_id, rows }),
        }
    }
}

async fn bounded<T>(
    after: Duration,
    operation: &'static str,
    fut: impl Future<Output = EngineResult<T>>,
) -> EngineResult<T> {
    tokio::time::timeout(after, fut)
        .await
        .map_err(|_| EngineError::Timeout { operation, after })?
}
