//! Reconciliation of a JSON fixture, either fully offline or against live
//! ledger and messaging endpoints.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use bl_engine::{
    BusinessObjectProcessor, Collaborators, EngineConfig, LoggingProcessor, ProcessedObject,
    ReconciliationEngine, ReconciliationWorker, RecordingProcessor, WorkerReport,
};
use bl_ledger::{HttpLedgerReader, InMemoryLedger, LedgerConfig, LedgerReader};
use bl_messaging::{
    FeedbackSubmitter, HttpFeedbackSubmitter, HttpTransport, MessagingConfig, OffchainEnvelope,
    OffchainTransport, RecordingFeedbackSubmitter, RecordingTransport,
};
use bl_store::{DirectoryConfig, InMemoryStore, StaticWorkgroupDirectory};
use bl_types::{
    CommitmentState, CommittedTransaction, OffchainProcessMessage, SynchronizationFeedback,
    TransactionResult, TrustmeshEntry, Workgroup, WorkgroupMember,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Local state plus the results to reconcile. Ledger transactions are keyed
/// by their `baseledgerTransactionId` and only used by dry runs.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Fixture {
    pub workgroups: Vec<Workgroup>,
    pub members: Vec<WorkgroupMember>,
    pub entries: Vec<TrustmeshEntry>,
    pub messages: Vec<OffchainProcessMessage>,
    pub transactions: Vec<CommittedTransaction>,
    pub results: Vec<TransactionResult>,
}

/// Where a fixture run sends its side effects.
#[derive(Clone, Copy, Debug)]
pub enum Wiring<'a> {
    /// In-memory ledger and recording collaborators. Nothing leaves the
    /// process.
    DryRun,
    /// The chain node's REST API, member endpoints from the workgroup
    /// directory, the proxy's feedback endpoint and a logging processor.
    Live {
        ledger: &'a LedgerConfig,
        messaging: &'a MessagingConfig,
    },
}

/// What a fixture run did. The side-effect lists are only filled by dry
/// runs; live side effects are in the log.
#[derive(Debug, Serialize)]
pub struct FixtureRun {
    pub live: bool,
    pub report: WorkerReport,
    pub states: Vec<(Uuid, CommitmentState)>,
    pub forwarded: Vec<OffchainEnvelope>,
    pub feedback: Vec<SynchronizationFeedback>,
    pub processed: Vec<ProcessedObject>,
}

struct Recorders {
    transport: Arc<RecordingTransport>,
    feedback: Arc<RecordingFeedbackSubmitter>,
    processor: Arc<RecordingProcessor>,
}

impl Fixture {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read fixture {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse fixture {}", path.display()))
    }

    /// Reconcile every result in the fixture through the worker. Local
    /// entries and messages always live in memory; `wiring` picks the
    /// ledger and messaging collaborators. Workgroups and members from
    /// `directory` are available alongside the fixture's own.
    pub async fn run(
        self,
        config: EngineConfig,
        directory: &DirectoryConfig,
        wiring: Wiring<'_>,
    ) -> anyhow::Result<FixtureRun> {
        let directory = DirectoryConfig {
            workgroups: directory
                .workgroups
                .iter()
                .cloned()
                .chain(self.workgroups)
                .collect(),
            members: directory.members.iter().cloned().chain(self.members).collect(),
        };

        let store = Arc::new(InMemoryStore::new());
        for workgroup in &directory.workgroups {
            store.insert_workgroup(workgroup.clone())?;
        }
        for member in &directory.members {
            store.insert_member(member.clone())?;
        }
        let tx_ids: Vec<Uuid> = self
            .entries
            .iter()
            .map(|e| e.tendermint_transaction_id)
            .collect();
        for entry in self.entries {
            store.insert_entry(entry)?;
        }
        for message in self.messages {
            store.insert_message(message)?;
        }

        let (collaborators, recorders) = match wiring {
            Wiring::DryRun => {
                let ledger = Arc::new(InMemoryLedger::new());
                for tx in self.transactions {
                    let id = Uuid::parse_str(&tx.baseledger_transaction_id).with_context(|| {
                        format!("transaction id {} is not a uuid", tx.baseledger_transaction_id)
                    })?;
                    ledger.insert(id, tx);
                }
                let recorders = Recorders {
                    transport: Arc::new(RecordingTransport::new()),
                    feedback: Arc::new(RecordingFeedbackSubmitter::new()),
                    processor: Arc::new(RecordingProcessor::new()),
                };
                let collaborators = Collaborators {
                    ledger,
                    messages: store.clone(),
                    commitments: store.clone(),
                    workgroups: store.clone(),
                    transport: recorders.transport.clone(),
                    feedback: recorders.feedback.clone(),
                    processor: recorders.processor.clone(),
                };
                (collaborators, Some(recorders))
            }
            Wiring::Live { ledger, messaging } => {
                if !self.transactions.is_empty() {
                    tracing::warn!(
                        count = self.transactions.len(),
                        "live run reads the ledger, ignoring fixture transactions"
                    );
                }
                let reader: Arc<dyn LedgerReader> = Arc::new(HttpLedgerReader::new(ledger)?);
                let workgroups = Arc::new(StaticWorkgroupDirectory::new(directory));
                let transport: Arc<dyn OffchainTransport> =
                    Arc::new(HttpTransport::new(messaging, workgroups.clone())?);
                let feedback: Arc<dyn FeedbackSubmitter> =
                    Arc::new(HttpFeedbackSubmitter::new(messaging)?);
                let processor: Arc<dyn BusinessObjectProcessor> = Arc::new(LoggingProcessor);
                let collaborators = Collaborators {
                    ledger: reader,
                    messages: store.clone(),
                    commitments: store.clone(),
                    workgroups,
                    transport,
                    feedback,
                    processor,
                };
                (collaborators, None)
            }
        };
        let live = recorders.is_none();
        let engine = ReconciliationEngine::new(config, collaborators);

        tracing::info!(
            live,
            entries = tx_ids.len(),
            results = self.results.len(),
            "starting fixture run"
        );
        let (tx, rx) = mpsc::channel(self.results.len().max(1));
        for result in self.results {
            tx.send(result).await?;
        }
        drop(tx);

        let report = ReconciliationWorker::new(Arc::new(engine)).run(rx).await?;

        let states = tx_ids
            .into_iter()
            .filter_map(|id| store.commitment_state(id).map(|s| (id, s)))
            .collect();
        let (forwarded, feedback, processed) = match recorders {
            Some(r) => (r.transport.sent(), r.feedback.submitted(), r.processor.processed()),
            None => Default::default(),
        };

        Ok(FixtureRun {
            live,
            report,
            states,
            forwarded,
            feedback,
            processed,
        })
    }
}
