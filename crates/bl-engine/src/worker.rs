use std::sync::Arc;

use bl_types::TransactionResult;
use serde::Serialize;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinError, JoinSet};

use crate::engine::ReconciliationEngine;
use crate::error::{EngineError, EngineResult, FailureCategory};
use crate::outcome::ReconcileOutcome;

type Settled = (TransactionResult, EngineResult<ReconcileOutcome>);

/// Tally of one worker run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WorkerReport {
    pub processed: usize,
    pub committed: usize,
    pub invalidated: usize,
    pub deferred: usize,
    pub already_applied: usize,
    pub superseded: usize,
    pub transient_failures: usize,
    pub integrity_failures: usize,
    pub panicked: usize,
    pub requeued: usize,
}

impl WorkerReport {
    pub fn failures(&self) -> usize {
        self.transient_failures + self.integrity_failures + self.panicked
    }
}

/// Drains transaction results from a channel and reconciles them
/// concurrently, bounded by `EngineConfig::max_concurrency`.
pub struct ReconciliationWorker {
    engine: Arc<ReconciliationEngine>,
    requeue: Option<mpsc::Sender<TransactionResult>>,
}

impl ReconciliationWorker {
    pub fn new(engine: Arc<ReconciliationEngine>) -> Self {
        Self {
            engine,
            requeue: None,
        }
    }

    /// Hand deferred results and transient failures back on `requeue`.
    ///
    /// Without a requeue channel nothing is retried. With one, a missing
    /// offchain message counts as transient and is handed back too, on the
    /// assumption that it may still arrive; the caller owns the channel and
    /// decides how often to redeliver.
    pub fn with_requeue(mut self, requeue: mpsc::Sender<TransactionResult>) -> Self {
        self.requeue = Some(requeue);
        self
    }

    /// Run until `results` is closed and every in-flight reconciliation has
    /// settled.
    ///
    /// A fatal error stops intake; work already in flight still finishes
    /// before the error is returned.
    pub async fn run(
        self,
        mut results: mpsc::Receiver<TransactionResult>,
    ) -> EngineResult<WorkerReport> {
        let limit = self.engine.config().max_concurrency.max(1);
        let permits = Arc::new(Semaphore::new(limit));
        let mut tasks: JoinSet<Settled> = JoinSet::new();
        let mut report = WorkerReport::default();
        let mut fatal: Option<EngineError> = None;

        tracing::info!(max_concurrency = limit, "reconciliation worker started");

        while fatal.is_none() {
            tokio::select! {
                biased;
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    self.settle(joined, &mut report, &mut fatal).await;
                }
                received = results.recv() => {
                    let Some(result) = received else { break };
                    let Ok(permit) = permits.clone().acquire_owned().await else { break };
                    let engine = self.engine.clone();
                    tasks.spawn(async move {
                        let _permit = permit;
                        let outcome = engine.reconcile(&result).await;
                        (result, outcome)
                    });
                }
            }
        }

        if fatal.is_some() {
            results.close();
            tracing::error!(in_flight = tasks.len(), "fatal error, stopping intake");
        }
        while let Some(joined) = tasks.join_next().await {
            self.settle(joined, &mut report, &mut fatal).await;
        }

        tracing::info!(
            processed = report.processed,
            committed = report.committed,
            failures = report.failures(),
            "reconciliation worker stopped"
        );
        match fatal {
            Some(err) => Err(err),
            None => Ok(report),
        }
    }

    async fn settle(
        &self,
        joined: Result<Settled, JoinError>,
        report: &mut WorkerReport,
        fatal: &mut Option<EngineError>,
    ) {
        let (result, outcome) = match joined {
            Ok(settled) => settled,
            Err(e) => {
                tracing::error!(error = %e, "reconciliation task panicked");
                report.panicked += 1;
                return;
            }
        };
        report.processed += 1;

        match outcome {
            Ok(ReconcileOutcome::Committed { .. }) => report.committed += 1,
            Ok(ReconcileOutcome::Invalidated) => report.invalidated += 1,
            Ok(ReconcileOutcome::AlreadyApplied { .. }) => report.already_applied += 1,
            Ok(ReconcileOutcome::Superseded { .. }) => report.superseded += 1,
            Ok(ReconcileOutcome::Deferred) => {
                report.deferred += 1;
                self.requeue(result, report).await;
            }
            Err(e) => match e.category() {
                FailureCategory::Transient => {
                    report.transient_failures += 1;
                    self.requeue(result, report).await;
                }
                FailureCategory::Integrity => report.integrity_failures += 1,
                FailureCategory::Fatal => {
                    if fatal.is_none() {
                        *fatal = Some(e);
                    }
                }
            },
        }
    }

    async fn requeue(&self, result: TransactionResult, report: &mut WorkerReport) {
        let Some(requeue) = &self.requeue else { return };
        let tx_id = result.tx_id();
        match requeue.send(result).await {
            Ok(()) => report.requeued += 1,
            Err(_) => tracing::warn!(%tx_id, "re-queue channel closed, dropping result"),
        }
    }
}
