use async_trait::async_trait;
use bl_types::CommittedTransaction;
use uuid::Uuid;

use crate::error::LedgerResult;

/// Read boundary for committed ledger transactions.
///
/// Any error is a fetch miss from the caller's point of view: the current
/// reconciliation step is aborted and may be retried later.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    async fn fetch_committed_transaction(&self, id: Uuid) -> LedgerResult<CommittedTransaction>;
}
