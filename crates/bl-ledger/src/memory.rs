use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use bl_types::CommittedTransaction;
use uuid::Uuid;

use crate::error::{LedgerError, LedgerResult};
use crate::reader::LedgerReader;

/// In-memory ledger for tests, dry runs and embedding.
#[derive(Default)]
pub struct InMemoryLedger {
    transactions: RwLock<HashMap<Uuid, CommittedTransaction>>,
    fetches: AtomicUsize,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a committed transaction under `id`.
    pub fn insert(&self, id: Uuid, tx: CommittedTransaction) {
        self.transactions
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, tx);
    }

    pub fn len(&self) -> usize {
        self.transactions
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of fetches served so far, hits and misses alike.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerReader for InMemoryLedger {
    async fn fetch_committed_transaction(&self, id: Uuid) -> LedgerResult<CommittedTransaction> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.transactions
            .read()
            .map_err(|e| LedgerError::Transport(format!("lock poisoned: {e}")))?
            .get(&id)
            .cloned()
            .ok_or(LedgerError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(id: Uuid) -> CommittedTransaction {
        CommittedTransaction {
            id: "1".into(),
            creator: "baseledger1abc".into(),
            baseledger_transaction_id: id.to_string(),
            payload: "cafe".into(),
        }
    }

    #[tokio::test]
    async fn insert_and_fetch() {
        let ledger = InMemoryLedger::new();
        let id = Uuid::new_v4();
        ledger.insert(id, tx(id));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.fetch_committed_transaction(id).await.unwrap(), tx(id));
        assert_eq!(ledger.fetch_count(), 1);
    }

    #[tokio::test]
    async fn missing_is_not_found_and_counted() {
        let ledger = InMemoryLedger::new();
        assert!(ledger.is_empty());
        let id = Uuid::new_v4();
        assert_eq!(
            ledger.fetch_committed_transaction(id).await,
            Err(LedgerError::NotFound(id))
        );
        assert_eq!(ledger.fetch_count(), 1);
    }

    #[tokio::test]
    async fn usable_as_trait_object() {
        let ledger: std::sync::Arc<dyn LedgerReader> = std::sync::Arc::new(InMemoryLedger::new());
        assert!(ledger.fetch_committed_transaction(Uuid::nil()).await.is_err());
    }
}
