use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use bl_crypto::PrivatizeKey;
use bl_types::{
    CommitmentState, OffchainProcessMessage, TrustmeshEntry, Workgroup, WorkgroupMember,
};
use uuid::Uuid;

use crate::directory::workgroup_key;
use crate::error::{StoreError, StoreResult};
use crate::traits::{CommitmentStore, OffchainMessageStore, WorkgroupDirectory};

/// In-memory store implementing every storage collaborator.
///
/// Intended for tests and dry runs. State is held behind a `RwLock`; the
/// conditional commitment update takes the write lock, which makes it the
/// single serialization point for concurrent reconciliations.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
    unavailable: AtomicBool,
    updates: AtomicU64,
}

#[derive(Default)]
struct StoreState {
    entries: HashMap<Uuid, TrustmeshEntry>,
    messages: HashMap<Uuid, OffchainProcessMessage>,
    workgroups: HashMap<Uuid, Workgroup>,
    members: Vec<WorkgroupMember>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_entry(&self, entry: TrustmeshEntry) -> StoreResult<()> {
        self.write()?
            .entries
            .insert(entry.tendermint_transaction_id, entry);
        Ok(())
    }

    pub fn insert_message(&self, message: OffchainProcessMessage) -> StoreResult<()> {
        self.write()?.messages.insert(message.id, message);
        Ok(())
    }

    pub fn insert_workgroup(&self, workgroup: Workgroup) -> StoreResult<()> {
        self.write()?.workgroups.insert(workgroup.id, workgroup);
        Ok(())
    }

    pub fn insert_member(&self, member: WorkgroupMember) -> StoreResult<()> {
        self.write()?.members.push(member);
        Ok(())
    }

    /// Current state of the entry for `tx_id`, if any.
    pub fn commitment_state(&self, tx_id: Uuid) -> Option<CommitmentState> {
        self.state
            .read()
            .ok()?
            .entries
            .get(&tx_id)
            .map(|e| e.commitment_state)
    }

    /// Number of rows changed by conditional updates so far.
    pub fn update_count(&self) -> u64 {
        self.updates.load(Ordering::SeqCst)
    }

    /// Make every operation fail with a backend error, simulating an outage.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("store unavailable".into()));
        }
        Ok(())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, StoreState>> {
        self.check_available()?;
        self.state.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, StoreState>> {
        self.state.write().map_err(|_| StoreError::LockPoisoned)
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("InMemoryStore");
        if let Ok(state) = self.state.read() {
            s.field("entry_count", &state.entries.len())
                .field("message_count", &state.messages.len())
                .field("workgroup_count", &state.workgroups.len());
        }
        s.finish()
    }
}

#[async_trait]
impl OffchainMessageStore for InMemoryStore {
    async fn find_offchain_message(&self, id: Uuid) -> StoreResult<Option<OffchainProcessMessage>> {
        Ok(self.read()?.messages.get(&id).cloned())
    }
}

#[async_trait]
impl CommitmentStore for InMemoryStore {
    async fn update_commitment_state(
        &self,
        tx_id: Uuid,
        state: CommitmentState,
        block_height: &str,
        timestamp: &str,
    ) -> StoreResult<u64> {
        self.check_available()?;
        let mut guard = self.write()?;
        let Some(entry) = guard
            .entries
            .get_mut(&tx_id)
            .filter(|e| e.commitment_state.can_transition_to(state))
        else {
            return Ok(0);
        };

        entry.commitment_state = state;
        entry.tendermint_block_id = Some(block_height.to_string());
        entry.tendermint_transaction_timestamp = Some(timestamp.to_string());
        self.updates.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(%tx_id, %state, "commitment state updated");
        Ok(1)
    }

    async fn find_entry(&self, tx_id: Uuid) -> StoreResult<Option<TrustmeshEntry>> {
        Ok(self.read()?.entries.get(&tx_id).cloned())
    }
}

#[async_trait]
impl WorkgroupDirectory for InMemoryStore {
    async fn resolve_key(&self, workgroup_id: Uuid) -> StoreResult<PrivatizeKey> {
        let state = self.read()?;
        let workgroup = state
            .workgroups
            .get(&workgroup_id)
            .ok_or(StoreError::WorkgroupNotFound(workgroup_id))?;
        workgroup_key(workgroup)
    }

    async fn find_member(
        &self,
        workgroup_id: Uuid,
        organization_id: Uuid,
    ) -> StoreResult<Option<WorkgroupMember>> {
        Ok(self
            .read()?
            .members
            .iter()
            .find(|m| m.workgroup_id == workgroup_id && m.organization_id == organization_id)
            .cloned())
    }
}
