use async_trait::async_trait;
use bl_crypto::PrivatizeKey;
use bl_types::{CommitmentState, OffchainProcessMessage, TrustmeshEntry, WorkgroupMember};
use uuid::Uuid;

use crate::error::StoreResult;

/// Lookup of offchain process messages by id.
#[async_trait]
pub trait OffchainMessageStore: Send + Sync {
    /// Returns `Ok(None)` if the message does not exist.
    async fn find_offchain_message(&self, id: Uuid) -> StoreResult<Option<OffchainProcessMessage>>;
}

/// Persistence of trustmesh entry commitment state.
///
/// Implementations must satisfy these invariants:
/// - `update_commitment_state` is a single conditional write keyed by the
///   tendermint transaction id that only matches entries still `Pending`.
/// - It returns the number of rows changed; callers treat anything but one as
///   a failed transition.
/// - Concurrent updates for the same id are serialized by the store, so at
///   most one of them changes a row.
#[async_trait]
pub trait CommitmentStore: Send + Sync {
    async fn update_commitment_state(
        &self,
        tx_id: Uuid,
        state: CommitmentState,
        block_height: &str,
        timestamp: &str,
    ) -> StoreResult<u64>;

    /// Returns `Ok(None)` if no entry exists for the transaction.
    async fn find_entry(&self, tx_id: Uuid) -> StoreResult<Option<TrustmeshEntry>>;
}

/// Resolution of workgroup keys and member endpoints.
///
/// Keys are resolved per call and never cached by callers.
#[async_trait]
pub trait WorkgroupDirectory: Send + Sync {
    async fn resolve_key(&self, workgroup_id: Uuid) -> StoreResult<PrivatizeKey>;

    async fn find_member(
        &self,
        workgroup_id: Uuid,
        organization_id: Uuid,
    ) -> StoreResult<Option<WorkgroupMember>>;
}
