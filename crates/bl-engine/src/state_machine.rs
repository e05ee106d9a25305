use bl_types::{CommitmentState, EntryType, TransactionResult, TrustmeshEntry};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::outcome::ReconcileOutcome;

/// What to do with a transaction result, before any I/O.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Not final: no state change.
    Defer,
    /// Rejected by the ledger: mark `Invalid`, no business processing.
    Invalidate,
    /// Valid and final: run the step for this entry type, then commit.
    Process(EntryType),
}

/// Pure transition rules for trustmesh entries.
///
/// `Pending` is the only non-terminal state. Finality is checked first, then
/// ledger validity, then the entry type, so an invalid transaction is
/// invalidated even when its entry type is unknown.
pub struct EntryStateMachine;

impl EntryStateMachine {
    pub fn classify(result: &TransactionResult) -> EngineResult<Transition> {
        if !result.tx_info.is_final() {
            return Ok(Transition::Defer);
        }
        if !result.tx_info.tx_valid {
            return Ok(Transition::Invalidate);
        }
        let entry = result.entry();
        entry
            .parsed_entry_type()
            .map(Transition::Process)
            .map_err(|_| EngineError::UnknownEntryType(entry.entry_type.clone()))
    }

    /// Organization an outgoing step is forwarded to. Feedback goes back to
    /// the organization that made the original suggestion, which is the
    /// receiver of the feedback entry.
    pub fn forward_recipient(entry_type: EntryType, entry: &TrustmeshEntry) -> Option<Uuid> {
        (!entry_type.is_received()).then_some(entry.receiver_org_id)
    }

    /// Interpret a conditional update that changed no rows, given the
    /// entry's state as re-read from the store.
    pub fn resolve_unapplied(
        tx_id: Uuid,
        current: Option<CommitmentState>,
    ) -> EngineResult<ReconcileOutcome> {
        match current {
            Some(state) if state.is_terminal() => Ok(ReconcileOutcome::AlreadyApplied { state }),
            Some(_) => Err(EngineError::UpdateConflict(tx_id)),
            None => Err(EngineError::UnknownTransaction(tx_id)),
        }
    }
}
