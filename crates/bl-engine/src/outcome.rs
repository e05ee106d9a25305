use bl_types::{CommitmentState, Digest};
use uuid::Uuid;

/// What a reconciliation attempt did to its entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The transaction is not final yet. Nothing changed; the caller decides
    /// whether to redeliver.
    Deferred,
    /// The ledger rejected the transaction; the entry is now `Invalid`.
    Invalidated,
    /// The entry is now `Committed`.
    Committed { action: ReconcileAction },
    /// The entry was already terminal when this attempt loaded it. Nothing
    /// was sent.
    AlreadyApplied { state: CommitmentState },
    /// A concurrent delivery of the same result committed the entry first.
    /// This attempt's `action` still ran; only the state write was skipped.
    Superseded {
        state: CommitmentState,
        action: ReconcileAction,
    },
}

impl ReconcileOutcome {
    /// The commitment state the entry holds after this outcome.
    pub fn resulting_state(&self) -> CommitmentState {
        match self {
            Self::Deferred => CommitmentState::Pending,
            Self::Invalidated => CommitmentState::Invalid,
            Self::Committed { .. } => CommitmentState::Committed,
            Self::AlreadyApplied { state } | Self::Superseded { state, .. } => *state,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deferred => "deferred",
            Self::Invalidated => "invalidated",
            Self::Committed { .. } => "committed",
            Self::AlreadyApplied { .. } => "already-applied",
            Self::Superseded { .. } => "superseded",
        }
    }
}

/// The business side effect that accompanied a commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconcileAction {
    /// The offchain message was delivered to `recipient`.
    Forwarded { recipient: Uuid },
    /// A received suggestion's proof matched and it was handed downstream.
    SuggestionAccepted { root: Digest },
    /// A received suggestion's proof did not match; reject feedback was
    /// submitted to `recipient`.
    ProofRejected { recipient: Uuid, computed: Digest },
    /// Received feedback was handed downstream. `root` is `None` when
    /// verification is disabled.
    FeedbackAccepted { root: Option<Digest> },
    /// Received feedback failed verification and was dropped.
    FeedbackDiscarded { computed: Digest },
}
