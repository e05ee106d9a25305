use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TypeError;

/// Which stage of a cross-organization exchange a ledger transaction
/// represents, seen from the local organization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    /// We proposed a business object to a counterparty.
    SuggestionSent,
    /// A counterparty proposed a business object to us.
    SuggestionReceived,
    /// We approved or rejected a counterparty's suggestion.
    FeedbackSent,
    /// A counterparty approved or rejected our suggestion.
    FeedbackReceived,
}

impl EntryType {
    /// All known entry types.
    pub const ALL: [EntryType; 4] = [
        Self::SuggestionSent,
        Self::SuggestionReceived,
        Self::FeedbackSent,
        Self::FeedbackReceived,
    ];

    /// Stable string form, as persisted in trustmesh entries.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuggestionSent => "SuggestionSent",
            Self::SuggestionReceived => "SuggestionReceived",
            Self::FeedbackSent => "FeedbackSent",
            Self::FeedbackReceived => "FeedbackReceived",
        }
    }

    /// Returns `true` for steps that originated at a counterparty and must be
    /// proven against the ledger before they are processed locally.
    pub fn is_received(&self) -> bool {
        matches!(self, Self::SuggestionReceived | Self::FeedbackReceived)
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| TypeError::UnknownEntryType(s.to_string()))
    }
}

/// The local view of whether a ledger transaction has been finalized.
///
/// `Pending` is the only non-terminal state. An entry moves to `Committed` or
/// `Invalid` exactly once and never leaves it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommitmentState {
    #[default]
    Pending,
    Committed,
    Invalid,
}

impl CommitmentState {
    /// Returns `true` for `Committed` and `Invalid`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(&self, next: CommitmentState) -> bool {
        *self == Self::Pending && next.is_terminal()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Committed => "COMMITTED",
            Self::Invalid => "INVALID",
        }
    }
}

impl fmt::Display for CommitmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommitmentState {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "COMMITTED" => Ok(Self::Committed),
            "INVALID" => Ok(Self::Invalid),
            other => Err(TypeError::UnknownCommitmentState(other.to_string())),
        }
    }
}

/// One local step of a cross-organization exchange.
///
/// `entry_type` is kept as the raw persisted string: a row written by a newer
/// or misconfigured peer must still load, and only the reconciliation engine
/// decides what an unrecognized value means.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustmeshEntry {
    pub tendermint_transaction_id: Uuid,
    pub tendermint_block_id: Option<String>,
    pub tendermint_transaction_timestamp: Option<String>,
    pub entry_type: String,
    #[serde(default)]
    pub commitment_state: CommitmentState,
    pub sender_org_id: Uuid,
    pub receiver_org_id: Uuid,
    pub workgroup_id: Uuid,
    #[serde(default)]
    pub workstep_type: String,
    #[serde(default)]
    pub baseledger_transaction_type: String,
    pub baseledger_transaction_id: Uuid,
    pub referenced_baseledger_transaction_id: Option<Uuid>,
    #[serde(default)]
    pub business_object_type: String,
    pub baseledger_business_object_id: Option<Uuid>,
    pub referenced_baseledger_business_object_id: Option<Uuid>,
    pub offchain_process_message_id: Uuid,
    pub referenced_process_message_id: Option<Uuid>,
    #[serde(default)]
    pub transaction_hash: String,
}

impl TrustmeshEntry {
    /// A pending entry with nil organization linkage, to be filled in by the
    /// caller.
    pub fn new(
        tendermint_transaction_id: Uuid,
        entry_type: EntryType,
        offchain_process_message_id: Uuid,
    ) -> Self {
        Self {
            tendermint_transaction_id,
            tendermint_block_id: None,
            tendermint_transaction_timestamp: None,
            entry_type: entry_type.as_str().to_string(),
            commitment_state: CommitmentState::Pending,
            sender_org_id: Uuid::nil(),
            receiver_org_id: Uuid::nil(),
            workgroup_id: Uuid::nil(),
            workstep_type: String::new(),
            baseledger_transaction_type: String::new(),
            baseledger_transaction_id: tendermint_transaction_id,
            referenced_baseledger_transaction_id: None,
            business_object_type: String::new(),
            baseledger_business_object_id: None,
            referenced_baseledger_business_object_id: None,
            offchain_process_message_id,
            referenced_process_message_id: None,
            transaction_hash: String::new(),
        }
    }

    /// Parse the persisted entry type.
    pub fn parsed_entry_type(&self) -> Result<EntryType, TypeError> {
        self.entry_type.parse()
    }
}
