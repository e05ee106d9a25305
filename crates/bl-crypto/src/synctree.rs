//! Sync trees: binary hash trees over the fields of a business object.
//!
//! Each top-level field of a JSON business object becomes one leaf, ordered by
//! key. Internal nodes hash child pairs up to a root, and the root digest is
//! the business object proof recorded on the ledger. A leaf can be *covered*:
//! its value is withheld while its digest stays, so the proof still checks.

use bl_types::Digest;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::hasher::ContentHasher;

/// One node of a [`SyncTree`]. Leaves live at level 0 and carry the field
/// key and (unless covered) its value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncTreeNode {
    pub level: u32,
    pub index: u32,
    pub hash: Digest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Value>,
    #[serde(default)]
    pub covered: bool,
}

impl SyncTreeNode {
    fn is_leaf(&self) -> bool {
        self.level == 0
    }
}

/// Serialized proof structure exchanged alongside offchain messages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncTree {
    pub root_proof: Digest,
    pub nodes: Vec<SyncTreeNode>,
}

impl SyncTree {
    /// Build a tree from a JSON object. Non-object values and empty objects
    /// have no proof.
    pub fn from_business_object(object: &Value) -> SyncTreeResult<Self> {
        let fields = object.as_object().ok_or(SyncTreeError::NotAnObject)?;
        if fields.is_empty() {
            return Err(SyncTreeError::Empty);
        }

        let mut fields: Vec<(&String, &Value)> = fields.iter().collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));

        let leaves: Vec<Digest> = fields.iter().map(|(k, v)| leaf_digest(k, v)).collect();
        let levels = build_levels(leaves);

        let mut nodes = Vec::new();
        for (level, digests) in levels.iter().enumerate() {
            for (index, hash) in digests.iter().enumerate() {
                let (key, value) = if level == 0 {
                    let (k, v) = fields[index];
                    (Some(k.clone()), Some(v.clone()))
                } else {
                    (None, None)
                };
                nodes.push(SyncTreeNode {
                    level: level as u32,
                    index: index as u32,
                    hash: *hash,
                    key,
                    value,
                    covered: false,
                });
            }
        }

        Ok(Self {
            root_proof: root_of(&levels),
            nodes,
        })
    }

    /// Parse a serialized tree. The leaf level must be structurally sound:
    /// contiguous indices, strictly ascending keys, content on every
    /// uncovered leaf.
    pub fn from_json(json: &str) -> SyncTreeResult<Self> {
        let tree: Self =
            serde_json::from_str(json).map_err(|e| SyncTreeError::Parse(e.to_string()))?;
        tree.rebuild()?;
        Ok(tree)
    }

    pub fn to_json(&self) -> SyncTreeResult<String> {
        serde_json::to_string(self).map_err(|e| SyncTreeError::Serialization(e.to_string()))
    }

    /// Withhold the value of the leaf for `key`. Returns `false` if there is
    /// no such uncovered leaf. The root is unchanged.
    pub fn cover(&mut self, key: &str) -> bool {
        match self
            .nodes
            .iter_mut()
            .find(|n| n.is_leaf() && !n.covered && n.key.as_deref() == Some(key))
        {
            Some(node) => {
                node.value = None;
                node.covered = true;
                true
            }
            None => false,
        }
    }

    /// Recompute the root from leaf content, ignoring stored digests of
    /// uncovered leaves and of internal nodes.
    pub fn recompute_root(&self) -> SyncTreeResult<Digest> {
        Ok(root_of(&self.rebuild()?))
    }

    /// Whether every stored digest, including `rootProof`, agrees with the
    /// tree recomputed from content.
    pub fn is_consistent(&self) -> SyncTreeResult<bool> {
        let levels = self.rebuild()?;
        let total: usize = levels.iter().map(Vec::len).sum();
        if self.nodes.len() != total || self.root_proof != root_of(&levels) {
            return Ok(false);
        }
        Ok(self.nodes.iter().all(|node| {
            levels
                .get(node.level as usize)
                .and_then(|level| level.get(node.index as usize))
                == Some(&node.hash)
        }))
    }

    /// The JSON object made of all uncovered leaves, in key order.
    pub fn business_object_json(&self) -> Value {
        let mut leaves: Vec<&SyncTreeNode> = self
            .nodes
            .iter()
            .filter(|n| n.is_leaf() && !n.covered)
            .collect();
        leaves.sort_by_key(|n| n.index);

        let mut object = Map::new();
        for leaf in leaves {
            if let (Some(key), Some(value)) = (&leaf.key, &leaf.value) {
                object.insert(key.clone(), value.clone());
            }
        }
        Value::Object(object)
    }

    fn rebuild(&self) -> SyncTreeResult<Vec<Vec<Digest>>> {
        let mut leaves: Vec<&SyncTreeNode> = self.nodes.iter().filter(|n| n.is_leaf()).collect();
        if leaves.is_empty() {
            return Err(SyncTreeError::Empty);
        }
        leaves.sort_by_key(|n| n.index);

        let mut digests = Vec::with_capacity(leaves.len());
        let mut previous_key: Option<&str> = None;
        for (position, leaf) in leaves.iter().enumerate() {
            if leaf.index as usize != position {
                return Err(SyncTreeError::Malformed(format!(
                    "leaf index {} out of sequence at position {position}",
                    leaf.index
                )));
            }
            if let Some(key) = leaf.key.as_deref() {
                if previous_key.is_some_and(|prev| prev >= key) {
                    return Err(SyncTreeError::Malformed(format!(
                        "leaf keys are not strictly ascending at `{key}`"
                    )));
                }
                previous_key = Some(key);
            }

            let digest = if leaf.covered {
                if leaf.value.is_some() {
                    return Err(SyncTreeError::Malformed(format!(
                        "covered leaf {} carries a value",
                        leaf.index
                    )));
                }
                leaf.hash
            } else {
                match (&leaf.key, &leaf.value) {
                    (Some(key), Some(value)) => leaf_digest(key, value),
                    _ => {
                        return Err(SyncTreeError::Malformed(format!(
                            "uncovered leaf {} is missing its key or value",
                            leaf.index
                        )))
                    }
                }
            };
            digests.push(digest);
        }

        Ok(build_levels(digests))
    }
}

/// Proof a sender records for `object`: the root of its sync tree.
pub fn business_object_proof(object: &Value) -> SyncTreeResult<Digest> {
    Ok(SyncTree::from_business_object(object)?.root_proof)
}

/// Outcome of checking a claimed proof against a sync tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProofVerification {
    Match {
        root: Digest,
    },
    /// The proofs disagree. A business rejection, not an infrastructure
    /// failure.
    Mismatch {
        claimed: String,
        expected: String,
        computed: Digest,
    },
}

impl ProofVerification {
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Match { .. })
    }
}

/// Checks business object proofs against serialized sync trees.
pub struct ProofVerifier;

impl ProofVerifier {
    /// Matches only when `claimed == expected == recomputed root == rootProof`
    /// and every stored digest is consistent with the tree's content.
    pub fn verify_hash_match(
        claimed: &str,
        expected: &str,
        sync_tree_json: &str,
    ) -> SyncTreeResult<ProofVerification> {
        let tree = SyncTree::from_json(sync_tree_json)?;
        Self::verify_tree(claimed, expected, &tree)
    }

    pub fn verify_tree(
        claimed: &str,
        expected: &str,
        tree: &SyncTree,
    ) -> SyncTreeResult<ProofVerification> {
        let computed = tree.recompute_root()?;
        let consistent = tree.is_consistent()?;
        let claimed_digest = Digest::from_hex(claimed).ok();
        let expected_digest = Digest::from_hex(expected).ok();

        if consistent && claimed_digest == Some(computed) && expected_digest == Some(computed) {
            tracing::debug!(root = %computed.short_hex(), "business object proof verified");
            Ok(ProofVerification::Match { root: computed })
        } else {
            tracing::warn!(
                claimed,
                expected,
                computed = %computed,
                consistent,
                "business object proof mismatch"
            );
            Ok(ProofVerification::Mismatch {
                claimed: claimed.to_string(),
                expected: expected.to_string(),
                computed,
            })
        }
    }
}

/// Errors from building or parsing sync trees.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SyncTreeError {
    #[error("invalid sync tree json: {0}")]
    Parse(String),

    #[error("business object must be a JSON object")]
    NotAnObject,

    #[error("sync tree has no leaves")]
    Empty,

    #[error("malformed sync tree: {0}")]
    Malformed(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result alias for sync tree operations.
pub type SyncTreeResult<T> = Result<T, SyncTreeError>;

fn leaf_digest(key: &str, value: &Value) -> Digest {
    let canonical = serde_json::json!({ "key": key, "value": value });
    ContentHasher::SYNC_TREE_LEAF.hash(canonical.to_string().as_bytes())
}

fn build_levels(leaves: Vec<Digest>) -> Vec<Vec<Digest>> {
    let hasher = &ContentHasher::SYNC_TREE_NODE;
    let mut levels = vec![leaves];
    while let Some(current) = levels.last().filter(|level| level.len() > 1) {
        let next = current
            .chunks(2)
            .map(|pair| {
                // odd node pairs with itself
                let left = &pair[0];
                hasher.hash_pair(left, pair.get(1).unwrap_or(left))
            })
            .collect();
        levels.push(next);
    }
    levels
}

fn root_of(levels: &[Vec<Digest>]) -> Digest {
    levels
        .last()
        .and_then(|level| level.first())
        .copied()
        .unwrap_or(Digest::from_hash([0u8; 32]))
}

// Keeps an explicit `"value": null` distinct from an absent value.
fn deserialize_some<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}
