use bl_types::Digest;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag (e.g., `"baseledger-synctree-leaf-v1"`)
/// that is prepended to every hash computation, so a leaf and an internal
/// node over identical bytes never collide.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for sync tree leaves (one business object field each).
    pub const SYNC_TREE_LEAF: Self = Self {
        domain: "baseledger-synctree-leaf-v1",
    };
    /// Hasher for sync tree internal nodes.
    pub const SYNC_TREE_NODE: Self = Self {
        domain: "baseledger-synctree-node-v1",
    };

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> Digest {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        Digest::from_hash(*hasher.finalize().as_bytes())
    }

    /// Hash two child digests into their parent.
    pub fn hash_pair(&self, left: &Digest, right: &Digest) -> Digest {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(left.as_bytes());
        hasher.update(right.as_bytes());
        Digest::from_hash(*hasher.finalize().as_bytes())
    }
}
