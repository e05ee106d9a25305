//! Cryptographic primitives for Baseledger.
//!
//! Provides AES-256-GCM payload privatization under workgroup keys,
//! domain-separated BLAKE3 hashing, and sync trees with business object
//! proof verification.
//!
//! All crypto operations wrap established libraries; there is no custom
//! cryptography here.

pub mod cipher;
pub mod hasher;
pub mod synctree;

pub use cipher::{CipherError, CipherResult, PayloadCipher, PrivatizeKey};
pub use hasher::ContentHasher;
pub use synctree::{
    business_object_proof, ProofVerification, ProofVerifier, SyncTree, SyncTreeError,
    SyncTreeNode, SyncTreeResult,
};
