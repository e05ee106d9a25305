//! Storage collaborators for trustmesh reconciliation.
//!
//! The reconciliation engine reads and writes local state only through the
//! traits in this crate:
//!
//! - [`OffchainMessageStore`] -- offchain process messages by id
//! - [`CommitmentStore`] -- conditional commitment state updates
//! - [`WorkgroupDirectory`] -- workgroup keys and member endpoints
//!
//! # Backends
//!
//! - [`InMemoryStore`] -- implements all three, for tests and dry runs
//! - [`StaticWorkgroupDirectory`] -- directory built from configuration

pub mod directory;
pub mod error;
pub mod memory;
pub mod traits;

pub use directory::{workgroup_key, DirectoryConfig, StaticWorkgroupDirectory};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use traits::{CommitmentStore, OffchainMessageStore, WorkgroupDirectory};
