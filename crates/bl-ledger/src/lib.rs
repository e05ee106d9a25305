//! Read access to committed Baseledger transactions.
//!
//! This crate provides:
//! - The async `LedgerReader` trait boundary
//! - `HttpLedgerReader`, backed by the chain node's REST query endpoint
//! - `InMemoryLedger` for tests and dry runs

pub mod config;
pub mod error;
pub mod http;
pub mod memory;
pub mod reader;

pub use config::LedgerConfig;
pub use error::{LedgerError, LedgerResult};
pub use http::HttpLedgerReader;
pub use memory::InMemoryLedger;
pub use reader::LedgerReader;
