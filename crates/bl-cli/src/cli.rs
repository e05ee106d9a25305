use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "trustmesh",
    about = "Baseledger trustmesh tooling: payload privatization, sync tree proofs, reconciliation dry runs",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML configuration file
    #[arg(short, long, global = true, env = "TRUSTMESH_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Encrypt a payload under a workgroup key
    Privatize(PrivatizeArgs),
    /// Decrypt a privatized payload
    Deprivatize(DeprivatizeArgs),
    /// Build a sync tree and proof for a business object
    SyncTree(SyncTreeArgs),
    /// Check a claimed proof against a sync tree
    Verify(VerifyArgs),
    /// Extract the business object from a sync tree
    BusinessObject(BusinessObjectArgs),
    /// Fetch a committed transaction from the ledger
    FetchTx(FetchTxArgs),
    /// Reconcile transaction results from a fixture, offline unless --live
    Reconcile(ReconcileArgs),
    /// Print the effective configuration
    Config(ConfigArgs),
}

/// Where the privatize key comes from.
#[derive(Args, Debug)]
pub struct KeyArgs {
    /// 64-character hex key
    #[arg(long, conflicts_with = "workgroup")]
    pub key: Option<String>,
    /// Workgroup whose configured key to use
    #[arg(long)]
    pub workgroup: Option<Uuid>,
}

#[derive(Args)]
pub struct PrivatizeArgs {
    #[command(flatten)]
    pub key: KeyArgs,
    /// Input file; stdin when omitted
    pub input: Option<PathBuf>,
}

#[derive(Args)]
pub struct DeprivatizeArgs {
    #[command(flatten)]
    pub key: KeyArgs,
    /// File holding the hex ciphertext; stdin when omitted
    pub input: Option<PathBuf>,
}

#[derive(Args)]
pub struct SyncTreeArgs {
    /// JSON business object
    pub object: PathBuf,
    /// Field to cover (hide) in the emitted tree
    #[arg(long)]
    pub cover: Vec<String>,
}

#[derive(Args)]
pub struct VerifyArgs {
    /// Serialized sync tree
    pub tree: PathBuf,
    /// Proof claimed by the ledger payload
    #[arg(long)]
    pub claimed: String,
    /// Proof recorded in the offchain message; defaults to the claimed proof
    #[arg(long)]
    pub expected: Option<String>,
}

#[derive(Args)]
pub struct BusinessObjectArgs {
    /// Serialized sync tree
    pub tree: PathBuf,
}

#[derive(Args)]
pub struct FetchTxArgs {
    pub id: Uuid,
    /// Override the configured ledger REST endpoint
    #[arg(long)]
    pub ledger_url: Option<String>,
    /// Decrypt the payload with this workgroup's key
    #[arg(long)]
    pub workgroup: Option<Uuid>,
}

#[derive(Args)]
pub struct ReconcileArgs {
    /// JSON fixture with entries, messages, transactions, workgroups and results
    pub fixture: PathBuf,
    #[arg(long)]
    pub skip_feedback_verification: bool,
    /// Fetch from the configured ledger and deliver over HTTP instead of
    /// recording side effects
    #[arg(long)]
    pub live: bool,
}

#[derive(Args)]
pub struct ConfigArgs {
    /// Print secrets instead of redacting them
    #[arg(long)]
    pub show_secrets: bool,
}
