use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context};
use bl_crypto::{PayloadCipher, PrivatizeKey, ProofVerification, ProofVerifier, SyncTree};
use bl_ledger::{HttpLedgerReader, LedgerConfig, LedgerReader};
use bl_store::{StaticWorkgroupDirectory, WorkgroupDirectory};
use bl_types::CommitmentState;
use colored::Colorize;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::cli::*;
use crate::config::AppConfig;
use crate::fixture::{Fixture, FixtureRun, Wiring};

pub async fn run_command(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Privatize(args) => cmd_privatize(args, &config, format).await,
        Command::Deprivatize(args) => cmd_deprivatize(args, &config, format).await,
        Command::SyncTree(args) => cmd_sync_tree(args, format),
        Command::Verify(args) => cmd_verify(args, format),
        Command::BusinessObject(args) => cmd_business_object(args),
        Command::FetchTx(args) => cmd_fetch_tx(args, &config, format).await,
        Command::Reconcile(args) => cmd_reconcile(args, &config, format).await,
        Command::Config(args) => cmd_config(args, &config, format),
    }
}

async fn cmd_privatize(
    args: PrivatizeArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let key = resolve_key(&args.key, config).await?;
    let plaintext = read_input(args.input.as_deref())?;
    let ciphertext = PayloadCipher::privatize(&plaintext, &key)?;
    match format {
        OutputFormat::Json => print_json(&json!({ "payload": ciphertext }))?,
        OutputFormat::Text => println!("{ciphertext}"),
    }
    Ok(())
}

async fn cmd_deprivatize(
    args: DeprivatizeArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let key = resolve_key(&args.key, config).await?;
    let raw = read_input(args.input.as_deref())?;
    let ciphertext = String::from_utf8(raw).context("ciphertext is not utf-8")?;
    let plaintext = PayloadCipher::deprivatize(&ciphertext, &key)?;
    let text = String::from_utf8_lossy(&plaintext);
    match format {
        OutputFormat::Json => match serde_json::from_str::<Value>(&text) {
            Ok(value) => print_json(&value)?,
            Err(_) => print_json(&json!({ "plaintext": text }))?,
        },
        OutputFormat::Text => println!("{text}"),
    }
    Ok(())
}

fn cmd_sync_tree(args: SyncTreeArgs, format: OutputFormat) -> anyhow::Result<()> {
    let object = read_json(&args.object)?;
    let mut tree = SyncTree::from_business_object(&object)?;
    for key in &args.cover {
        if !tree.cover(key) {
            bail!("business object has no field {key:?}");
        }
    }
    match format {
        OutputFormat::Json => print_json(&tree)?,
        OutputFormat::Text => {
            println!("{} {}", "Proof:".bold(), tree.root_proof.to_hex().yellow());
            println!(
                "  Leaves: {}, covered: {}",
                tree.nodes.iter().filter(|n| n.key.is_some()).count(),
                args.cover.len()
            );
            println!("{}", tree.to_json()?);
        }
    }
    Ok(())
}

fn cmd_verify(args: VerifyArgs, format: OutputFormat) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&args.tree)
        .with_context(|| format!("failed to read {}", args.tree.display()))?;
    let expected = args.expected.as_deref().unwrap_or(&args.claimed);
    let verification = ProofVerifier::verify_hash_match(&args.claimed, expected, &raw)?;

    match (&verification, format) {
        (ProofVerification::Match { root }, OutputFormat::Json) => {
            print_json(&json!({ "match": true, "root": root }))?
        }
        (ProofVerification::Match { root }, OutputFormat::Text) => {
            println!("{} Proof verified", "✓".green().bold());
            println!("  Root: {}", root.to_hex().yellow());
        }
        (ProofVerification::Mismatch { computed, .. }, OutputFormat::Json) => {
            print_json(&json!({ "match": false, "computed": computed }))?
        }
        (ProofVerification::Mismatch { claimed, expected, computed }, OutputFormat::Text) => {
            println!("{} Proof mismatch", "✗".red().bold());
            println!("  Claimed:  {}", claimed.red());
            println!("  Expected: {}", expected.red());
            println!("  Computed: {}", computed.to_hex().yellow());
        }
    }
    if !verification.is_match() {
        bail!("business object proof does not match");
    }
    Ok(())
}

fn cmd_business_object(args: BusinessObjectArgs) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&args.tree)
        .with_context(|| format!("failed to read {}", args.tree.display()))?;
    let tree = SyncTree::from_json(&raw)?;
    print_json(&tree.business_object_json())
}

async fn cmd_fetch_tx(
    args: FetchTxArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let ledger_config = LedgerConfig {
        base_url: args.ledger_url.unwrap_or_else(|| config.ledger.base_url.clone()),
        ..config.ledger.clone()
    };
    let reader = HttpLedgerReader::new(&ledger_config)?;
    tracing::debug!(url = %reader.transaction_url(args.id), "querying ledger");
    let tx = reader.fetch_committed_transaction(args.id).await?;

    let payload = match args.workgroup {
        Some(workgroup) => {
            let key = directory_key(config, workgroup).await?;
            let plaintext = PayloadCipher::deprivatize(&tx.payload, &key)?;
            Some(serde_json::from_slice::<Value>(&plaintext).context("payload is not json")?)
        }
        None => None,
    };

    match format {
        OutputFormat::Json => print_json(&json!({ "transaction": tx, "payload": payload }))?,
        OutputFormat::Text => {
            println!("Transaction {}", tx.baseledger_transaction_id.yellow().bold());
            println!("  Ledger id: {}", tx.id);
            println!("  Creator:   {}", tx.creator.cyan());
            match payload {
                Some(payload) => println!("{}", serde_json::to_string_pretty(&payload)?),
                None => println!("  Payload:   {} bytes (privatized)", tx.payload.len() / 2),
            }
        }
    }
    Ok(())
}

async fn cmd_reconcile(
    args: ReconcileArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let fixture = Fixture::load(&args.fixture)?;
    let mut engine_config = config.engine.clone();
    if args.skip_feedback_verification {
        engine_config.verify_feedback_proofs = false;
    }
    let wiring = if args.live {
        Wiring::Live {
            ledger: &config.ledger,
            messaging: &config.messaging,
        }
    } else {
        Wiring::DryRun
    };
    let run = fixture.run(engine_config, &config.directory, wiring).await?;

    match format {
        OutputFormat::Json => print_json(&run),
        OutputFormat::Text => {
            print_run(&run);
            Ok(())
        }
    }
}

fn print_run(run: &FixtureRun) {
    let r = &run.report;
    println!(
        "{} Reconciled {} results{}: {} committed, {} invalidated, {} deferred, {} already applied",
        "✓".green().bold(),
        r.processed.to_string().bold(),
        if run.live { " (live)" } else { "" },
        r.committed.to_string().green(),
        r.invalidated.to_string().red(),
        r.deferred,
        r.already_applied
    );
    if r.superseded > 0 {
        println!(
            "  {} {} results lost a concurrent commit; their side effects still ran",
            "Superseded:".yellow().bold(),
            r.superseded
        );
    }
    if r.failures() > 0 {
        println!(
            "  {} {} transient, {} integrity",
            "Failures:".red().bold(),
            r.transient_failures,
            r.integrity_failures
        );
    }
    for (tx_id, state) in &run.states {
        let state = match state {
            CommitmentState::Committed => state.as_str().green(),
            CommitmentState::Invalid => state.as_str().red(),
            CommitmentState::Pending => state.as_str().yellow(),
        };
        println!("  {}  {}", tx_id.to_string().dimmed(), state);
    }
    for envelope in &run.forwarded {
        println!(
            "  {} message {} → {}",
            "forwarded".cyan(),
            envelope.message.id,
            envelope.recipient_org_id
        );
    }
    for feedback in &run.feedback {
        println!(
            "  {} for message {} → {}",
            "reject feedback".red(),
            feedback.original_offchain_process_message_id,
            feedback.recipient
        );
    }
    for object in &run.processed {
        println!(
            "  {} {:?} from message {}",
            "processed".green(),
            object.kind,
            object.message_id
        );
    }
}

fn cmd_config(args: ConfigArgs, config: &AppConfig, format: OutputFormat) -> anyhow::Result<()> {
    let shown = if args.show_secrets {
        config.clone()
    } else {
        config.redacted()
    };
    match format {
        OutputFormat::Json => print_json(&shown),
        OutputFormat::Text => {
            print!("{}", shown.to_toml()?);
            Ok(())
        }
    }
}

async fn resolve_key(args: &KeyArgs, config: &AppConfig) -> anyhow::Result<PrivatizeKey> {
    match (&args.key, args.workgroup) {
        (Some(hex), _) => Ok(PrivatizeKey::from_hex(hex)?),
        (None, Some(workgroup)) => directory_key(config, workgroup).await,
        (None, None) => bail!("either --key or --workgroup is required"),
    }
}

async fn directory_key(config: &AppConfig, workgroup: Uuid) -> anyhow::Result<PrivatizeKey> {
    let directory = StaticWorkgroupDirectory::new(config.directory.clone());
    Ok(directory.resolve_key(workgroup).await?)
}

fn read_input(path: Option<&Path>) -> anyhow::Result<Vec<u8>> {
    match path {
        Some(path) => {
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
        }
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("{} is not valid json", path.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
