//! Hedera token demo
//!
//! Deploys a fixed-supply token from precompiled bytecode, reads its symbol,
//! transfers part of the supply to a counterparty and listens once for the
//! resulting Transfer event.
//!
//! ```text
//!   .env / environment ──▶ identity ──▶ wallet ─┐
//!   config.toml + flags ──▶ config ─────────────┼──▶ workflow ──▶ stdout transcript
//!   contractBytecode.bin ──▶ contract::bytecode ┘        │        + JSON report
//!                                                        ▼
//!                                     Ledger (RpcLedger | InMemoryLedger)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use hedera_token_demo::blockchain::{InMemoryLedger, Ledger, ResolvedNetwork, RpcLedger, Tinybar};
use hedera_token_demo::config::validation::validate_config;
use hedera_token_demo::config::{load_or_default, ConfigError, TransferMode};
use hedera_token_demo::identity::ProcessEnv;
use hedera_token_demo::observability::logging::init_logging;
use hedera_token_demo::workflow::{self, StdoutConsole};

/// Starting hbar balance of the simulated operator in dry runs (10,000 hbar).
const DRY_RUN_BALANCE_TINYBARS: u64 = 1_000_000_000_000;

#[derive(Parser)]
#[command(name = "token-demo")]
#[command(about = "Deploy and exercise a token contract on a Hedera network", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Network name (mainnet, testnet, previewnet, local)
    #[arg(short, long)]
    network: Option<String>,

    /// Path to the contract bytecode
    #[arg(short, long)]
    bytecode: Option<String>,

    /// Run against a simulated in-memory network
    #[arg(long)]
    dry_run: bool,

    /// Wait for the transfer receipt before reading balances
    #[arg(long)]
    confirm_transfer: bool,

    /// Seconds to wait for the Transfer event (0 = do not wait)
    #[arg(long)]
    event_timeout: Option<u64>,

    /// Write the run report as JSON
    #[arg(long)]
    report: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // A missing .env is fine; the variables may already be set.
    let _ = dotenvy::dotenv();

    let mut config = load_or_default(cli.config.as_deref())?;
    if let Some(network) = cli.network {
        config.network.name = network;
        config.network.rpc_url = None;
        config.network.chain_id = None;
    }
    if let Some(path) = cli.bytecode {
        config.deployment.bytecode_path = path;
    }
    if cli.confirm_transfer {
        config.interaction.transfer_mode = TransferMode::AwaitReceipt;
    }
    if let Some(secs) = cli.event_timeout {
        config.interaction.event_timeout_secs = secs;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    init_logging(&config.observability);
    tracing::info!(
        network = %config.network.name,
        dry_run = cli.dry_run,
        transfer_mode = ?config.interaction.transfer_mode,
        "token-demo v0.1.0 starting"
    );

    let prepared = workflow::prepare(&config, &ProcessEnv)?;

    let ledger: Arc<dyn Ledger> = if cli.dry_run {
        // Same sender the relay would execute as; the hbar balance is queried at the wallet address.
        Arc::new(
            InMemoryLedger::new(prepared.wallet.signer_address()).with_balance(
                prepared.wallet.address(),
                Tinybar::from_tinybars(DRY_RUN_BALANCE_TINYBARS),
            ),
        )
    } else {
        let network = ResolvedNetwork::resolve(&config.network)?;
        Arc::new(RpcLedger::connect(network, &prepared.wallet).await?)
    };

    let report = workflow::execute(prepared, ledger, &config, &mut StdoutConsole).await?;

    if let Some(path) = cli.report {
        std::fs::write(&path, serde_json::to_string_pretty(&report)?)?;
        tracing::info!(path = %path.display(), "Report written");
    }

    tracing::info!(run_id = %report.run_id, "Done");
    Ok(())
}
