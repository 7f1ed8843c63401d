//! The demo run: deploy the token, read it, transfer, observe the event.
//!
//! # Data Flow
//! ```text
//! DemoConfig + environment
//!     → prepare() (credentials, wallet, bytecode; no network)
//!     → execute() against an injected Ledger
//!         STEP 1  wallet + balance
//!         STEP 2  deploy → wait → contract address
//!         STEP 3  subscribe Transfer(sender, *) → symbol → transfer → balances
//!     → WorkflowReport
//! ```
//!
//! Progress lines go to a [`Console`]; structured diagnostics go to tracing.

pub mod console;
pub mod report;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{Address, U256};
use tracing::Instrument;
use uuid::Uuid;

use crate::blockchain::ledger::Ledger;
use crate::blockchain::types::{ChainError, ChainResult};
use crate::blockchain::wallet::Wallet;
use crate::config::{DemoConfig, TransferMode};
use crate::contract::{Bytecode, ContractFactory, DeployedContract, EmittedEvent, InterfaceDescriptor};
use crate::error::DemoError;
use crate::identity::{AccountId, EnvSource, OperatorCredentials};

pub use console::{CapturedConsole, Console, StdoutConsole};
pub use report::{TokenReport, TransferEventReport, TransferReport, WalletReport, WorkflowReport};

const RULE: &str = "===================================";

/// Everything resolved locally before the first network call.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub wallet: Wallet,
    pub counterparty_id: AccountId,
    pub counterparty: Address,
    pub bytecode: Bytecode,
}

/// Resolve identity and load bytecode. Fails before any network access.
pub fn prepare(config: &DemoConfig, env: &impl EnvSource) -> Result<Prepared, DemoError> {
    let credentials = OperatorCredentials::from_env(env)?;
    let counterparty = credentials.counterparty_address();
    let counterparty_id = credentials.counterparty_id;

    let bytecode = Bytecode::load(&config.deployment.bytecode_path)?;
    let wallet = Wallet::new(
        credentials.operator_id,
        credentials.operator_key,
        config.wallet.address_mode,
    );

    Ok(Prepared {
        wallet,
        counterparty_id,
        counterparty,
        bytecode,
    })
}

/// Run steps 1–3 against `ledger`.
pub async fn execute(
    prepared: Prepared,
    ledger: Arc<dyn Ledger>,
    config: &DemoConfig,
    console: &mut dyn Console,
) -> Result<WorkflowReport, DemoError> {
    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("workflow", %run_id, chain_id = ledger.chain_id());

    run(run_id, prepared, ledger, config, console).instrument(span).await
}

async fn run(
    run_id: Uuid,
    prepared: Prepared,
    ledger: Arc<dyn Ledger>,
    config: &DemoConfig,
    console: &mut dyn Console,
) -> Result<WorkflowReport, DemoError> {
    let Prepared {
        wallet,
        counterparty_id,
        counterparty,
        bytecode,
    } = prepared;

    // STEP 1: wallet
    console.line(format!("- STEP 1 {}", RULE));
    console.line(format!("- Alice's address: {}", counterparty));
    console.line(format!("- Wallet address: {}", wallet.address()));
    console.line(format!("- Wallet public key: {}", wallet.public_key()));

    let balance = wallet.balance(ledger.as_ref()).await?;
    console.line(format!("- Wallet address balance: {} hbar", balance.format_hbar()));
    tracing::info!(account = %wallet.account_id(), counterparty = %counterparty_id, "Identity resolved");

    // STEP 2: deploy
    console.line(format!("- STEP 2 {}", RULE));
    let factory = ContractFactory::new(InterfaceDescriptor::token()?, bytecode, ledger.clone());
    let pending = factory
        .deploy(
            &[uint(config.deployment.initial_supply)],
            config.deployment.gas_limit,
        )
        .await?;
    let contract = pending.wait().await?;
    let deployment = contract.deploy_receipt().clone();

    console.line(format!("- Contract deployment status: {}", deployment.status));
    console.line(format!("- Contract address: {}", contract.address()));

    // STEP 3: interact
    console.line(format!("- STEP 3 {}", RULE));
    let gas = config.interaction.gas_limit;

    // Tokens are minted to and sent from the ledger's sender, not the account address.
    let sender = ledger.sender();
    if sender != wallet.address() {
        tracing::info!(wallet = %wallet.address(), sender = %sender, "Token holder differs from wallet address");
    }

    let callbacks = Arc::new(AtomicUsize::new(0));
    let filter = contract.filter("Transfer", &[Some(DynSolValue::Address(sender)), None])?;
    let counter = callbacks.clone();
    let subscription = contract
        .once(filter, move |event: EmittedEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
            tracing::info!(event = %event.name, tx_hash = ?event.tx_hash, "Transfer observed");
        })
        .await?;

    let symbol = read_string(&contract, "symbol", gas).await?;
    console.line(format!("- ERC20 token symbol: {}", symbol));
    let decimals = read_uint(&contract, "decimals", &[], gas).await?;
    let decimals = u8::try_from(decimals)
        .map_err(|_| ChainError::Abi(format!("decimals out of range: {}", decimals)))?;

    let amount = config.interaction.transfer_amount;
    let transfer = contract
        .send("transfer", &[DynSolValue::Address(counterparty), uint(amount)], gas)
        .await?;
    let tx_hash = transfer.tx_hash();
    console.line(format!("- Transaction ID for ERC20 transfer: {}", tx_hash));

    let transfer_receipt = match config.interaction.transfer_mode {
        TransferMode::FireAndForget => None,
        TransferMode::AwaitReceipt => {
            let receipt = transfer.wait().await?;
            console.line(format!("- ERC20 transfer status: {}", receipt.status));
            Some(receipt)
        }
    };

    let wallet_balance = read_uint(&contract, "balanceOf", &[DynSolValue::Address(sender)], gas).await?;
    let counterparty_balance = read_uint(&contract, "balanceOf", &[DynSolValue::Address(counterparty)], gas).await?;
    console.line(format!("- Wallet ERC20 token ({}) balance: {}", symbol, wallet_balance));
    console.line(format!("- Alice's ERC20 token ({}) balance: {}", symbol, counterparty_balance));

    let event_timeout = config.interaction.event_timeout_secs;
    let event = if event_timeout == 0 {
        subscription.cancel();
        None
    } else {
        subscription.wait(Duration::from_secs(event_timeout)).await
    };

    let event = match event {
        Some(event) => {
            let report = transfer_event_report(&event)?;
            console.line(format!(
                "- Event: {} sent {} tokens to {}",
                report.from, report.amount, report.to
            ));
            Some(report)
        }
        None => {
            if event_timeout > 0 {
                console.line(format!("- No Transfer event observed within {}s", event_timeout));
            }
            None
        }
    };

    console.line(format!("- DONE {}", RULE));

    Ok(WorkflowReport {
        run_id,
        chain_id: ledger.chain_id(),
        wallet: WalletReport {
            account_id: wallet.account_id().to_string(),
            address: wallet.address(),
            sender,
            public_key: wallet.public_key(),
            counterparty_address: counterparty,
            balance,
        },
        contract_address: contract.address(),
        deployment,
        token: TokenReport {
            symbol,
            decimals,
            wallet_balance: wallet_balance.to_string(),
            counterparty_balance: counterparty_balance.to_string(),
        },
        transfer: TransferReport {
            tx_hash,
            amount,
            receipt: transfer_receipt,
        },
        event,
        event_callbacks: callbacks.load(Ordering::SeqCst),
    })
}

fn uint(value: u64) -> DynSolValue {
    DynSolValue::Uint(U256::from(value), 256)
}

async fn read_string(contract: &DeployedContract, name: &str, gas: u64) -> ChainResult<String> {
    let values = contract.call(name, &[], gas).await?;
    match values.first() {
        Some(DynSolValue::String(s)) => Ok(s.clone()),
        other => Err(ChainError::Abi(format!("{} returned {:?}, expected string", name, other))),
    }
}

async fn read_uint(contract: &DeployedContract, name: &str, args: &[DynSolValue], gas: u64) -> ChainResult<U256> {
    let values = contract.call(name, args, gas).await?;
    values
        .first()
        .and_then(DynSolValue::as_uint)
        .map(|(value, _)| value)
        .ok_or_else(|| ChainError::Abi(format!("{} returned {:?}, expected uint", name, values)))
}

fn transfer_event_report(event: &EmittedEvent) -> ChainResult<TransferEventReport> {
    let address = |name: &str| {
        event
            .get(name)
            .and_then(DynSolValue::as_address)
            .ok_or_else(|| ChainError::Abi(format!("Transfer event without {}", name)))
    };
    let amount = event
        .get("amount")
        .and_then(DynSolValue::as_uint)
        .map(|(value, _)| value)
        .ok_or_else(|| ChainError::Abi("Transfer event without amount".to_string()))?;

    Ok(TransferEventReport {
        from: address("from")?,
        to: address("to")?,
        amount: amount.to_string(),
        block_number: event.block_number,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::memory::InMemoryLedger;
    use crate::blockchain::types::TxStatus;
    use std::collections::HashMap;

    const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn env() -> HashMap<String, String> {
        [
            ("SIGNER_ID", "0.0.1001"),
            ("SIGNER_PVKEY", TEST_PRIVATE_KEY),
            ("ALICE_ID", "0.0.1002"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn config(tag: &str) -> DemoConfig {
        let path = std::env::temp_dir()
            .join(format!("hedera_token_demo_workflow_{}_{}.bin", tag, Uuid::new_v4()));
        std::fs::write(&path, "0x6080604052").unwrap();

        let mut config = DemoConfig::default();
        config.deployment.bytecode_path = path.display().to_string();
        config.interaction.event_timeout_secs = 2;
        config
    }

    #[test]
    fn test_prepare_fails_without_environment() {
        let err = prepare(&config("no_env"), &HashMap::new()).unwrap_err();
        assert!(matches!(err, DemoError::Identity(_)));
        assert!(err.is_local());
    }

    #[test]
    fn test_prepare_fails_on_missing_bytecode() {
        let mut config = config("missing_bytecode");
        config.deployment.bytecode_path = "no/such/contractBytecode.bin".to_string();

        let err = prepare(&config, &env()).unwrap_err();
        assert!(matches!(err, DemoError::Bytecode(_)));
    }

    #[tokio::test]
    async fn test_execute_runs_all_steps() {
        let config = config("all_steps");
        let prepared = prepare(&config, &env()).unwrap();
        let ledger = Arc::new(InMemoryLedger::new(prepared.wallet.signer_address()));
        let mut console = CapturedConsole::new();

        let report = execute(prepared, ledger, &config, &mut console).await.unwrap();

        assert_eq!(report.deployment.status, TxStatus::Success);
        assert_eq!(report.token.symbol, "TKN");
        // Default account mode: the long-zero wallet address is not the sender.
        assert_ne!(report.wallet.sender, report.wallet.address);
        assert_eq!(report.token.wallet_balance, "75");
        assert_eq!(report.token.counterparty_balance, "25");
        assert_eq!(report.event_callbacks, 1);
        assert_eq!(report.event.unwrap().amount, "25");

        let steps: Vec<&String> = console.lines().iter().filter(|l| l.starts_with("- STEP")).collect();
        assert_eq!(steps.len(), 3);
        assert!(console.contains("- Contract deployment status: SUCCESS"));
        assert!(console.lines().last().unwrap().starts_with("- DONE"));
    }

    #[tokio::test]
    async fn test_failed_deployment_stops_the_run() {
        let config = config("failed_deploy");
        let prepared = prepare(&config, &env()).unwrap();
        let ledger = Arc::new(InMemoryLedger::new(prepared.wallet.signer_address()).with_deploy_status(TxStatus::Reverted));
        let mut console = CapturedConsole::new();

        let err = execute(prepared, ledger.clone(), &config, &mut console).await.unwrap_err();

        match err {
            DemoError::Chain(e) => assert_eq!(e.receipt().unwrap().status, TxStatus::Reverted),
            other => panic!("unexpected error: {}", other),
        }
        assert!(!console.contains("STEP 3"));
        assert_eq!(ledger.call_count().await, 0);
    }
}
