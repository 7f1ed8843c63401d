//! Machine-readable summary of one run.

use alloy::primitives::{Address, TxHash};
use serde::Serialize;
use uuid::Uuid;

use crate::blockchain::types::Receipt;
use crate::blockchain::units::Tinybar;

/// Everything a run observed, written by `--report`.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowReport {
    pub run_id: Uuid,
    pub chain_id: u64,
    pub wallet: WalletReport,
    pub deployment: Receipt,
    pub contract_address: Address,
    pub token: TokenReport,
    pub transfer: TransferReport,
    /// The Transfer event seen by the subscription, if any.
    pub event: Option<TransferEventReport>,
    /// How many times the subscription callback ran (0 or 1).
    pub event_callbacks: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct WalletReport {
    pub account_id: String,
    pub address: Address,
    /// Address the ledger executes deploys and transfers as; holds the tokens.
    pub sender: Address,
    pub public_key: String,
    pub counterparty_address: Address,
    pub balance: Tinybar,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenReport {
    pub symbol: String,
    pub decimals: u8,
    /// Post-transfer balances of the sender and counterparty as decimal strings.
    pub wallet_balance: String,
    pub counterparty_balance: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferReport {
    pub tx_hash: TxHash,
    pub amount: u64,
    /// Present only when the transfer was waited on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<Receipt>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferEventReport {
    pub from: Address,
    pub to: Address,
    pub amount: String,
    pub block_number: Option<u64>,
}
