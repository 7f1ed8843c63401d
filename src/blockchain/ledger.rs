//! The ledger collaborator seam.
//!
//! Everything the workflow needs from a network lives behind [`Ledger`], so
//! the same orchestration runs against the JSON-RPC relay
//! ([`crate::blockchain::RpcLedger`]) or the simulated network
//! ([`crate::blockchain::InMemoryLedger`]).

use alloy::primitives::{Address, Bytes, TxHash, B256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::blockchain::types::{ChainResult, ConfirmationPolicy, Receipt};
use crate::blockchain::units::Tinybar;

/// Log filter: contract address, positional topics and a starting block.
///
/// `None` in a topic position matches anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    pub address: Address,
    pub topics: Vec<Option<B256>>,
    pub from_block: u64,
}

impl LogQuery {
    pub fn matches(&self, log: &LedgerLog) -> bool {
        if log.address != self.address {
            return false;
        }
        if let Some(block) = log.block_number {
            if block < self.from_block {
                return false;
            }
        }
        self.topics.iter().enumerate().all(|(i, expected)| match expected {
            Some(topic) => log.topics.get(i) == Some(topic),
            None => true,
        })
    }
}

/// An emitted contract log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub block_number: Option<u64>,
    pub tx_hash: Option<TxHash>,
}

/// Network operations used by the workflow.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Chain ID transactions are signed for.
    fn chain_id(&self) -> u64;

    /// Address that deploys and calls execute as (`msg.sender`).
    fn sender(&self) -> Address;

    /// Polling cadence for receipts and logs.
    fn confirmation_policy(&self) -> ConfirmationPolicy {
        ConfirmationPolicy::default()
    }

    /// Native balance of an address.
    async fn balance(&self, address: Address) -> ChainResult<Tinybar>;

    /// Latest block number.
    async fn block_number(&self) -> ChainResult<u64>;

    /// Submit a contract creation with `code` = bytecode ‖ constructor args.
    async fn deploy(&self, code: Bytes, gas_limit: u64) -> ChainResult<TxHash>;

    /// Submit a state-changing call. Returns once broadcast.
    async fn send(&self, to: Address, data: Bytes, gas_limit: u64) -> ChainResult<TxHash>;

    /// Execute a read-only call. Never produces a transaction.
    async fn call(&self, to: Address, data: Bytes, gas_limit: u64) -> ChainResult<Bytes>;

    /// Receipt for a transaction, `None` while it is pending.
    async fn receipt(&self, tx_hash: TxHash) -> ChainResult<Option<Receipt>>;

    /// Logs matching a query.
    async fn logs(&self, query: &LogQuery) -> ChainResult<Vec<LedgerLog>>;
}
