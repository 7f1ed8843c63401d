//! JSON-RPC ledger client with timeout and failover handling.
//!
//! # Responsibilities
//! - Connect to the network's JSON-RPC relay with the operator wallet
//! - Query chain state (block number, balances, receipts, logs)
//! - Submit signed transactions (contract creation and calls)
//! - Bound every request by the configured timeout
//!
//! # Design Decisions
//! - Reads fall through the primary then failover relays
//! - Writes go to the primary only; a broadcast is never repeated

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{Filter, Log, TransactionReceipt, TransactionRequest};
use alloy::transports::TransportResult;
use async_trait::async_trait;
use tokio::time::timeout;

use crate::blockchain::ledger::{Ledger, LedgerLog, LogQuery};
use crate::blockchain::types::{
    ChainError, ChainId, ChainResult, ConfirmationPolicy, Receipt, ResolvedNetwork, TxStatus,
};
use crate::blockchain::units::Tinybar;
use crate::blockchain::wallet::Wallet;
use crate::observability::metrics;

type SharedProvider = Arc<dyn Provider + Send + Sync>;

/// Ledger backed by one or more JSON-RPC relays.
#[derive(Clone)]
pub struct RpcLedger {
    /// List of providers (primary + failovers).
    providers: Vec<SharedProvider>,
    network: ResolvedNetwork,
    /// Address transactions are signed by.
    sender: Address,
}

impl RpcLedger {
    /// Connect to a network with the wallet as signer.
    ///
    /// Chain ID verification failures are logged, not fatal.
    pub async fn connect(network: ResolvedNetwork, wallet: &Wallet) -> ChainResult<Self> {
        let signer = EthereumWallet::from(wallet.signer().clone());

        let mut providers: Vec<SharedProvider> = Vec::new();
        for url in std::iter::once(&network.rpc_url).chain(network.failover_urls.iter()) {
            let provider = ProviderBuilder::new()
                .wallet(signer.clone())
                .connect_http(url.clone());
            providers.push(Arc::new(provider));
        }

        let ledger = Self {
            providers,
            network,
            sender: wallet.signer_address(),
        };

        match ledger.verify_chain_id().await {
            Ok(()) => {
                tracing::info!(
                    network = %ledger.network.name,
                    rpc_url = %ledger.network.rpc_url,
                    chain_id = ledger.network.chain_id,
                    "Ledger client initialized"
                );
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Ledger client initialized but chain verification failed"
                );
            }
        }

        Ok(ledger)
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> ChainResult<()> {
        let chain_id = self.get_chain_id().await?;
        if chain_id.0 != self.network.chain_id {
            return Err(ChainError::ChainMismatch {
                expected: self.network.chain_id,
                actual: chain_id.0,
            });
        }
        Ok(())
    }

    /// Get the chain ID from the RPC.
    pub async fn get_chain_id(&self) -> ChainResult<ChainId> {
        self.read("eth_chainId", |p| async move { p.get_chain_id().await })
            .await
            .map(ChainId)
    }

    /// Run an idempotent request, falling through providers on error or timeout.
    async fn read<T, F, Fut>(&self, method: &'static str, op: F) -> ChainResult<T>
    where
        F: Fn(SharedProvider) -> Fut,
        Fut: Future<Output = TransportResult<T>>,
    {
        let mut last_error = String::from("no providers configured");

        for (i, provider) in self.providers.iter().enumerate() {
            let started = Instant::now();
            match timeout(self.network.rpc_timeout, op(provider.clone())).await {
                Ok(Ok(result)) => {
                    metrics::record_rpc_call(method, true, started.elapsed());
                    return Ok(result);
                }
                Ok(Err(e)) => {
                    metrics::record_rpc_call(method, false, started.elapsed());
                    tracing::warn!(provider_idx = i, method, error = %e, "RPC error, trying next provider");
                    last_error = e.to_string();
                }
                Err(_) => {
                    metrics::record_rpc_call(method, false, started.elapsed());
                    tracing::warn!(provider_idx = i, method, "RPC timeout, trying next provider");
                    last_error = format!("timeout after {}s", self.network.rpc_timeout.as_secs());
                }
            }
        }

        Err(ChainError::Rpc(format!(
            "All RPC providers failed for {}: {}",
            method, last_error
        )))
    }

    /// Broadcast a transaction through the primary provider.
    async fn write(&self, method: &'static str, tx: TransactionRequest) -> ChainResult<TxHash> {
        let provider = self
            .providers
            .first()
            .ok_or_else(|| ChainError::NotAvailable("no providers configured".to_string()))?;

        let started = Instant::now();
        let pending = match timeout(self.network.rpc_timeout, provider.send_transaction(tx)).await {
            Ok(Ok(pending)) => pending,
            Ok(Err(e)) => {
                metrics::record_rpc_call(method, false, started.elapsed());
                return Err(ChainError::Rpc(format!("{} rejected: {}", method, e)));
            }
            Err(_) => {
                metrics::record_rpc_call(method, false, started.elapsed());
                return Err(ChainError::Timeout(self.network.rpc_timeout.as_secs()));
            }
        };
        metrics::record_rpc_call(method, true, started.elapsed());

        let tx_hash = *pending.tx_hash();
        tracing::debug!(method, tx_hash = %tx_hash, "Transaction broadcast");
        Ok(tx_hash)
    }

    fn base_request(&self, gas_limit: u64) -> TransactionRequest {
        TransactionRequest::default()
            .with_from(self.sender)
            .with_chain_id(self.network.chain_id)
            .with_gas_limit(gas_limit)
    }
}

fn to_receipt(receipt: TransactionReceipt) -> Receipt {
    Receipt {
        tx_hash: receipt.transaction_hash,
        status: if receipt.status() {
            TxStatus::Success
        } else {
            TxStatus::Reverted
        },
        contract_address: receipt.contract_address,
        block_number: receipt.block_number,
        gas_used: receipt.gas_used,
    }
}

fn to_ledger_log(log: Log) -> LedgerLog {
    LedgerLog {
        address: log.inner.address,
        topics: log.inner.data.topics().to_vec(),
        data: log.inner.data.data.clone(),
        block_number: log.block_number,
        tx_hash: log.transaction_hash,
    }
}

fn to_filter(query: &LogQuery) -> Filter {
    let mut filter = Filter::new().address(query.address).from_block(query.from_block);
    for (i, topic) in query.topics.iter().enumerate() {
        let Some(topic) = *topic else { continue };
        filter = match i {
            0 => filter.event_signature(topic),
            1 => filter.topic1(topic),
            2 => filter.topic2(topic),
            3 => filter.topic3(topic),
            _ => filter,
        };
    }
    filter
}

#[async_trait]
impl Ledger for RpcLedger {
    fn chain_id(&self) -> u64 {
        self.network.chain_id
    }

    fn sender(&self) -> Address {
        self.sender
    }

    fn confirmation_policy(&self) -> ConfirmationPolicy {
        self.network.confirmation
    }

    async fn balance(&self, address: Address) -> ChainResult<Tinybar> {
        let weibars = self
            .read("eth_getBalance", move |p| async move { p.get_balance(address).await })
            .await?;
        Ok(Tinybar::from_weibars(weibars))
    }

    async fn block_number(&self) -> ChainResult<u64> {
        self.read("eth_blockNumber", |p| async move { p.get_block_number().await })
            .await
    }

    async fn deploy(&self, code: Bytes, gas_limit: u64) -> ChainResult<TxHash> {
        let tx = self.base_request(gas_limit).with_deploy_code(code);
        self.write("deploy", tx).await
    }

    async fn send(&self, to: Address, data: Bytes, gas_limit: u64) -> ChainResult<TxHash> {
        let tx = self.base_request(gas_limit).with_to(to).with_input(data);
        self.write("send", tx).await
    }

    async fn call(&self, to: Address, data: Bytes, gas_limit: u64) -> ChainResult<Bytes> {
        let tx = self.base_request(gas_limit).with_to(to).with_input(data);
        self.read("eth_call", move |p| {
            let tx = tx.clone();
            async move { p.call(tx).await }
        })
        .await
        .map_err(|e| match e {
            ChainError::Rpc(msg) => ChainError::CallFailed(msg),
            other => other,
        })
    }

    async fn receipt(&self, tx_hash: TxHash) -> ChainResult<Option<Receipt>> {
        let receipt = self
            .read("eth_getTransactionReceipt", move |p| async move {
                p.get_transaction_receipt(tx_hash).await
            })
            .await?;
        Ok(receipt.map(to_receipt))
    }

    async fn logs(&self, query: &LogQuery) -> ChainResult<Vec<LedgerLog>> {
        let filter = to_filter(query);
        let logs = self
            .read("eth_getLogs", move |p| {
                let filter = filter.clone();
                async move { p.get_logs(&filter).await }
            })
            .await?;
        Ok(logs.into_iter().map(to_ledger_log).collect())
    }
}

impl std::fmt::Debug for RpcLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcLedger")
            .field("network", &self.network.name)
            .field("rpc_url", &self.network.rpc_url.as_str())
            .field("chain_id", &self.network.chain_id)
            .field("providers", &self.providers.len())
            .finish()
    }
}
