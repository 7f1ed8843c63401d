//! Chain-specific types and error definitions.

use std::fmt;
use std::time::Duration;

use alloy::primitives::{Address, TxHash};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::NetworkConfig;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Hedera networks reachable through a public JSON-RPC relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownNetwork {
    Mainnet,
    Testnet,
    Previewnet,
    Local,
}

impl KnownNetwork {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "mainnet" => Some(Self::Mainnet),
            "testnet" => Some(Self::Testnet),
            "previewnet" => Some(Self::Previewnet),
            "local" | "localhost" => Some(Self::Local),
            _ => None,
        }
    }

    pub fn chain_id(&self) -> u64 {
        match self {
            Self::Mainnet => 295,
            Self::Testnet => 296,
            Self::Previewnet => 297,
            Self::Local => 298,
        }
    }

    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            Self::Mainnet => "https://mainnet.hashio.io/api",
            Self::Testnet => "https://testnet.hashio.io/api",
            Self::Previewnet => "https://previewnet.hashio.io/api",
            Self::Local => "http://localhost:7546",
        }
    }
}

/// A network configuration with every default filled in.
#[derive(Debug, Clone)]
pub struct ResolvedNetwork {
    pub name: String,
    pub rpc_url: url::Url,
    pub failover_urls: Vec<url::Url>,
    pub chain_id: u64,
    pub rpc_timeout: Duration,
    pub confirmation: ConfirmationPolicy,
}

impl ResolvedNetwork {
    /// Resolve a named network and apply URL / chain id overrides.
    pub fn resolve(config: &NetworkConfig) -> ChainResult<Self> {
        let known = KnownNetwork::from_name(&config.name);

        let rpc_url_str = match (&config.rpc_url, known) {
            (Some(url), _) => url.clone(),
            (None, Some(network)) => network.default_rpc_url().to_string(),
            (None, None) => {
                return Err(ChainError::NotAvailable(format!(
                    "unknown network '{}' and no rpc_url configured",
                    config.name
                )))
            }
        };
        let rpc_url = rpc_url_str
            .parse()
            .map_err(|e| ChainError::Rpc(format!("Invalid RPC URL '{}': {}", rpc_url_str, e)))?;

        let mut failover_urls = Vec::new();
        for url_str in &config.failover_urls {
            match url_str.parse() {
                Ok(url) => failover_urls.push(url),
                Err(_) => tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL"),
            }
        }

        let chain_id = config
            .chain_id
            .or(known.map(|n| n.chain_id()))
            .ok_or_else(|| {
                ChainError::NotAvailable(format!("no chain_id configured for '{}'", config.name))
            })?;

        Ok(Self {
            name: config.name.clone(),
            rpc_url,
            failover_urls,
            chain_id,
            rpc_timeout: Duration::from_secs(config.rpc_timeout_secs),
            confirmation: ConfirmationPolicy {
                poll_interval: Duration::from_millis(config.poll_interval_ms),
                timeout: Duration::from_secs(config.confirmation_timeout_secs),
            },
        })
    }
}

/// How long and how often to poll for receipts and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Final execution status of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxStatus {
    Success,
    Reverted,
}

impl TxStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "SUCCESS"),
            Self::Reverted => write!(f, "REVERTED"),
        }
    }
}

/// Network-confirmed outcome of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_hash: TxHash,
    pub status: TxStatus,
    /// Set for successful contract creations.
    pub contract_address: Option<Address>,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, Error)]
pub enum ChainError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Receipt did not appear within the confirmation window.
    #[error("Transaction {tx_hash} not confirmed after {secs} seconds")]
    ConfirmationTimeout { tx_hash: TxHash, secs: u64 },

    /// Transaction reached consensus with a non-success status.
    #[error("Transaction {} failed with status {}", .0.tx_hash, .0.status)]
    TransactionFailed(Box<Receipt>),

    /// Deployment confirmed but produced no usable contract.
    #[error("Deployment failed: {0}")]
    DeploymentFailed(String),

    /// Read-only call rejected by the contract or network.
    #[error("Call failed: {0}")]
    CallFailed(String),

    /// Argument or return value does not fit the interface.
    #[error("ABI error: {0}")]
    Abi(String),

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    /// Network could not be resolved or is unavailable.
    #[error("Blockchain not available: {0}")]
    NotAvailable(String),
}

impl ChainError {
    /// Receipt attached to a failed transaction, if any.
    pub fn receipt(&self) -> Option<&Receipt> {
        match self {
            Self::TransactionFailed(receipt) => Some(receipt),
            _ => None,
        }
    }
}

/// Result type for blockchain operations.
pub type ChainResult<T> = Result<T, ChainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_id_conversion() {
        let chain_id = ChainId::from(296u64);
        assert_eq!(chain_id.0, 296);
        assert_eq!(u64::from(chain_id), 296);
    }

    #[test]
    fn test_resolve_named_network() {
        let resolved = ResolvedNetwork::resolve(&NetworkConfig::default()).unwrap();
        assert_eq!(resolved.chain_id, 296);
        assert_eq!(resolved.rpc_url.as_str(), "https://testnet.hashio.io/api");
        assert_eq!(resolved.confirmation.poll_interval, Duration::from_millis(2000));
    }

    #[test]
    fn test_resolve_with_overrides() {
        let config = NetworkConfig {
            name: "custom".to_string(),
            rpc_url: Some("http://127.0.0.1:7546".to_string()),
            failover_urls: vec!["not a url".to_string(), "http://127.0.0.1:7547".to_string()],
            chain_id: Some(31337),
            ..NetworkConfig::default()
        };
        let resolved = ResolvedNetwork::resolve(&config).unwrap();
        assert_eq!(resolved.chain_id, 31337);
        assert_eq!(resolved.failover_urls.len(), 1);
    }

    #[test]
    fn test_unknown_network_without_url() {
        let config = NetworkConfig {
            name: "devnet".to_string(),
            ..NetworkConfig::default()
        };
        assert!(matches!(
            ResolvedNetwork::resolve(&config),
            Err(ChainError::NotAvailable(_))
        ));
    }

    #[test]
    fn test_transaction_failed_carries_receipt() {
        let receipt = Receipt {
            tx_hash: TxHash::ZERO,
            status: TxStatus::Reverted,
            contract_address: None,
            block_number: Some(7),
            gas_used: 21_000,
        };
        let err = ChainError::TransactionFailed(Box::new(receipt.clone()));
        assert!(err.to_string().contains("REVERTED"));
        assert_eq!(err.receipt(), Some(&receipt));
    }
}
