//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from an optional TOML
//! file. Credentials are deliberately absent: they only come from the
//! environment (see [`crate::identity::credentials`]).

use serde::{Deserialize, Serialize};

/// Root configuration for a demo run.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DemoConfig {
    /// Network selection and RPC behaviour.
    pub network: NetworkConfig,

    /// How the wallet address is derived.
    pub wallet: WalletConfig,

    /// Contract deployment parameters.
    pub deployment: DeploymentConfig,

    /// Post-deployment interaction parameters.
    pub interaction: InteractionConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// Network configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Named network: testnet, mainnet, previewnet or local.
    pub name: String,

    /// JSON-RPC relay URL. Overrides the named network's default.
    pub rpc_url: Option<String>,

    /// Failover JSON-RPC relay URLs, used for read requests only.
    pub failover_urls: Vec<String>,

    /// Expected chain ID. Overrides the named network's default.
    pub chain_id: Option<u64>,

    /// Per-request RPC timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Upper bound on waiting for a transaction receipt.
    pub confirmation_timeout_secs: u64,

    /// Interval between receipt and log polls.
    pub poll_interval_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: "testnet".to_string(),
            rpc_url: None,
            failover_urls: Vec::new(),
            chain_id: None,
            rpc_timeout_secs: 30,
            confirmation_timeout_secs: 120,
            poll_interval_ms: 2000,
        }
    }
}

/// Source of the wallet's on-network address.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AddressMode {
    /// Long-zero address derived from the operator account id.
    #[default]
    Account,
    /// EVM alias derived from the operator's ECDSA public key.
    Key,
}

/// Wallet configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct WalletConfig {
    pub address_mode: AddressMode,
}

/// Deployment configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DeploymentConfig {
    /// Path to the hex-encoded contract bytecode.
    pub bytecode_path: String,

    /// Constructor argument: total token supply minted to the deployer.
    pub initial_supply: u64,

    /// Gas limit for the deployment transaction.
    pub gas_limit: u64,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            bytecode_path: "./contractBytecode.bin".to_string(),
            initial_supply: 100,
            gas_limit: 300_000,
        }
    }
}

/// Whether state-changing calls wait for their receipt.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransferMode {
    /// Print the transaction id and move on.
    #[default]
    FireAndForget,
    /// Wait for the receipt and fail on a non-success status.
    AwaitReceipt,
}

/// Interaction configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Tokens sent to the counterparty.
    pub transfer_amount: u64,

    /// Gas limit for calls and transactions against the contract.
    pub gas_limit: u64,

    pub transfer_mode: TransferMode,

    /// How long to wait for the Transfer event (0 = don't wait).
    pub event_timeout_secs: u64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            transfer_amount: 25,
            gas_limit: 300_000,
            transfer_mode: TransferMode::default(),
            event_timeout_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
