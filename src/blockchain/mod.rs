//! Ledger integration subsystem.
//!
//! # Data Flow
//! ```text
//! OperatorCredentials (from environment)
//!     → wallet.rs (signing identity, address, public key)
//!     → client.rs (JSON-RPC relay with timeouts)   ┐
//!       memory.rs (simulated token network)        ┴→ ledger.rs (Ledger trait)
//!     → transaction.rs (pending tx, receipt polling)
//! ```
//!
//! # Security Constraints
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod ledger;
pub mod memory;
pub mod transaction;
pub mod types;
pub mod units;
pub mod wallet;

pub use client::RpcLedger;
pub use ledger::{Ledger, LedgerLog, LogQuery};
pub use memory::InMemoryLedger;
pub use transaction::PendingTransaction;
pub use types::{ChainError, ChainId, ChainResult, ConfirmationPolicy, Receipt, ResolvedNetwork, TxStatus};
pub use units::Tinybar;
pub use wallet::Wallet;
