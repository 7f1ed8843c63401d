//! Operator identity resolution.
//!
//! # Data Flow
//! ```text
//! Environment Variables (SIGNER_ID, SIGNER_PVKEY, ALICE_ID)
//!     → credentials.rs (collect, report all problems)
//!     → account.rs (shard.realm.num → long-zero address)
//!     → key.rs (raw / DER hex → ECDSA signer)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys

pub mod account;
pub mod credentials;
pub mod key;

use thiserror::Error;

pub use account::AccountId;
pub use credentials::{EnvSource, OperatorCredentials, ProcessEnv};
pub use key::OperatorKey;

/// Errors resolving the operator identity.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Environment variable {0} not set")]
    MissingVar(&'static str),

    #[error("Invalid account id '{value}': {reason}")]
    InvalidAccountId { value: String, reason: String },

    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Unsupported {0} key: an ECDSA (secp256k1) key is required")]
    UnsupportedKey(&'static str),

    #[error("{}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<IdentityError>),
}
