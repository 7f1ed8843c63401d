//! Top-level error for a demo run.

use thiserror::Error;

use crate::blockchain::types::ChainError;
use crate::config::ConfigError;
use crate::contract::bytecode::BytecodeError;
use crate::identity::IdentityError;

/// Any failure that aborts the workflow. Nothing is retried.
#[derive(Debug, Error)]
pub enum DemoError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Bytecode error: {0}")]
    Bytecode(#[from] BytecodeError),

    #[error(transparent)]
    Chain(#[from] ChainError),
}

impl DemoError {
    /// Whether the failure happened before any network access.
    pub fn is_local(&self) -> bool {
        !matches!(self, DemoError::Chain(_))
    }
}
