//! Wallet: the operator's signing identity.
//!
//! # Security
//! - Private keys are loaded ONLY from environment variables
//! - Keys are never logged or serialized

use alloy::primitives::{hex, Address};
use alloy::signers::local::PrivateKeySigner;

use crate::blockchain::ledger::Ledger;
use crate::blockchain::types::ChainResult;
use crate::blockchain::units::Tinybar;
use crate::config::AddressMode;
use crate::identity::{AccountId, OperatorKey};

/// Signing identity bound to an operator account.
#[derive(Debug, Clone)]
pub struct Wallet {
    account_id: AccountId,
    signer: PrivateKeySigner,
    address_mode: AddressMode,
}

impl Wallet {
    /// Create a wallet for an account and its ECDSA key.
    pub fn new(account_id: AccountId, key: OperatorKey, address_mode: AddressMode) -> Self {
        let signer = key.into_signer();

        tracing::info!(
            account = %account_id,
            signer_address = %signer.address(),
            ?address_mode,
            "Wallet initialized"
        );

        Self {
            account_id,
            signer,
            address_mode,
        }
    }

    /// The address other parties (and the token contract) see for this wallet.
    pub fn address(&self) -> Address {
        match self.address_mode {
            AddressMode::Account => self.account_address(),
            AddressMode::Key => self.signer_address(),
        }
    }

    /// Long-zero address of the operator account.
    pub fn account_address(&self) -> Address {
        self.account_id.to_evm_address()
    }

    /// EVM address of the ECDSA key, used as the transaction sender.
    pub fn signer_address(&self) -> Address {
        self.signer.address()
    }

    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    /// Uncompressed SEC1 public key as `0x04…` hex.
    pub fn public_key(&self) -> String {
        let point = self.signer.credential().verifying_key().to_encoded_point(false);
        hex::encode_prefixed(point.as_bytes())
    }

    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }

    /// Native balance of this wallet's address.
    pub async fn balance(&self, ledger: &dyn Ledger) -> ChainResult<Tinybar> {
        ledger.balance(self.address()).await
    }
}
