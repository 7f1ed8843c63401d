//! Contract deployment.
//!
//! Deployment is a typestate progression:
//! ```text
//! ContractFactory::deploy  →  PendingDeployment  →  wait()  →  DeployedContract
//!   (unsubmitted)               (broadcast)                     (confirmed)
//!                                                  └→ Err(TransactionFailed | DeploymentFailed)
//! ```
//! A [`DeployedContract`] can only come out of a successful receipt, so
//! holding one means the address is real.

use std::sync::Arc;

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::TxHash;

use crate::blockchain::ledger::Ledger;
use crate::blockchain::transaction::PendingTransaction;
use crate::blockchain::types::{ChainError, ChainResult};
use crate::contract::abi::InterfaceDescriptor;
use crate::contract::bytecode::Bytecode;
use crate::contract::instance::DeployedContract;

/// Pairs an interface with creation code and a ledger to deploy through.
pub struct ContractFactory {
    interface: Arc<InterfaceDescriptor>,
    bytecode: Bytecode,
    ledger: Arc<dyn Ledger>,
}

impl ContractFactory {
    pub fn new(interface: InterfaceDescriptor, bytecode: Bytecode, ledger: Arc<dyn Ledger>) -> Self {
        Self {
            interface: Arc::new(interface),
            bytecode,
            ledger,
        }
    }

    /// Submit the deployment. Returns as soon as the transaction is broadcast.
    pub async fn deploy(&self, args: &[DynSolValue], gas_limit: u64) -> ChainResult<PendingDeployment> {
        let encoded_args = self.interface.encode_constructor(args)?;
        let code = self.bytecode.with_constructor_args(&encoded_args);

        let tx_hash = self.ledger.deploy(code, gas_limit).await?;
        tracing::info!(tx_hash = %tx_hash, gas_limit, "Deployment submitted");

        Ok(PendingDeployment {
            transaction: PendingTransaction::new(tx_hash, self.ledger.clone(), "deploy"),
            interface: self.interface.clone(),
            ledger: self.ledger.clone(),
        })
    }
}

/// A broadcast deployment awaiting consensus.
pub struct PendingDeployment {
    transaction: PendingTransaction,
    interface: Arc<InterfaceDescriptor>,
    ledger: Arc<dyn Ledger>,
}

impl std::fmt::Debug for PendingDeployment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingDeployment")
            .field("transaction", &self.transaction)
            .field("interface", &self.interface)
            .finish_non_exhaustive()
    }
}

impl PendingDeployment {
    pub fn tx_hash(&self) -> TxHash {
        self.transaction.tx_hash()
    }

    /// Wait for the receipt. Non-success fails with the receipt attached.
    pub async fn wait(self) -> ChainResult<DeployedContract> {
        let receipt = self.transaction.wait().await?;

        let address = receipt.contract_address.ok_or_else(|| {
            ChainError::DeploymentFailed(format!(
                "receipt for {} has no contract address",
                receipt.tx_hash
            ))
        })?;

        tracing::info!(contract = %address, status = %receipt.status, "Contract deployed");
        Ok(DeployedContract::new(address, self.interface, self.ledger, receipt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::memory::InMemoryLedger;
    use crate::blockchain::types::TxStatus;
    use alloy::primitives::{Address, U256};

    const SENDER: Address = Address::repeat_byte(0x11);

    fn factory(ledger: Arc<InMemoryLedger>) -> ContractFactory {
        let bytecode = Bytecode::parse("0x6080604052", "test").unwrap();
        ContractFactory::new(InterfaceDescriptor::token().unwrap(), bytecode, ledger)
    }

    #[tokio::test]
    async fn test_deploy_and_wait() {
        let ledger = Arc::new(InMemoryLedger::new(SENDER));
        let pending = factory(ledger.clone())
            .deploy(&[DynSolValue::Uint(U256::from(100), 256)], 300_000)
            .await
            .unwrap();
        let tx_hash = pending.tx_hash();

        let contract = pending.wait().await.unwrap();
        assert_eq!(contract.address(), SENDER.create(0));
        assert_eq!(contract.deploy_receipt().tx_hash, tx_hash);
        assert_eq!(contract.deploy_receipt().status, TxStatus::Success);
    }

    #[tokio::test]
    async fn test_failed_deploy_never_yields_contract() {
        let ledger = Arc::new(InMemoryLedger::new(SENDER).with_deploy_status(TxStatus::Reverted));
        let pending = factory(ledger)
            .deploy(&[DynSolValue::Uint(U256::from(100), 256)], 300_000)
            .await
            .unwrap();

        let err = pending.wait().await.unwrap_err();
        let receipt = err.receipt().expect("receipt attached");
        assert_eq!(receipt.status, TxStatus::Reverted);
    }

    #[tokio::test]
    async fn test_bad_constructor_args_are_not_submitted() {
        let ledger = Arc::new(InMemoryLedger::new(SENDER));
        let result = factory(ledger.clone())
            .deploy(&[DynSolValue::String("100".into())], 300_000)
            .await;

        assert!(matches!(result, Err(ChainError::Abi(_))));
        assert_eq!(ledger.transaction_count().await, 0);
    }
}
