//! A deployed contract bound to a ledger.

use std::sync::Arc;

use alloy::dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy::json_abi::{Function, StateMutability};
use alloy::primitives::{Address, Bytes};

use crate::blockchain::ledger::Ledger;
use crate::blockchain::transaction::PendingTransaction;
use crate::blockchain::types::{ChainError, ChainResult, Receipt};
use crate::contract::abi::InterfaceDescriptor;
use crate::contract::events::{EmittedEvent, EventFilter, Subscription};

/// Interface + address + ledger. Only obtainable from a confirmed deployment.
#[derive(Clone)]
pub struct DeployedContract {
    address: Address,
    interface: Arc<InterfaceDescriptor>,
    ledger: Arc<dyn Ledger>,
    deploy_receipt: Receipt,
}

impl std::fmt::Debug for DeployedContract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeployedContract")
            .field("address", &self.address)
            .field("interface", &self.interface)
            .field("deploy_receipt", &self.deploy_receipt)
            .finish_non_exhaustive()
    }
}

impl DeployedContract {
    pub(crate) fn new(
        address: Address,
        interface: Arc<InterfaceDescriptor>,
        ledger: Arc<dyn Ledger>,
        receipt: Receipt,
    ) -> Self {
        Self {
            address,
            interface,
            ledger,
            deploy_receipt: receipt,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Receipt of the deploying transaction.
    pub fn deploy_receipt(&self) -> &Receipt {
        &self.deploy_receipt
    }

    /// Read-only call. Returns the decoded outputs in declaration order.
    pub async fn call(&self, name: &str, args: &[DynSolValue], gas_limit: u64) -> ChainResult<Vec<DynSolValue>> {
        let function = self.interface.function(name)?;
        let data = encode_call(function, args)?;

        let output = self.ledger.call(self.address, data, gas_limit).await?;
        function
            .abi_decode_output(&output)
            .map_err(|e| ChainError::Abi(format!("cannot decode {} output: {}", name, e)))
    }

    /// Submit a state-changing call. Returns once broadcast.
    pub async fn send(&self, name: &str, args: &[DynSolValue], gas_limit: u64) -> ChainResult<PendingTransaction> {
        let function = self.interface.function(name)?;
        if matches!(function.state_mutability, StateMutability::View | StateMutability::Pure) {
            return Err(ChainError::Abi(format!("{} is read-only, use call", name)));
        }
        let data = encode_call(function, args)?;

        let tx_hash = self.ledger.send(self.address, data, gas_limit).await?;
        tracing::info!(contract = %self.address, function = name, tx_hash = %tx_hash, "Transaction submitted");

        Ok(PendingTransaction::new(tx_hash, self.ledger.clone(), "send"))
    }

    /// Filter on one of this contract's events.
    pub fn filter(&self, event: &str, indexed: &[Option<DynSolValue>]) -> ChainResult<EventFilter> {
        let event = self.interface.event(event)?.clone();
        EventFilter::new(event, self.address, indexed)
    }

    /// Register a callback for the next event matching `filter`.
    pub async fn once<F>(&self, filter: EventFilter, callback: F) -> ChainResult<Subscription>
    where
        F: FnOnce(EmittedEvent) + Send + 'static,
    {
        if filter.address() != self.address {
            return Err(ChainError::Abi(format!(
                "filter is for {} not {}",
                filter.address(),
                self.address
            )));
        }
        Subscription::once(self.ledger.clone(), filter, callback).await
    }
}

fn encode_call(function: &Function, args: &[DynSolValue]) -> ChainResult<Bytes> {
    function
        .abi_encode_input(args)
        .map(Bytes::from)
        .map_err(|e| ChainError::Abi(format!("{} arguments: {}", function.name, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::memory::InMemoryLedger;
    use crate::contract::bytecode::Bytecode;
    use crate::contract::factory::ContractFactory;
    use alloy::primitives::U256;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const SENDER: Address = Address::repeat_byte(0x11);
    const ALICE: Address = Address::repeat_byte(0xa1);

    fn uint(value: u64) -> DynSolValue {
        DynSolValue::Uint(U256::from(value), 256)
    }

    async fn deploy(ledger: Arc<InMemoryLedger>) -> DeployedContract {
        let bytecode = Bytecode::parse("0x6080604052", "test").unwrap();
        ContractFactory::new(InterfaceDescriptor::token().unwrap(), bytecode, ledger)
            .deploy(&[uint(100)], 300_000)
            .await
            .unwrap()
            .wait()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_reads_do_not_create_transactions() {
        let ledger = Arc::new(InMemoryLedger::new(SENDER));
        let contract = deploy(ledger.clone()).await;
        let before = ledger.transaction_count().await;

        let symbol = contract.call("symbol", &[], 300_000).await.unwrap();
        assert_eq!(symbol, vec![DynSolValue::String("TKN".into())]);

        let balance = contract.call("balanceOf", &[DynSolValue::Address(SENDER)], 300_000).await.unwrap();
        assert_eq!(balance, vec![uint(100)]);

        assert_eq!(ledger.transaction_count().await, before);
    }

    #[tokio::test]
    async fn test_send_then_wait_moves_balance() {
        let ledger = Arc::new(InMemoryLedger::new(SENDER));
        let contract = deploy(ledger.clone()).await;

        let pending = contract
            .send("transfer", &[DynSolValue::Address(ALICE), uint(25)], 300_000)
            .await
            .unwrap();
        let receipt = pending.wait().await.unwrap();
        assert!(receipt.status.is_success());

        let alice = contract.call("balanceOf", &[DynSolValue::Address(ALICE)], 300_000).await.unwrap();
        assert_eq!(alice, vec![uint(25)]);
    }

    #[tokio::test]
    async fn test_send_rejects_view_functions() {
        let ledger = Arc::new(InMemoryLedger::new(SENDER));
        let contract = deploy(ledger).await;

        let err = contract.send("symbol", &[], 300_000).await.unwrap_err();
        assert!(matches!(err, ChainError::Abi(_)));
    }

    #[tokio::test]
    async fn test_once_fires_for_own_transfer_only() {
        let ledger = Arc::new(InMemoryLedger::new(SENDER));
        let contract = deploy(ledger.clone()).await;
        let fired = Arc::new(AtomicUsize::new(0));

        let filter = contract.filter("Transfer", &[Some(DynSolValue::Address(SENDER)), None]).unwrap();
        let counter = fired.clone();
        let subscription = contract
            .once(filter, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();

        // Someone else's transfer must not fire the listener.
        ledger
            .simulate_transfer(contract.address(), ALICE, SENDER, U256::ZERO)
            .await
            .unwrap();

        contract
            .send("transfer", &[DynSolValue::Address(ALICE), uint(25)], 300_000)
            .await
            .unwrap();
        contract
            .send("transfer", &[DynSolValue::Address(ALICE), uint(5)], 300_000)
            .await
            .unwrap();

        let event = subscription.wait(Duration::from_secs(2)).await.unwrap();
        assert_eq!(event.get("from"), Some(&DynSolValue::Address(SENDER)));
        assert_eq!(event.get("amount"), Some(&uint(25)));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_subscription_never_fires() {
        let ledger = Arc::new(InMemoryLedger::new(SENDER));
        let contract = deploy(ledger.clone()).await;
        let fired = Arc::new(AtomicUsize::new(0));

        let filter = contract.filter("Transfer", &[Some(DynSolValue::Address(SENDER))]).unwrap();
        let counter = fired.clone();
        let subscription = contract
            .once(filter, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();
        subscription.cancel();

        contract
            .send("transfer", &[DynSolValue::Address(ALICE), uint(25)], 300_000)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
