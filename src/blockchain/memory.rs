//! Simulated ledger hosting a fixed-supply token.
//!
//! # Behaviour
//! - Every submitted transaction is mined into its own block immediately
//! - Contract creation treats the trailing 32 bytes of the code as the
//!   `uint256 totalSupply` constructor argument and mints it to the sender
//! - The hosted token answers `balanceOf`, `decimals`, `symbol` and
//!   `transfer`, emitting `Transfer` logs like an ERC-20
//! - Anything else reverts
//!
//! Used by `--dry-run` and by the tests. State is lost when dropped.

use std::collections::HashMap;
use std::time::Duration;

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{keccak256, Address, Bytes, TxHash, U256};
use alloy::sol;
use alloy::sol_types::{SolCall, SolEvent};
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::blockchain::ledger::{Ledger, LedgerLog, LogQuery};
use crate::blockchain::types::{ChainError, ChainResult, ConfirmationPolicy, Receipt, TxStatus};
use crate::blockchain::units::Tinybar;

sol! {
    /// Token surface served by the simulated network.
    interface IToken {
        function balanceOf(address owner) external view returns (uint256);
        function decimals() external view returns (uint8);
        function symbol() external view returns (string);
        function transfer(address to, uint256 amount) external returns (bool);

        event Transfer(address indexed from, address indexed to, uint256 amount);
    }
}

/// Simulated chain ID, matching a local Hedera node.
pub const IN_MEMORY_CHAIN_ID: u64 = 298;

/// Symbol and decimals reported by every simulated token.
pub const TOKEN_SYMBOL: &str = "TKN";
pub const TOKEN_DECIMALS: u8 = 0;

/// Gas charged by the cheapest transaction.
const INTRINSIC_GAS: u64 = 21_000;

#[derive(Debug, Default)]
struct TokenState {
    balances: HashMap<Address, U256>,
}

impl TokenState {
    fn balance_of(&self, owner: &Address) -> U256 {
        self.balances.get(owner).copied().unwrap_or_default()
    }
}

#[derive(Debug, Default)]
struct State {
    block: u64,
    nonces: HashMap<Address, u64>,
    native: HashMap<Address, Tinybar>,
    tokens: HashMap<Address, TokenState>,
    receipts: HashMap<TxHash, Receipt>,
    logs: Vec<LedgerLog>,
    transactions: u64,
    calls: u64,
}

impl State {
    /// Allocate a transaction hash and block for `sender`.
    fn next_transaction(&mut self, sender: Address) -> (TxHash, u64, u64) {
        let nonce = self.nonces.entry(sender).or_insert(0);
        let current = *nonce;
        *nonce += 1;

        self.block += 1;
        self.transactions += 1;

        let mut preimage = sender.to_vec();
        preimage.extend_from_slice(&current.to_be_bytes());
        (keccak256(preimage), current, self.block)
    }

    fn record(&mut self, tx_hash: TxHash, status: TxStatus, contract_address: Option<Address>, block: u64, gas_used: u64) {
        self.receipts.insert(
            tx_hash,
            Receipt {
                tx_hash,
                status,
                contract_address,
                block_number: Some(block),
                gas_used,
            },
        );
    }

    fn transfer(
        &mut self,
        contract: Address,
        from: Address,
        to: Address,
        amount: U256,
        tx_hash: TxHash,
        block: u64,
    ) -> bool {
        let Some(token) = self.tokens.get_mut(&contract) else {
            return false;
        };
        let from_balance = token.balance_of(&from);
        if from_balance < amount {
            return false;
        }
        token.balances.insert(from, from_balance - amount);
        let to_balance = token.balance_of(&to);
        token.balances.insert(to, to_balance + amount);

        self.logs.push(transfer_log(contract, from, to, amount, tx_hash, block));
        true
    }
}

fn transfer_log(contract: Address, from: Address, to: Address, amount: U256, tx_hash: TxHash, block: u64) -> LedgerLog {
    LedgerLog {
        address: contract,
        topics: vec![
            IToken::Transfer::SIGNATURE_HASH,
            from.into_word(),
            to.into_word(),
        ],
        data: Bytes::from(amount.to_be_bytes::<32>().to_vec()),
        block_number: Some(block),
        tx_hash: Some(tx_hash),
    }
}

fn encode_return(value: DynSolValue) -> Bytes {
    Bytes::from(DynSolValue::Tuple(vec![value]).abi_encode_params())
}

/// In-memory ledger with a single signing account.
#[derive(Debug)]
pub struct InMemoryLedger {
    sender: Address,
    deploy_status: TxStatus,
    policy: ConfirmationPolicy,
    state: RwLock<State>,
}

impl InMemoryLedger {
    /// Create a ledger whose transactions are sent by `sender`.
    pub fn new(sender: Address) -> Self {
        Self {
            sender,
            deploy_status: TxStatus::Success,
            policy: ConfirmationPolicy {
                poll_interval: Duration::from_millis(10),
                timeout: Duration::from_secs(5),
            },
            state: RwLock::new(State::default()),
        }
    }

    /// Outcome every contract creation will have.
    pub fn with_deploy_status(mut self, status: TxStatus) -> Self {
        self.deploy_status = status;
        self
    }

    pub fn with_balance(mut self, address: Address, balance: Tinybar) -> Self {
        self.state.get_mut().native.insert(address, balance);
        self
    }

    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.policy.timeout = timeout;
        self
    }

    /// Number of transactions mined so far.
    pub async fn transaction_count(&self) -> u64 {
        self.state.read().await.transactions
    }

    /// Number of read-only calls served so far.
    pub async fn call_count(&self) -> u64 {
        self.state.read().await.calls
    }

    /// Token balance held by `owner` in the token at `contract`.
    pub async fn token_balance(&self, contract: Address, owner: Address) -> Option<U256> {
        let state = self.state.read().await;
        state.tokens.get(&contract).map(|t| t.balance_of(&owner))
    }

    /// Mine a token transfer on behalf of another account.
    pub async fn simulate_transfer(
        &self,
        contract: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> ChainResult<TxHash> {
        let mut state = self.state.write().await;
        let (tx_hash, _, block) = state.next_transaction(from);
        let ok = state.transfer(contract, from, to, amount, tx_hash, block);
        let status = if ok { TxStatus::Success } else { TxStatus::Reverted };
        state.record(tx_hash, status, None, block, INTRINSIC_GAS);
        Ok(tx_hash)
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    fn chain_id(&self) -> u64 {
        IN_MEMORY_CHAIN_ID
    }

    fn sender(&self) -> Address {
        self.sender
    }

    fn confirmation_policy(&self) -> ConfirmationPolicy {
        self.policy
    }

    async fn balance(&self, address: Address) -> ChainResult<Tinybar> {
        let state = self.state.read().await;
        Ok(state.native.get(&address).copied().unwrap_or_default())
    }

    async fn block_number(&self) -> ChainResult<u64> {
        Ok(self.state.read().await.block)
    }

    async fn deploy(&self, code: Bytes, gas_limit: u64) -> ChainResult<TxHash> {
        let mut state = self.state.write().await;
        let (tx_hash, nonce, block) = state.next_transaction(self.sender);

        let supply = (code.len() > 32).then(|| U256::from_be_slice(&code[code.len() - 32..]));
        let succeeded = gas_limit >= INTRINSIC_GAS && self.deploy_status.is_success();

        match supply {
            Some(supply) if succeeded => {
                let contract = self.sender.create(nonce);
                let mut token = TokenState::default();
                token.balances.insert(self.sender, supply);
                state.tokens.insert(contract, token);
                state
                    .logs
                    .push(transfer_log(contract, Address::ZERO, self.sender, supply, tx_hash, block));
                state.record(tx_hash, TxStatus::Success, Some(contract), block, gas_limit.min(250_000));
                tracing::debug!(contract = %contract, supply = %supply, "Simulated token deployed");
            }
            _ => state.record(tx_hash, TxStatus::Reverted, None, block, gas_limit),
        }

        Ok(tx_hash)
    }

    async fn send(&self, to: Address, data: Bytes, gas_limit: u64) -> ChainResult<TxHash> {
        let mut state = self.state.write().await;
        let (tx_hash, _, block) = state.next_transaction(self.sender);

        let transferred = gas_limit >= INTRINSIC_GAS
            && data.len() >= 4
            && data[..4] == IToken::transferCall::SELECTOR
            && match IToken::transferCall::abi_decode(&data) {
                Ok(call) => state.transfer(to, self.sender, call.to, call.amount, tx_hash, block),
                Err(_) => false,
            };

        let status = if transferred { TxStatus::Success } else { TxStatus::Reverted };
        state.record(tx_hash, status, None, block, gas_limit.min(INTRINSIC_GAS * 2));
        Ok(tx_hash)
    }

    async fn call(&self, to: Address, data: Bytes, _gas_limit: u64) -> ChainResult<Bytes> {
        let mut state = self.state.write().await;
        state.calls += 1;

        let token = state
            .tokens
            .get(&to)
            .ok_or_else(|| ChainError::CallFailed(format!("no contract at {}", to)))?;
        if data.len() < 4 {
            return Err(ChainError::CallFailed("execution reverted: missing selector".to_string()));
        }

        let selector: [u8; 4] = [data[0], data[1], data[2], data[3]];
        let output = if selector == IToken::balanceOfCall::SELECTOR {
            let call = IToken::balanceOfCall::abi_decode(&data)
                .map_err(|e| ChainError::CallFailed(format!("execution reverted: {}", e)))?;
            encode_return(DynSolValue::Uint(token.balance_of(&call.owner), 256))
        } else if selector == IToken::decimalsCall::SELECTOR {
            encode_return(DynSolValue::Uint(U256::from(TOKEN_DECIMALS), 8))
        } else if selector == IToken::symbolCall::SELECTOR {
            encode_return(DynSolValue::String(TOKEN_SYMBOL.to_string()))
        } else if selector == IToken::transferCall::SELECTOR {
            let call = IToken::transferCall::abi_decode(&data)
                .map_err(|e| ChainError::CallFailed(format!("execution reverted: {}", e)))?;
            encode_return(DynSolValue::Bool(token.balance_of(&self.sender) >= call.amount))
        } else {
            return Err(ChainError::CallFailed("execution reverted: unknown selector".to_string()));
        };

        Ok(output)
    }

    async fn receipt(&self, tx_hash: TxHash) -> ChainResult<Option<Receipt>> {
        Ok(self.state.read().await.receipts.get(&tx_hash).cloned())
    }

    async fn logs(&self, query: &LogQuery) -> ChainResult<Vec<LedgerLog>> {
        let state = self.state.read().await;
        Ok(state.logs.iter().filter(|log| query.matches(log)).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENDER: Address = Address::repeat_byte(0x11);
    const ALICE: Address = Address::repeat_byte(0xa1);

    fn deploy_code(supply: u64) -> Bytes {
        let mut code = vec![0x60, 0x80, 0x60, 0x40];
        code.extend_from_slice(&U256::from(supply).to_be_bytes::<32>());
        Bytes::from(code)
    }

    async fn deployed(ledger: &InMemoryLedger) -> Address {
        let tx = ledger.deploy(deploy_code(100), 300_000).await.unwrap();
        ledger.receipt(tx).await.unwrap().unwrap().contract_address.unwrap()
    }

    #[tokio::test]
    async fn test_deploy_mints_supply_to_sender() {
        let ledger = InMemoryLedger::new(SENDER);
        let contract = deployed(&ledger).await;

        assert_eq!(contract, SENDER.create(0));
        assert_eq!(ledger.token_balance(contract, SENDER).await, Some(U256::from(100)));
        assert_eq!(ledger.block_number().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_deploy_has_no_contract() {
        let ledger = InMemoryLedger::new(SENDER).with_deploy_status(TxStatus::Reverted);
        let tx = ledger.deploy(deploy_code(100), 300_000).await.unwrap();
        let receipt = ledger.receipt(tx).await.unwrap().unwrap();

        assert_eq!(receipt.status, TxStatus::Reverted);
        assert!(receipt.contract_address.is_none());
    }

    #[tokio::test]
    async fn test_transfer_moves_balance_and_logs() {
        let ledger = InMemoryLedger::new(SENDER);
        let contract = deployed(&ledger).await;

        let data = IToken::transferCall { to: ALICE, amount: U256::from(25) }.abi_encode();
        let tx = ledger.send(contract, data.into(), 300_000).await.unwrap();

        assert_eq!(ledger.receipt(tx).await.unwrap().unwrap().status, TxStatus::Success);
        assert_eq!(ledger.token_balance(contract, SENDER).await, Some(U256::from(75)));
        assert_eq!(ledger.token_balance(contract, ALICE).await, Some(U256::from(25)));

        let query = LogQuery {
            address: contract,
            topics: vec![Some(IToken::Transfer::SIGNATURE_HASH), Some(SENDER.into_word())],
            from_block: 0,
        };
        assert_eq!(ledger.logs(&query).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_overdrawn_transfer_reverts() {
        let ledger = InMemoryLedger::new(SENDER);
        let contract = deployed(&ledger).await;

        let data = IToken::transferCall { to: ALICE, amount: U256::from(101) }.abi_encode();
        let tx = ledger.send(contract, data.into(), 300_000).await.unwrap();

        assert_eq!(ledger.receipt(tx).await.unwrap().unwrap().status, TxStatus::Reverted);
        assert_eq!(ledger.token_balance(contract, SENDER).await, Some(U256::from(100)));
    }

    #[tokio::test]
    async fn test_calls_do_not_mine() {
        let ledger = InMemoryLedger::new(SENDER);
        let contract = deployed(&ledger).await;
        let before = ledger.transaction_count().await;

        let data: Bytes = IToken::balanceOfCall { owner: SENDER }.abi_encode().into();
        let first = ledger.call(contract, data.clone(), 300_000).await.unwrap();
        let second = ledger.call(contract, data, 300_000).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(ledger.transaction_count().await, before);
        assert_eq!(ledger.call_count().await, 2);
    }

    #[tokio::test]
    async fn test_native_balances_start_empty() {
        let ledger = InMemoryLedger::new(SENDER).with_balance(ALICE, Tinybar::from_tinybars(500));

        assert_eq!(ledger.balance(SENDER).await.unwrap(), Tinybar::default());
        assert_eq!(ledger.balance(ALICE).await.unwrap(), Tinybar::from_tinybars(500));
        assert_eq!(ledger.sender(), SENDER);
    }

    #[tokio::test]
    async fn test_call_without_contract_fails() {
        let ledger = InMemoryLedger::new(SENDER);
        let result = ledger.call(ALICE, Bytes::from(vec![0u8; 4]), 300_000).await;
        assert!(matches!(result, Err(ChainError::CallFailed(_))));
    }
}
