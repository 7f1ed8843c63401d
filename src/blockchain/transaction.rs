//! Submitted transactions and confirmation monitoring.
//!
//! # Responsibilities
//! - Hold the id of a broadcast transaction
//! - Poll for its receipt on the ledger's cadence, bounded by a timeout
//! - Turn a non-success receipt into an error carrying that receipt
//!
//! Waiting is always an explicit caller choice: dropping a
//! [`PendingTransaction`] leaves the transaction to the network.

use std::sync::Arc;

use alloy::primitives::TxHash;
use tokio::time::{interval, timeout};

use crate::blockchain::ledger::Ledger;
use crate::blockchain::types::{ChainError, ChainResult, Receipt};
use crate::observability::metrics;

/// A broadcast transaction whose outcome is not yet known.
pub struct PendingTransaction {
    tx_hash: TxHash,
    ledger: Arc<dyn Ledger>,
    kind: &'static str,
}

impl PendingTransaction {
    pub fn new(tx_hash: TxHash, ledger: Arc<dyn Ledger>, kind: &'static str) -> Self {
        Self {
            tx_hash,
            ledger,
            kind,
        }
    }

    /// Transaction identifier, available immediately after broadcast.
    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    /// Wait for consensus. A non-success status is returned as
    /// [`ChainError::TransactionFailed`] with the receipt attached.
    pub async fn wait(self) -> ChainResult<Receipt> {
        let receipt = wait_for_receipt(self.ledger.as_ref(), self.tx_hash).await?;
        metrics::record_transaction(self.kind, receipt.status);

        if !receipt.status.is_success() {
            tracing::warn!(tx_hash = %self.tx_hash, kind = self.kind, "Transaction failed");
            return Err(ChainError::TransactionFailed(Box::new(receipt)));
        }

        tracing::debug!(tx_hash = %self.tx_hash, kind = self.kind, "Transaction confirmed");
        Ok(receipt)
    }
}

impl std::fmt::Debug for PendingTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingTransaction")
            .field("tx_hash", &self.tx_hash)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Poll until a receipt appears, whatever its status.
pub async fn wait_for_receipt(ledger: &dyn Ledger, tx_hash: TxHash) -> ChainResult<Receipt> {
    let policy = ledger.confirmation_policy();

    match timeout(policy.timeout, poll_receipt(ledger, tx_hash, policy.poll_interval)).await {
        Ok(receipt) => receipt,
        Err(_) => Err(ChainError::ConfirmationTimeout {
            tx_hash,
            secs: policy.timeout.as_secs(),
        }),
    }
}

async fn poll_receipt(
    ledger: &dyn Ledger,
    tx_hash: TxHash,
    poll_interval: std::time::Duration,
) -> ChainResult<Receipt> {
    let mut ticker = interval(poll_interval);

    loop {
        ticker.tick().await;

        match ledger.receipt(tx_hash).await? {
            Some(receipt) => return Ok(receipt),
            None => tracing::debug!(tx_hash = %tx_hash, "Transaction pending"),
        }
    }
}
