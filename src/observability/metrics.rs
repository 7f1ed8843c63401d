//! Metrics collection.
//!
//! # Metrics
//! - `ledger_rpc_requests_total` (counter): RPC requests by method, outcome
//! - `ledger_rpc_duration_seconds` (histogram): RPC latency by method
//! - `ledger_transactions_total` (counter): confirmed transactions by kind, status
//! - `ledger_events_delivered_total` (counter): subscription callbacks by event

use std::time::Duration;

use metrics::{counter, histogram};

use crate::blockchain::types::TxStatus;

/// Record one RPC request.
pub fn record_rpc_call(method: &'static str, success: bool, elapsed: Duration) {
    let outcome = if success { "ok" } else { "error" };
    counter!("ledger_rpc_requests_total", "method" => method, "outcome" => outcome).increment(1);
    histogram!("ledger_rpc_duration_seconds", "method" => method).record(elapsed.as_secs_f64());
}

/// Record the final status of a waited-on transaction.
pub fn record_transaction(kind: &'static str, status: TxStatus) {
    let status = if status.is_success() { "success" } else { "reverted" };
    counter!("ledger_transactions_total", "kind" => kind, "status" => status).increment(1);
}

/// Record a subscription callback invocation.
pub fn record_event_delivered(event: &str) {
    counter!("ledger_events_delivered_total", "event" => event.to_string()).increment(1);
}
