//! Event filters and one-shot subscriptions.
//!
//! A [`Subscription`] owns a background task that polls the ledger for logs
//! from the block after registration. On the first matching log it decodes
//! the event, runs the callback once, hands the event to the handle and
//! exits. Dropping or cancelling the handle stops the task; an event that
//! arrives afterwards is never delivered.

use std::sync::Arc;
use std::time::Duration;

use alloy::dyn_abi::{DynSolValue, EventExt, Specifier};
use alloy::json_abi::Event;
use alloy::primitives::{keccak256, Address, TxHash, B256};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::interval;

use crate::blockchain::ledger::{Ledger, LedgerLog, LogQuery};
use crate::blockchain::types::{ChainError, ChainResult};
use crate::observability::metrics;

/// Matches one event of one contract, optionally pinning indexed params.
#[derive(Debug, Clone)]
pub struct EventFilter {
    event: Event,
    address: Address,
    topics: Vec<Option<B256>>,
}

impl EventFilter {
    /// Build a filter. `indexed[i]` pins the i-th indexed parameter; `None`
    /// or a missing entry matches anything.
    pub fn new(event: Event, address: Address, indexed: &[Option<DynSolValue>]) -> ChainResult<Self> {
        let indexed_params: Vec<_> = event.inputs.iter().filter(|p| p.indexed).collect();
        if indexed.len() > indexed_params.len() {
            return Err(ChainError::Abi(format!(
                "event {} has {} indexed parameters, {} given",
                event.name,
                indexed_params.len(),
                indexed.len()
            )));
        }

        let mut topics = Vec::with_capacity(1 + indexed.len());
        topics.push((!event.anonymous).then(|| event.selector()));

        for (param, value) in indexed_params.iter().zip(indexed) {
            let Some(value) = value else {
                topics.push(None);
                continue;
            };

            let ty = param
                .resolve()
                .map_err(|e| ChainError::Abi(format!("parameter {}: {}", param.name, e)))?;
            if !ty.matches(value) {
                return Err(ChainError::Abi(format!(
                    "value for {} does not match type {}",
                    param.name, param.ty
                )));
            }
            topics.push(Some(topic_for(value)?));
        }

        Ok(Self { event, address, topics })
    }

    pub fn event_name(&self) -> &str {
        &self.event.name
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Ledger query for logs from `from_block` onwards.
    pub fn query(&self, from_block: u64) -> LogQuery {
        LogQuery {
            address: self.address,
            topics: self.topics.clone(),
            from_block,
        }
    }

    pub fn matches(&self, log: &LedgerLog) -> bool {
        self.query(0).matches(log)
    }

    /// Decode a log into named values in declaration order.
    pub fn decode(&self, log: &LedgerLog) -> ChainResult<EmittedEvent> {
        let decoded = self
            .event
            .decode_log_parts(log.topics.iter().copied(), &log.data)
            .map_err(|e| ChainError::Abi(format!("cannot decode {}: {}", self.event.name, e)))?;

        let mut indexed = decoded.indexed.into_iter();
        let mut body = decoded.body.into_iter();
        let mut params = Vec::with_capacity(self.event.inputs.len());
        for input in &self.event.inputs {
            let value = if input.indexed { indexed.next() } else { body.next() };
            let value = value.ok_or_else(|| {
                ChainError::Abi(format!("missing value for {} in {}", input.name, self.event.name))
            })?;
            params.push((input.name.clone(), value));
        }

        Ok(EmittedEvent {
            name: self.event.name.clone(),
            params,
            block_number: log.block_number,
            tx_hash: log.tx_hash,
        })
    }
}

/// Topic encoding of an indexed value.
fn topic_for(value: &DynSolValue) -> ChainResult<B256> {
    match value {
        DynSolValue::String(s) => Ok(keccak256(s.as_bytes())),
        DynSolValue::Bytes(b) => Ok(keccak256(b)),
        other => other
            .as_word()
            .ok_or_else(|| ChainError::Abi("indexed arrays and tuples cannot be filtered".to_string())),
    }
}

/// A decoded contract event.
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedEvent {
    pub name: String,
    /// Parameters in declaration order.
    pub params: Vec<(String, DynSolValue)>,
    pub block_number: Option<u64>,
    pub tx_hash: Option<TxHash>,
}

impl EmittedEvent {
    pub fn get(&self, name: &str) -> Option<&DynSolValue> {
        self.params.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// Handle to a one-shot event listener.
pub struct Subscription {
    event: String,
    fired: Option<oneshot::Receiver<EmittedEvent>>,
    task: JoinHandle<()>,
}

impl Subscription {
    /// Register a listener starting after the current block.
    pub async fn once<F>(
        ledger: Arc<dyn Ledger>,
        filter: EventFilter,
        callback: F,
    ) -> ChainResult<Self>
    where
        F: FnOnce(EmittedEvent) + Send + 'static,
    {
        let from_block = ledger.block_number().await? + 1;
        let poll_interval = ledger.confirmation_policy().poll_interval;
        let event = filter.event_name().to_string();
        let (tx, rx) = oneshot::channel();

        tracing::debug!(event = %event, contract = %filter.address(), from_block, "Subscription registered");

        let task = tokio::spawn(poll_for_event(ledger, filter, from_block, poll_interval, callback, tx));

        Ok(Self {
            event,
            fired: Some(rx),
            task,
        })
    }

    /// Block until the first match, or give up after `timeout`.
    ///
    /// The listener is stopped either way.
    pub async fn wait(mut self, timeout: Duration) -> Option<EmittedEvent> {
        let rx = self.fired.take()?;
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(event)) => Some(event),
            Ok(Err(_)) => None,
            Err(_) => {
                tracing::debug!(event = %self.event, ?timeout, "Subscription timed out");
                None
            }
        }
    }

    /// Stop listening without waiting.
    pub fn cancel(self) {
        tracing::debug!(event = %self.event, "Subscription cancelled");
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("event", &self.event)
            .field("finished", &self.task.is_finished())
            .finish()
    }
}

async fn poll_for_event<F>(
    ledger: Arc<dyn Ledger>,
    filter: EventFilter,
    mut from_block: u64,
    poll_interval: Duration,
    callback: F,
    fired: oneshot::Sender<EmittedEvent>,
) where
    F: FnOnce(EmittedEvent) + Send + 'static,
{
    let mut ticker = interval(poll_interval);

    loop {
        ticker.tick().await;

        // Logs up to the head seen here are covered by the query below.
        let head = match ledger.block_number().await {
            Ok(head) => head,
            Err(e) => {
                tracing::warn!(event = filter.event_name(), error = %e, "Event poll failed");
                continue;
            }
        };

        let logs = match ledger.logs(&filter.query(from_block)).await {
            Ok(logs) => logs,
            Err(e) => {
                tracing::warn!(event = filter.event_name(), error = %e, "Event poll failed");
                continue;
            }
        };

        for log in logs.iter().filter(|log| filter.matches(log)) {
            match filter.decode(log) {
                Ok(event) => {
                    metrics::record_event_delivered(&event.name);
                    callback(event.clone());
                    let _ = fired.send(event);
                    return;
                }
                Err(e) => tracing::warn!(error = %e, "Skipping undecodable log"),
            }
        }

        from_block = from_block.max(head + 1);
    }
}
