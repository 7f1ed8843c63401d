//! Shared utilities for workflow integration tests.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use hedera_token_demo::blockchain::InMemoryLedger;
use hedera_token_demo::config::DemoConfig;
use hedera_token_demo::workflow::{prepare, Prepared};

/// Anvil's first well-known private key.
pub const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Minimal creation code; the simulated ledger reads the supply from the
/// trailing constructor argument.
pub const TEST_BYTECODE: &str = "0x608060405234801561001057600080fd5b50";

/// Environment with a valid operator and counterparty.
pub fn test_env() -> HashMap<String, String> {
    env(&[
        ("SIGNER_ID", "0.0.1001"),
        ("SIGNER_PVKEY", TEST_PRIVATE_KEY),
        ("ALICE_ID", "0.0.1002"),
    ])
}

pub fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Write bytecode to a per-test temp file.
pub fn write_bytecode(tag: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("hedera_token_demo_it_{}_{}.bin", tag, uuid::Uuid::new_v4()));
    std::fs::write(&path, content).unwrap();
    path
}

/// Default config pointed at a fresh bytecode file, with a short event wait.
pub fn test_config(tag: &str) -> DemoConfig {
    let mut config = DemoConfig::default();
    config.deployment.bytecode_path = write_bytecode(tag, TEST_BYTECODE).display().to_string();
    config.interaction.event_timeout_secs = 2;
    config
}

/// Prepared run plus a simulated ledger that executes as the signing key,
/// the way the JSON-RPC relay does.
#[allow(dead_code)]
pub fn setup(tag: &str) -> (DemoConfig, Prepared, Arc<InMemoryLedger>) {
    let config = test_config(tag);
    let prepared = prepare(&config, &test_env()).unwrap();
    let ledger = Arc::new(InMemoryLedger::new(prepared.wallet.signer_address()));
    (config, prepared, ledger)
}
