//! Operator credentials resolved from the environment.
//!
//! Reads `SIGNER_ID`, `SIGNER_PVKEY` and `ALICE_ID`. Every missing or
//! malformed variable is reported at once; nothing here touches the network.

use std::collections::HashMap;

use alloy::primitives::Address;

use crate::identity::account::AccountId;
use crate::identity::key::OperatorKey;
use crate::identity::IdentityError;

/// Environment variable holding the operator account id.
pub const SIGNER_ID_ENV_VAR: &str = "SIGNER_ID";
/// Environment variable holding the operator private key.
pub const SIGNER_KEY_ENV_VAR: &str = "SIGNER_PVKEY";
/// Environment variable holding the counterparty account id.
pub const COUNTERPARTY_ID_ENV_VAR: &str = "ALICE_ID";

/// Source of environment values.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// The operator identity plus the account receiving tokens.
#[derive(Debug, Clone)]
pub struct OperatorCredentials {
    pub operator_id: AccountId,
    pub operator_key: OperatorKey,
    pub counterparty_id: AccountId,
}

impl OperatorCredentials {
    /// Resolve credentials from an environment source.
    pub fn from_env(env: &impl EnvSource) -> Result<Self, IdentityError> {
        let mut errors = Vec::new();

        let operator_id = read_var(env, SIGNER_ID_ENV_VAR, &mut errors)
            .and_then(|v| collect(v.parse::<AccountId>(), &mut errors));
        let operator_key = read_var(env, SIGNER_KEY_ENV_VAR, &mut errors)
            .and_then(|v| collect(OperatorKey::parse(&v), &mut errors));
        let counterparty_id = read_var(env, COUNTERPARTY_ID_ENV_VAR, &mut errors)
            .and_then(|v| collect(v.parse::<AccountId>(), &mut errors));

        match (operator_id, operator_key, counterparty_id) {
            (Some(operator_id), Some(operator_key), Some(counterparty_id)) if errors.is_empty() => {
                Ok(Self {
                    operator_id,
                    operator_key,
                    counterparty_id,
                })
            }
            _ if errors.len() == 1 => Err(errors.remove(0)),
            _ => Err(IdentityError::Multiple(errors)),
        }
    }

    /// Long-zero address of the operator account.
    pub fn operator_address(&self) -> Address {
        self.operator_id.to_evm_address()
    }

    /// Long-zero address of the counterparty account.
    pub fn counterparty_address(&self) -> Address {
        self.counterparty_id.to_evm_address()
    }
}

fn read_var(env: &impl EnvSource, name: &'static str, errors: &mut Vec<IdentityError>) -> Option<String> {
    match env.get(name).filter(|v| !v.trim().is_empty()) {
        Some(value) => Some(value),
        None => {
            errors.push(IdentityError::MissingVar(name));
            None
        }
    }
}

fn collect<T>(result: Result<T, IdentityError>, errors: &mut Vec<IdentityError>) -> Option<T> {
    result.map_err(|e| errors.push(e)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_resolves_complete_environment() {
        let env = env(&[
            (SIGNER_ID_ENV_VAR, "0.0.1001"),
            (SIGNER_KEY_ENV_VAR, TEST_PRIVATE_KEY),
            (COUNTERPARTY_ID_ENV_VAR, "0.0.1002"),
        ]);
        let creds = OperatorCredentials::from_env(&env).unwrap();
        assert_eq!(creds.operator_id, AccountId::new(0, 0, 1001));
        assert_eq!(creds.counterparty_id, AccountId::new(0, 0, 1002));
        assert_eq!(creds.operator_address(), AccountId::new(0, 0, 1001).to_evm_address());
    }

    #[test]
    fn test_single_missing_variable() {
        let env = env(&[
            (SIGNER_ID_ENV_VAR, "0.0.1001"),
            (SIGNER_KEY_ENV_VAR, TEST_PRIVATE_KEY),
        ]);
        let err = OperatorCredentials::from_env(&env).unwrap_err();
        assert!(matches!(err, IdentityError::MissingVar(COUNTERPARTY_ID_ENV_VAR)));
    }

    #[test]
    fn test_reports_every_problem() {
        let env = env(&[(SIGNER_ID_ENV_VAR, "not-an-id"), (COUNTERPARTY_ID_ENV_VAR, " ")]);
        let err = OperatorCredentials::from_env(&env).unwrap_err();
        match err {
            IdentityError::Multiple(errors) => assert_eq!(errors.len(), 3),
            other => panic!("expected multiple errors, got {other:?}"),
        }
    }
}
