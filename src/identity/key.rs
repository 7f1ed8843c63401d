//! Operator private key parsing.
//!
//! # Security
//! - Keys are never logged; `Debug` is redacted
//! - Only ECDSA (secp256k1) keys can sign EVM transactions

use std::fmt;

use alloy::primitives::hex;
use alloy::signers::local::PrivateKeySigner;

use crate::identity::IdentityError;

/// DER prefix of a PKCS#8 ECDSA secp256k1 private key.
const ECDSA_PKCS8_PREFIX: &str = "3030020100300706052b8104000a04220420";
/// DER prefix of a SEC1 ECDSA private key.
const ECDSA_SEC1_PREFIX: &str = "302e0201010420";
/// DER prefix of a PKCS#8 ED25519 private key.
const ED25519_PKCS8_PREFIX: &str = "302e020100300506032b657004220420";

/// A parsed ECDSA operator key.
#[derive(Clone)]
pub struct OperatorKey {
    signer: PrivateKeySigner,
}

impl OperatorKey {
    /// Parse a key given as raw 32-byte hex or as DER-encoded hex.
    ///
    /// Raw 32-byte keys are assumed to be secp256k1.
    pub fn parse(input: &str) -> Result<Self, IdentityError> {
        let trimmed = input.trim();
        let key_hex = trimmed.strip_prefix("0x").unwrap_or(trimmed).to_lowercase();

        if key_hex.starts_with(ED25519_PKCS8_PREFIX) {
            return Err(IdentityError::UnsupportedKey("ED25519"));
        }

        let raw_hex = if key_hex.len() == 64 {
            key_hex.as_str()
        } else if let Some(rest) = key_hex.strip_prefix(ECDSA_PKCS8_PREFIX) {
            rest
        } else if let Some(rest) = key_hex.strip_prefix(ECDSA_SEC1_PREFIX) {
            // SEC1 may carry trailing curve parameters after the 32-byte key.
            rest.get(..64).unwrap_or(rest)
        } else {
            return Err(IdentityError::InvalidKey(format!(
                "unrecognised key encoding ({} hex characters)",
                key_hex.len()
            )));
        };

        let raw = hex::decode(raw_hex)
            .map_err(|e| IdentityError::InvalidKey(format!("invalid hex: {}", e)))?;
        if raw.len() != 32 {
            return Err(IdentityError::InvalidKey(format!(
                "expected 32 key bytes, got {}",
                raw.len()
            )));
        }

        let signer = PrivateKeySigner::from_slice(&raw)
            .map_err(|e| IdentityError::InvalidKey(format!("not a secp256k1 scalar: {}", e)))?;

        Ok(Self { signer })
    }

    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }

    pub fn into_signer(self) -> PrivateKeySigner {
        self.signer
    }
}

impl fmt::Debug for OperatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorKey")
            .field("address", &self.signer.address())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known test private key (Anvil's first account)
    const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    fn address_of(key: &OperatorKey) -> String {
        key.signer().address().to_string().to_lowercase()
    }

    #[test]
    fn test_raw_hex_key() {
        let key = OperatorKey::parse(TEST_PRIVATE_KEY).unwrap();
        assert_eq!(address_of(&key), TEST_ADDRESS);

        let key = OperatorKey::parse(&format!("0x{}", TEST_PRIVATE_KEY)).unwrap();
        assert_eq!(address_of(&key), TEST_ADDRESS);
    }

    #[test]
    fn test_der_encoded_ecdsa_keys() {
        let pkcs8 = format!("{}{}", ECDSA_PKCS8_PREFIX, TEST_PRIVATE_KEY);
        assert_eq!(address_of(&OperatorKey::parse(&pkcs8).unwrap()), TEST_ADDRESS);

        let sec1 = format!("{}{}a00706052b8104000a", ECDSA_SEC1_PREFIX, TEST_PRIVATE_KEY);
        assert_eq!(address_of(&OperatorKey::parse(&sec1).unwrap()), TEST_ADDRESS);
    }

    #[test]
    fn test_ed25519_is_rejected() {
        let ed = format!("{}{}", ED25519_PKCS8_PREFIX, TEST_PRIVATE_KEY);
        let err = OperatorKey::parse(&ed).unwrap_err();
        assert!(matches!(err, IdentityError::UnsupportedKey("ED25519")));
        assert!(err.to_string().contains("ECDSA"));
    }

    #[test]
    fn test_invalid_key() {
        assert!(OperatorKey::parse("invalid_key").is_err());
        assert!(OperatorKey::parse(&"0".repeat(64)).is_err());
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let key = OperatorKey::parse(TEST_PRIVATE_KEY).unwrap();
        let debug = format!("{:?}", key);
        assert!(!debug.contains(TEST_PRIVATE_KEY));
    }
}
