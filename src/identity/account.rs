//! Hedera account identifiers and their EVM addresses.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::identity::IdentityError;

/// A `shard.realm.num` account identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId {
    pub shard: u32,
    pub realm: u64,
    pub num: u64,
}

impl AccountId {
    pub const fn new(shard: u32, realm: u64, num: u64) -> Self {
        Self { shard, realm, num }
    }

    /// The "long-zero" EVM address for this account.
    ///
    /// Layout: shard (4 bytes) ‖ realm (8 bytes) ‖ num (8 bytes), big-endian.
    /// Pure and deterministic; no network access.
    pub fn to_evm_address(&self) -> Address {
        let mut bytes = [0u8; 20];
        bytes[..4].copy_from_slice(&self.shard.to_be_bytes());
        bytes[4..12].copy_from_slice(&self.realm.to_be_bytes());
        bytes[12..].copy_from_slice(&self.num.to_be_bytes());
        Address::from(bytes)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

impl FromStr for AccountId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| IdentityError::InvalidAccountId {
            value: s.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = s.trim();
        // A trailing "-abcde" checksum is accepted but not verified.
        let body = match trimmed.split_once('-') {
            Some((body, checksum)) => {
                if checksum.len() != 5 || !checksum.chars().all(|c| c.is_ascii_lowercase()) {
                    return Err(invalid("checksum must be five lowercase letters"));
                }
                body
            }
            None => trimmed,
        };

        let parts: Vec<&str> = body.split('.').collect();
        if parts.len() != 3 {
            return Err(invalid("expected shard.realm.num"));
        }

        let shard = parts[0].parse::<u32>().map_err(|_| invalid("invalid shard"))?;
        let realm = parts[1].parse::<u64>().map_err(|_| invalid("invalid realm"))?;
        let num = parts[2].parse::<u64>().map_err(|_| invalid("invalid account number"))?;

        Ok(Self { shard, realm, num })
    }
}

impl TryFrom<String> for AccountId {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.to_string()
    }
}
