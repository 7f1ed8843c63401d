//! Hbar denominations.
//!
//! The JSON-RPC relay reports balances in weibars (10^-18 hbar) while the
//! native unit is the tinybar (10^-8 hbar).

use std::fmt;

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

/// Decimal places of one hbar expressed in tinybars.
pub const HBAR_DECIMALS: u8 = 8;

/// Weibars per tinybar.
const WEIBARS_PER_TINYBAR: u64 = 10_000_000_000;

/// An amount of hbar, held in tinybars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Tinybar(pub U256);

impl Tinybar {
    pub fn from_tinybars(amount: u64) -> Self {
        Self(U256::from(amount))
    }

    /// Convert a relay weibar balance, truncating sub-tinybar dust.
    pub fn from_weibars(weibars: U256) -> Self {
        Self(weibars / U256::from(WEIBARS_PER_TINYBAR))
    }

    pub fn to_weibars(&self) -> U256 {
        self.0.saturating_mul(U256::from(WEIBARS_PER_TINYBAR))
    }

    /// Human-readable hbar amount, e.g. `"1.5"`.
    pub fn format_hbar(&self) -> String {
        format_units(self.0, HBAR_DECIMALS)
    }
}

impl fmt::Display for Tinybar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_hbar())
    }
}

/// Render an integer amount with `decimals` implied decimal places.
///
/// Trailing fractional zeros are trimmed but at least one digit is kept,
/// so `100_000_000` with 8 decimals renders as `"1.0"`.
pub fn format_units(value: U256, decimals: u8) -> String {
    let digits = value.to_string();
    let decimals = decimals as usize;

    let (whole, fraction) = if digits.len() > decimals {
        let split = digits.len() - decimals;
        (digits[..split].to_string(), digits[split..].to_string())
    } else {
        ("0".to_string(), format!("{:0>width$}", digits, width = decimals))
    };

    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        format!("{}.0", whole)
    } else {
        format!("{}.{}", whole, fraction)
    }
}
