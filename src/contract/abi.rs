//! Contract interface descriptors built from human-readable signatures.

use alloy::dyn_abi::{DynSolValue, JsonAbiExt};
use alloy::json_abi::{Event, Function, JsonAbi};

use crate::blockchain::types::{ChainError, ChainResult};

/// Call surface of the demo token: constructor, three reads, one write and
/// the transfer event.
pub const TOKEN_INTERFACE: [&str; 6] = [
    "constructor(uint totalSupply)",
    // Read-only functions
    "function balanceOf(address owner) view returns (uint256)",
    "function decimals() view returns (uint8)",
    "function symbol() view returns (string)",
    // Authenticated functions
    "function transfer(address to, uint amount) returns (bool)",
    // Events
    "event Transfer(address indexed from, address indexed to, uint amount)",
];

/// An immutable, parsed contract interface.
#[derive(Debug, Clone)]
pub struct InterfaceDescriptor {
    signatures: Vec<String>,
    abi: JsonAbi,
}

impl InterfaceDescriptor {
    /// Parse an ordered list of human-readable signatures.
    pub fn parse<I, S>(signatures: I) -> ChainResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let signatures: Vec<String> = signatures
            .into_iter()
            .map(|s| normalize_signature(s.as_ref()))
            .collect();

        let abi = JsonAbi::parse(signatures.iter().map(String::as_str))
            .map_err(|e| ChainError::Abi(format!("invalid interface: {}", e)))?;

        Ok(Self { signatures, abi })
    }

    /// The demo token interface.
    pub fn token() -> ChainResult<Self> {
        Self::parse(TOKEN_INTERFACE)
    }

    /// Normalized signatures in declaration order.
    pub fn signatures(&self) -> &[String] {
        &self.signatures
    }

    pub fn abi(&self) -> &JsonAbi {
        &self.abi
    }

    /// Look up a function by name. Overloads resolve to the first declared.
    pub fn function(&self, name: &str) -> ChainResult<&Function> {
        self.abi
            .function(name)
            .and_then(|overloads| overloads.first())
            .ok_or_else(|| ChainError::Abi(format!("no function '{}' in interface", name)))
    }

    pub fn event(&self, name: &str) -> ChainResult<&Event> {
        self.abi
            .event(name)
            .and_then(|overloads| overloads.first())
            .ok_or_else(|| ChainError::Abi(format!("no event '{}' in interface", name)))
    }

    /// ABI-encode constructor arguments (empty when there is no constructor).
    pub fn encode_constructor(&self, args: &[DynSolValue]) -> ChainResult<Vec<u8>> {
        match self.abi.constructor() {
            Some(constructor) => constructor
                .abi_encode_input(args)
                .map_err(|e| ChainError::Abi(format!("constructor arguments: {}", e))),
            None if args.is_empty() => Ok(Vec::new()),
            None => Err(ChainError::Abi(
                "interface has no constructor but arguments were given".to_string(),
            )),
        }
    }
}

/// Expand the `uint`/`int` shorthands to their canonical 256-bit names.
pub fn normalize_signature(signature: &str) -> String {
    let mut out = String::with_capacity(signature.len() + 8);
    let mut word = String::new();

    let flush = |word: &mut String, out: &mut String| {
        match word.as_str() {
            "uint" => out.push_str("uint256"),
            "int" => out.push_str("int256"),
            _ => out.push_str(word),
        }
        word.clear();
    };

    for c in signature.trim().chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
            word.push(c);
        } else {
            flush(&mut word, &mut out);
            out.push(c);
        }
    }
    flush(&mut word, &mut out);
    out
}
