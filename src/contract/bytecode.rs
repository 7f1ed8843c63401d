//! Compiled contract bytecode loading.
//!
//! Accepts a plain hex file (optional `0x`, surrounding whitespace ignored)
//! or a compiler JSON artifact carrying `bytecode` / `bytecode.object`.

use std::fs;
use std::path::Path;

use alloy::primitives::{hex, Bytes};
use serde_json::Value;
use thiserror::Error;

/// Errors loading bytecode from disk.
#[derive(Debug, Error)]
pub enum BytecodeError {
    #[error("failed to read bytecode from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("bytecode file {path} is empty")]
    Empty { path: String },

    #[error("bytecode in {path} is not valid hex: {reason}")]
    InvalidHex { path: String, reason: String },

    #[error("artifact {path} has no bytecode field")]
    MissingArtifactField { path: String },
}

/// Contract creation code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bytecode(Bytes);

impl Bytecode {
    /// Read bytecode from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BytecodeError> {
        let path = path.as_ref();
        let path_text = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|source| BytecodeError::Io {
            path: path_text.clone(),
            source,
        })?;

        let bytecode = Self::parse(&content, &path_text)?;
        tracing::debug!(path = %path_text, bytes = bytecode.len(), "Bytecode loaded");
        Ok(bytecode)
    }

    /// Parse bytecode text; `origin` names the source in errors.
    pub fn parse(content: &str, origin: &str) -> Result<Self, BytecodeError> {
        let trimmed = content.trim();

        let hex_text = if trimmed.starts_with('{') {
            extract_artifact_bytecode(trimmed, origin)?
        } else {
            trimmed.to_string()
        };

        let hex_text = hex_text.strip_prefix("0x").unwrap_or(&hex_text);
        if hex_text.is_empty() {
            return Err(BytecodeError::Empty {
                path: origin.to_string(),
            });
        }

        let bytes = hex::decode(hex_text).map_err(|e| BytecodeError::InvalidHex {
            path: origin.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self(Bytes::from(bytes)))
    }

    pub fn bytes(&self) -> &Bytes {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Creation code followed by encoded constructor arguments.
    pub fn with_constructor_args(&self, args: &[u8]) -> Bytes {
        let mut code = self.0.to_vec();
        code.extend_from_slice(args);
        Bytes::from(code)
    }
}

fn extract_artifact_bytecode(json: &str, origin: &str) -> Result<String, BytecodeError> {
    let artifact: Value = serde_json::from_str(json).map_err(|e| BytecodeError::InvalidHex {
        path: origin.to_string(),
        reason: format!("invalid JSON artifact: {}", e),
    })?;

    let bytecode = artifact.get("bytecode").ok_or_else(|| BytecodeError::MissingArtifactField {
        path: origin.to_string(),
    })?;

    bytecode
        .as_str()
        .or_else(|| bytecode.get("object").and_then(Value::as_str))
        .map(str::to_string)
        .ok_or_else(|| BytecodeError::MissingArtifactField {
            path: origin.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_hex() {
        let code = Bytecode::parse("  0x6080604052\n", "inline").unwrap();
        assert_eq!(code.bytes().as_ref(), &[0x60, 0x80, 0x60, 0x40, 0x52]);

        let code = Bytecode::parse("6080", "inline").unwrap();
        assert_eq!(code.len(), 2);
    }

    #[test]
    fn test_parse_artifacts() {
        let flat = Bytecode::parse(r#"{"bytecode": "0x6080"}"#, "flat.json").unwrap();
        let nested = Bytecode::parse(r#"{"bytecode": {"object": "0x6080"}}"#, "nested.json").unwrap();
        assert_eq!(flat, nested);

        let err = Bytecode::parse(r#"{"abi": []}"#, "abi.json").unwrap_err();
        assert!(matches!(err, BytecodeError::MissingArtifactField { .. }));
    }

    #[test]
    fn test_rejects_empty_and_bad_hex() {
        assert!(matches!(Bytecode::parse(" \n", "x"), Err(BytecodeError::Empty { .. })));
        assert!(matches!(Bytecode::parse("0x", "x"), Err(BytecodeError::Empty { .. })));
        assert!(matches!(Bytecode::parse("0xzz", "x"), Err(BytecodeError::InvalidHex { .. })));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Bytecode::load("definitely/not/here.bin").unwrap_err();
        assert!(matches!(err, BytecodeError::Io { .. }));
        assert!(err.to_string().contains("definitely/not/here.bin"));
    }

    #[test]
    fn test_load_and_append_args() {
        let path = std::env::temp_dir().join(format!("hedera_token_demo_bytecode_{}.bin", uuid::Uuid::new_v4()));
        std::fs::write(&path, "0x60806040").unwrap();

        let code = Bytecode::load(&path).unwrap();
        let with_args = code.with_constructor_args(&[0xff; 32]);
        assert_eq!(with_args.len(), 4 + 32);

        std::fs::remove_file(&path).unwrap_or_default();
    }
}
