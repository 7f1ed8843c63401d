//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, gas limits > 0)
//! - Check that a network can be resolved to an RPC endpoint
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DemoConfig → Result<(), Vec<ValidationError>>

use std::fmt;

use crate::blockchain::types::KnownNetwork;
use crate::config::schema::DemoConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem with a configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &DemoConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let network = &config.network;
    if KnownNetwork::from_name(&network.name).is_none() && network.rpc_url.is_none() {
        errors.push(ValidationError::new(
            "network.name",
            format!(
                "unknown network '{}' (expected testnet, mainnet, previewnet or local) and no rpc_url given",
                network.name
            ),
        ));
    }
    if let Some(url) = &network.rpc_url {
        if url.parse::<url::Url>().is_err() {
            errors.push(ValidationError::new("network.rpc_url", format!("invalid URL '{}'", url)));
        }
    }
    for url in &network.failover_urls {
        if url.parse::<url::Url>().is_err() {
            errors.push(ValidationError::new(
                "network.failover_urls",
                format!("invalid URL '{}'", url),
            ));
        }
    }
    if network.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("network.rpc_timeout_secs", "must be greater than 0"));
    }
    if network.confirmation_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "network.confirmation_timeout_secs",
            "must be greater than 0",
        ));
    }
    if network.poll_interval_ms == 0 {
        errors.push(ValidationError::new("network.poll_interval_ms", "must be greater than 0"));
    }

    if config.deployment.bytecode_path.trim().is_empty() {
        errors.push(ValidationError::new("deployment.bytecode_path", "must not be empty"));
    }
    if config.deployment.gas_limit == 0 {
        errors.push(ValidationError::new("deployment.gas_limit", "must be greater than 0"));
    }
    if config.interaction.gas_limit == 0 {
        errors.push(ValidationError::new("interaction.gas_limit", "must be greater than 0"));
    }

    let level = config.observability.log_level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", config.observability.log_level),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&DemoConfig::default()).is_ok());
    }

    #[test]
    fn test_custom_network_needs_rpc_url() {
        let mut config = DemoConfig::default();
        config.network.name = "devnet".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "network.name");

        config.network.rpc_url = Some("http://127.0.0.1:7546".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = DemoConfig::default();
        config.network.rpc_timeout_secs = 0;
        config.deployment.gas_limit = 0;
        config.interaction.gas_limit = 0;
        config.observability.log_level = "loud".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.iter().any(|e| e.field == "observability.log_level"));
    }
}
