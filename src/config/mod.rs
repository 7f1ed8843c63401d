//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → DemoConfig (validated, immutable)
//!     → CLI overrides applied in main.rs
//!
//! Environment (.env honoured)
//!     → identity::credentials (operator id, key, counterparty id)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults so the demo runs without a file
//! - Secrets never live in the config file

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::{
    AddressMode, DemoConfig, DeploymentConfig, InteractionConfig, NetworkConfig,
    ObservabilityConfig, TransferMode, WalletConfig,
};
