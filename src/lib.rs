//! Hedera token demo library

pub mod blockchain;
pub mod config;
pub mod contract;
pub mod error;
pub mod identity;
pub mod observability;
pub mod workflow;

pub use config::schema::DemoConfig;
pub use error::DemoError;
pub use workflow::{execute, prepare, WorkflowReport};
