//! Contract interfaces, deployment and interaction.
//!
//! # Data Flow
//! ```text
//! abi.rs (human-readable signatures → InterfaceDescriptor)
//! bytecode.rs (creation code from disk)
//!     → factory.rs (deploy → PendingDeployment → DeployedContract)
//!     → instance.rs (read calls, state-changing sends)
//!     → events.rs (filters, one-shot subscriptions)
//! ```

pub mod abi;
pub mod bytecode;
pub mod events;
pub mod factory;
pub mod instance;

pub use abi::{InterfaceDescriptor, TOKEN_INTERFACE};
pub use bytecode::{Bytecode, BytecodeError};
pub use events::{EmittedEvent, EventFilter, Subscription};
pub use factory::{ContractFactory, PendingDeployment};
pub use instance::DeployedContract;
