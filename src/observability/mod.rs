//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (RPC and transaction counters, latency histograms)
//!
//! Consumers:
//!     → stderr log lines (RUST_LOG or observability.log_level)
//!     → any `metrics` recorder installed by an embedding application
//! ```
//!
//! # Design Decisions
//! - Console progress output is separate from logs (see `workflow::console`)
//! - Metrics are no-ops unless a recorder is installed

pub mod logging;
pub mod metrics;
