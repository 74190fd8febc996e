//! Logging: JSONL audit trail of admin mutations plus diagnostic `tracing` setup.

pub mod audit;
#[cfg(feature = "cli")]
pub mod diagnostics;
