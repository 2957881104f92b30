//! Error types for the item cache
//!
//! Provides unified error handling using thiserror. Lookups and removals of
//! missing keys are not errors; they are reported as `None` / `false`.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the item cache.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CacheError {
    /// A configuration value is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The host refused to schedule the periodic cleanup
    #[error("Scheduler unavailable: {0}")]
    Scheduler(String),

    /// The memory probe could not read host metrics
    #[error("Memory probe failed: {0}")]
    Probe(String),
}

// == Result Type Alias ==
/// Convenience Result type for the item cache.
pub type Result<T> = std::result::Result<T, CacheError>;
