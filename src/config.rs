//! Configuration Module
//!
//! Cache options, set through builder-style setters or loaded from
//! environment variables. An unset option disables its eviction rule.

use std::env;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Cache configuration parameters.
///
/// Immutable once handed to a [`Cache`](crate::Cache).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheConfig {
    /// Maximum number of entries; the oldest-inserted are evicted beyond it
    pub max_size: Option<usize>,
    /// Entries older than this are removed by `cleanup()`
    pub max_age: Option<Duration>,
    /// Process memory threshold in MB checked by `cleanup()`
    pub memory_limit_mb: Option<f64>,
    /// Period of the automatic cleanup timer
    pub auto_cleanup_interval: Option<Duration>,
    /// Entries the memory rule never evicts below
    pub memory_floor: usize,
}

impl CacheConfig {
    /// Creates an unbounded configuration with every rule disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the capacity limit.
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }

    /// Sets the time-to-live checked on cleanup.
    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// Sets the memory-pressure threshold in MB.
    pub fn memory_limit_mb(mut self, limit: f64) -> Self {
        self.memory_limit_mb = Some(limit);
        self
    }

    /// Enables automatic cleanup at the given period.
    pub fn auto_cleanup_interval(mut self, interval: Duration) -> Self {
        self.auto_cleanup_interval = Some(interval);
        self
    }

    /// Sets the minimum number of entries kept under memory pressure.
    pub fn memory_floor(mut self, floor: usize) -> Self {
        self.memory_floor = floor;
        self
    }

    // == Validate ==
    /// Rejects values that would make a rule meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.max_size == Some(0) {
            return Err(CacheError::InvalidConfig(
                "max_size must be greater than zero".to_string(),
            ));
        }
        if self.max_age == Some(Duration::ZERO) {
            return Err(CacheError::InvalidConfig(
                "max_age must be greater than zero".to_string(),
            ));
        }
        if let Some(limit) = self.memory_limit_mb {
            if !limit.is_finite() || limit <= 0.0 {
                return Err(CacheError::InvalidConfig(format!(
                    "memory_limit_mb must be a positive number, got {}",
                    limit
                )));
            }
        }
        if self.auto_cleanup_interval == Some(Duration::ZERO) {
            return Err(CacheError::InvalidConfig(
                "auto_cleanup_interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Creates a CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_SIZE` - Maximum entries (default: unbounded)
    /// - `CACHE_MAX_AGE_MS` - Time-to-live in milliseconds (default: none)
    /// - `CACHE_MEMORY_LIMIT_MB` - Memory threshold in MB (default: none)
    /// - `CACHE_CLEANUP_INTERVAL_MS` - Auto-cleanup period in milliseconds (default: off)
    /// - `CACHE_MEMORY_FLOOR` - Entries kept under memory pressure (default: 0)
    ///
    /// Unparsable values are ignored.
    pub fn from_env() -> Self {
        Self {
            max_size: env_parse("CACHE_MAX_SIZE"),
            max_age: env_parse("CACHE_MAX_AGE_MS").map(Duration::from_millis),
            memory_limit_mb: env_parse("CACHE_MEMORY_LIMIT_MB"),
            auto_cleanup_interval: env_parse("CACHE_CLEANUP_INTERVAL_MS")
                .map(Duration::from_millis),
            memory_floor: env_parse("CACHE_MEMORY_FLOOR").unwrap_or(0),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
