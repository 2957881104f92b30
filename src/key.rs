//! Key derivation
//!
//! The cache never computes identities itself; stored values expose one.

// == Cache Key ==
/// A stable, caller-defined identity for a cached value.
///
/// Two values with the same key are the same cache entry. Implementations
/// that cannot produce a key should panic: that is a caller contract
/// violation, not a recoverable condition.
pub trait CacheKey {
    /// Returns the unique key of this value.
    fn cache_key(&self) -> String;
}

impl CacheKey for String {
    fn cache_key(&self) -> String {
        self.clone()
    }
}
