//! Error types for the cache crate
//!
//! Cache operations themselves never fail. Errors only come from building a
//! TTL cache and from tearing down its sweep task.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The sweep task needs a Tokio runtime and none is running
    #[error("No Tokio runtime available to run the expiration sweep")]
    RuntimeUnavailable,

    /// Configuration values that cannot drive a cache
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The sweep task ended abnormally
    #[error("Sweep task failed: {0}")]
    SweeperFailed(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache crate.
pub type Result<T> = std::result::Result<T, CacheError>;
