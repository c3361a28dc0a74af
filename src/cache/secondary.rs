//! Secondary tier contract.
//!
//! The secondary store is a network key/value service shared between
//! instances. It is optional and unreliable: the coordinator folds every
//! failure into a miss and never surfaces it to callers.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use super::keys::CacheKey;

#[derive(Debug, Error)]
pub enum SecondaryError {
    #[error("secondary store unavailable: {0}")]
    Unavailable(String),
    #[error("secondary store call timed out after {0:?}")]
    Timeout(Duration),
    #[error("failed to encode artifact: {0}")]
    Encode(String),
    #[error("failed to decode stored artifact: {0}")]
    Decode(String),
}

impl SecondaryError {
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// Get / set-with-ttl protocol the coordinator depends on.
///
/// Implementations make a single attempt per call; retries and pooling are
/// their own business.
#[async_trait]
pub trait SecondaryStore<V>: Send + Sync {
    /// `Ok(None)` means the key is absent.
    async fn fetch(&self, key: &CacheKey) -> Result<Option<V>, SecondaryError>;

    async fn store(&self, key: &CacheKey, value: &V, ttl: Duration) -> Result<(), SecondaryError>;

    /// Reachability probe for health reporting.
    async fn ping(&self) -> Result<(), SecondaryError>;
}
