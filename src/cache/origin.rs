//! Origin computation invoked on a full miss.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OriginError {
    #[error("component type '{0}' not found")]
    UnknownResource(String),
}

/// Produces the artifact for `(resource_type, variant)`.
///
/// Generation has no side effects the cache needs to manage; results are
/// cached by the coordinator, failures never are.
#[async_trait]
pub trait OriginGenerator<V>: Send + Sync {
    async fn generate(&self, resource_type: &str, variant: &str) -> Result<V, OriginError>;
}
