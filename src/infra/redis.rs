//! Redis adapter for the secondary cache tier.
//!
//! Artifacts are stored as JSON under `{namespace}{cache key}` with an
//! expiry. Every call is a single attempt bounded by the response timeout.

use std::{future::Future, marker::PhantomData, time::Duration};

use async_trait::async_trait;
use redis::{AsyncCommands, Client, RedisResult, aio::ConnectionManager};
use serde::{Serialize, de::DeserializeOwned};
use tokio::time::timeout;
use tracing::{debug, info};

use crate::cache::{CacheKey, SecondaryError, SecondaryStore};
use crate::config::SecondarySettings;

use super::error::InfraError;

pub struct RedisSecondaryStore<V> {
    connection: ConnectionManager,
    namespace: String,
    response_timeout: Duration,
    _artifact: PhantomData<fn() -> V>,
}

impl<V> RedisSecondaryStore<V> {
    /// Open a managed connection and verify it answers `PING`.
    pub async fn connect(settings: &SecondarySettings) -> Result<Self, InfraError> {
        let client = Client::open(settings.url.as_str())
            .map_err(|err| InfraError::secondary(format!("invalid redis url: {err}")))?;

        let connection = timeout(settings.connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| {
                InfraError::secondary(format!(
                    "connection timed out after {:?}",
                    settings.connect_timeout
                ))
            })?
            .map_err(|err| InfraError::secondary(format!("connection failed: {err}")))?;

        let store = Self {
            connection,
            namespace: settings.namespace.clone(),
            response_timeout: settings.response_timeout,
            _artifact: PhantomData,
        };

        store
            .ping_inner()
            .await
            .map_err(|err| InfraError::secondary(err.to_string()))?;

        info!(
            namespace = %store.namespace,
            response_timeout_ms = store.response_timeout.as_millis() as u64,
            "redis secondary store connected"
        );
        Ok(store)
    }

    fn namespaced(&self, key: &CacheKey) -> String {
        namespaced_key(&self.namespace, key)
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, SecondaryError>
    where
        F: Future<Output = RedisResult<T>>,
    {
        match timeout(self.response_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(SecondaryError::unavailable(err)),
            Err(_) => Err(SecondaryError::Timeout(self.response_timeout)),
        }
    }

    async fn ping_inner(&self) -> Result<(), SecondaryError> {
        let mut connection = self.connection.clone();
        let _pong: String = self
            .bounded(redis::cmd("PING").query_async(&mut connection))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl<V> SecondaryStore<V> for RedisSecondaryStore<V>
where
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn fetch(&self, key: &CacheKey) -> Result<Option<V>, SecondaryError> {
        let mut connection = self.connection.clone();
        let raw: Option<String> = self
            .bounded(connection.get::<_, Option<String>>(self.namespaced(key)))
            .await?;

        let Some(payload) = raw else {
            debug!(key = %key, "redis miss");
            return Ok(None);
        };

        serde_json::from_str(&payload)
            .map(Some)
            .map_err(|err| SecondaryError::Decode(err.to_string()))
    }

    async fn store(&self, key: &CacheKey, value: &V, ttl: Duration) -> Result<(), SecondaryError> {
        let payload =
            serde_json::to_string(value).map_err(|err| SecondaryError::Encode(err.to_string()))?;
        let mut connection = self.connection.clone();
        self.bounded(connection.set_ex::<_, _, ()>(
            self.namespaced(key),
            payload,
            expiry_seconds(ttl),
        ))
        .await
    }

    async fn ping(&self) -> Result<(), SecondaryError> {
        self.ping_inner().await
    }
}

fn namespaced_key(namespace: &str, key: &CacheKey) -> String {
    format!("{namespace}{key}")
}

/// Redis expiries are whole seconds; anything shorter still gets one second.
fn expiry_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}
