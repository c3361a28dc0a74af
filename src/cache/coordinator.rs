//! Two-tier lookup protocol.
//!
//! ```text
//! CheckPrimary ──hit──────────────────────────────▶ Done(PrimaryHit)
//!      │ miss
//! CheckSecondary ──hit──▶ primary.put ────────────▶ Done(SecondaryHit)
//!      │ miss / error / not configured
//! Compute ──rejected──────────────────────────────▶ CapacityExceeded
//!      │ permit held during generation
//!      ├──origin error────────────────────────────▶ NotFound
//!      └──ok──▶ primary.put, secondary.store ─────▶ Done(Computed)
//! ```
//!
//! A primary hit performs no writes on either tier. Secondary failures are
//! logged and folded into a miss; only `CapacityExceeded` and `NotFound`
//! reach the caller.

use std::{sync::Arc, time::Instant};

use metrics::{counter, histogram};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use super::config::CacheConfig;
use super::gate::{AdmissionGate, AdmissionRejected};
use super::keys::CacheKey;
use super::origin::{OriginError, OriginGenerator};
use super::secondary::SecondaryStore;
use super::store::ExpiringLru;

const METRIC_SECONDARY_HIT: &str = "localizer_cache_secondary_hit_total";
const METRIC_SECONDARY_MISS: &str = "localizer_cache_secondary_miss_total";
const METRIC_SECONDARY_ERROR: &str = "localizer_cache_secondary_error_total";
const METRIC_ORIGIN_COMPUTE_MS: &str = "localizer_origin_compute_ms";

/// Which tier answered a lookup. Metadata only, never part of cache identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    PrimaryHit,
    SecondaryHit,
    Computed,
}

impl Origin {
    pub fn as_str(self) -> &'static str {
        match self {
            Origin::PrimaryHit => "primary",
            Origin::SecondaryHit => "secondary",
            Origin::Computed => "computed",
        }
    }

    /// True when the value came from either cache tier.
    pub fn is_cached(self) -> bool {
        !matches!(self, Origin::Computed)
    }
}

#[derive(Debug, Clone)]
pub struct Lookup<V> {
    pub value: V,
    pub origin: Origin,
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error(transparent)]
    CapacityExceeded(#[from] AdmissionRejected),
    #[error(transparent)]
    NotFound(#[from] OriginError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SecondaryStatus {
    Connected,
    Disconnected,
    Disabled,
}

impl SecondaryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SecondaryStatus::Connected => "connected",
            SecondaryStatus::Disconnected => "disconnected",
            SecondaryStatus::Disabled => "disabled",
        }
    }
}

/// Snapshot for health reporting. Gathering it never touches the gate.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    pub primary_entries: usize,
    pub primary_capacity: usize,
    pub secondary: SecondaryStatus,
    pub admission_capacity: usize,
    pub admission_available: usize,
}

/// Orchestrates primary, secondary and origin for every lookup.
pub struct CacheCoordinator<V> {
    config: CacheConfig,
    primary: ExpiringLru<V>,
    secondary: Option<Arc<dyn SecondaryStore<V>>>,
    origin: Arc<dyn OriginGenerator<V>>,
    gate: AdmissionGate,
}

impl<V> CacheCoordinator<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(config: CacheConfig, origin: Arc<dyn OriginGenerator<V>>) -> Self {
        let primary = ExpiringLru::from_config(&config);
        let gate = AdmissionGate::new(config.compute_concurrency_non_zero().get());
        Self {
            config,
            primary,
            secondary: None,
            origin,
            gate,
        }
    }

    /// Attach a secondary tier.
    pub fn with_secondary(mut self, secondary: Arc<dyn SecondaryStore<V>>) -> Self {
        self.secondary = Some(secondary);
        self
    }

    pub fn primary(&self) -> &ExpiringLru<V> {
        &self.primary
    }

    pub fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    pub fn has_secondary(&self) -> bool {
        self.secondary.is_some()
    }

    /// Look up `(resource_type, variant)`.
    ///
    /// A resource type that cannot form a key is not found; neither tier is
    /// consulted and no permit is taken.
    pub async fn lookup_resource(
        &self,
        resource_type: &str,
        variant: &str,
    ) -> Result<Lookup<V>, LookupError> {
        let key = CacheKey::try_compose(resource_type, variant)
            .ok_or_else(|| OriginError::UnknownResource(resource_type.to_string()))?;
        self.lookup(&key).await
    }

    #[instrument(skip_all, fields(key = %key))]
    pub async fn lookup(&self, key: &CacheKey) -> Result<Lookup<V>, LookupError> {
        if let Some(value) = self.primary.get(key) {
            debug!(origin = "primary", "lookup served");
            return Ok(Lookup {
                value,
                origin: Origin::PrimaryHit,
            });
        }

        if let Some(value) = self.fetch_secondary(key).await {
            self.primary.put(key.clone(), value.clone());
            if self.config.refresh_secondary_on_hit {
                self.write_secondary(key, &value, "refresh").await;
            }
            debug!(origin = "secondary", "lookup served");
            return Ok(Lookup {
                value,
                origin: Origin::SecondaryHit,
            });
        }

        let value = self.compute(key).await?;
        self.primary.put(key.clone(), value.clone());
        if self.config.write_secondary_on_compute {
            self.write_secondary(key, &value, "compute").await;
        }
        debug!(origin = "computed", "lookup served");
        Ok(Lookup {
            value,
            origin: Origin::Computed,
        })
    }

    /// Report tier occupancy and secondary reachability.
    pub async fn status(&self) -> CacheStatus {
        let secondary = match self.secondary.as_ref() {
            None => SecondaryStatus::Disabled,
            Some(store) => match store.ping().await {
                Ok(()) => SecondaryStatus::Connected,
                Err(err) => {
                    debug!(error = %err, "secondary ping failed");
                    SecondaryStatus::Disconnected
                }
            },
        };

        CacheStatus {
            primary_entries: self.primary.len(),
            primary_capacity: self.primary.capacity(),
            secondary,
            admission_capacity: self.gate.capacity(),
            admission_available: self.gate.available(),
        }
    }

    /// Drop every entry held by the in-process tier.
    pub fn clear_primary(&self) {
        self.primary.clear();
    }

    async fn fetch_secondary(&self, key: &CacheKey) -> Option<V> {
        let secondary = self.secondary.as_ref()?;
        match secondary.fetch(key).await {
            Ok(Some(value)) => {
                counter!(METRIC_SECONDARY_HIT).increment(1);
                Some(value)
            }
            Ok(None) => {
                counter!(METRIC_SECONDARY_MISS).increment(1);
                None
            }
            Err(err) => {
                warn!(
                    cache = "secondary",
                    op = "fetch",
                    error = %err,
                    "secondary fetch failed; treating as miss"
                );
                counter!(METRIC_SECONDARY_ERROR).increment(1);
                None
            }
        }
    }

    async fn write_secondary(&self, key: &CacheKey, value: &V, reason: &'static str) {
        let Some(secondary) = self.secondary.as_ref() else {
            return;
        };
        if let Err(err) = secondary
            .store(key, value, self.config.secondary_ttl())
            .await
        {
            warn!(
                cache = "secondary",
                op = "store",
                reason,
                error = %err,
                "secondary write failed"
            );
            counter!(METRIC_SECONDARY_ERROR).increment(1);
        }
    }

    async fn compute(&self, key: &CacheKey) -> Result<V, LookupError> {
        let (resource_type, variant) = key
            .parts()
            .ok_or_else(|| OriginError::UnknownResource(key.to_string()))?;

        let _permit = self.gate.try_acquire().inspect_err(|rejected| {
            warn!(capacity = rejected.capacity, "compute rejected by admission gate");
        })?;

        let started_at = Instant::now();
        let result = self.origin.generate(resource_type, variant).await;
        histogram!(METRIC_ORIGIN_COMPUTE_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);

        result.map_err(|err| {
            debug!(error = %err, "origin reported missing artifact");
            LookupError::NotFound(err)
        })
    }
}
