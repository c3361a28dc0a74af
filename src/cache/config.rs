//! Cache configuration.
//!
//! Controls the primary tier, the secondary write-back policy and the
//! admission gate via `localizer.toml`.

use std::{num::NonZeroUsize, time::Duration};

use serde::Deserialize;

// Default values for cache configuration
const DEFAULT_PRIMARY_CAPACITY: usize = 50;
const DEFAULT_PRIMARY_TTL_MS: u64 = 10 * 60 * 1000;
const DEFAULT_SECONDARY_TTL_MS: u64 = 30 * 60 * 1000;
const DEFAULT_COMPUTE_CONCURRENCY: usize = 2;

/// Cache configuration from `localizer.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum entries held by the in-process tier.
    pub primary_capacity: usize,
    /// Time-to-live (ms) of a primary entry, anchored at insert/refresh.
    pub primary_ttl_ms: u64,
    /// Time-to-live (ms) attached to secondary writes.
    pub secondary_ttl_ms: u64,
    /// Re-write the secondary tier on a secondary hit (sliding TTL).
    pub refresh_secondary_on_hit: bool,
    /// Write computed artifacts to the secondary tier.
    pub write_secondary_on_compute: bool,
    /// Maximum concurrent origin computations.
    pub compute_concurrency: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            primary_capacity: DEFAULT_PRIMARY_CAPACITY,
            primary_ttl_ms: DEFAULT_PRIMARY_TTL_MS,
            secondary_ttl_ms: DEFAULT_SECONDARY_TTL_MS,
            refresh_secondary_on_hit: false,
            write_secondary_on_compute: true,
            compute_concurrency: DEFAULT_COMPUTE_CONCURRENCY,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            primary_capacity: settings.capacity.get(),
            primary_ttl_ms: duration_ms(settings.ttl),
            secondary_ttl_ms: duration_ms(settings.secondary_ttl),
            refresh_secondary_on_hit: settings.refresh_secondary_on_hit,
            write_secondary_on_compute: settings.write_secondary_on_compute,
            compute_concurrency: settings.compute_concurrency.get(),
        }
    }
}

impl CacheConfig {
    /// Returns the primary capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn primary_capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.primary_capacity).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn primary_ttl(&self) -> Duration {
        Duration::from_millis(self.primary_ttl_ms)
    }

    pub fn secondary_ttl(&self) -> Duration {
        Duration::from_millis(self.secondary_ttl_ms)
    }

    /// Returns the compute concurrency, clamping to 1 if zero.
    pub fn compute_concurrency_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.compute_concurrency).unwrap_or(NonZeroUsize::MIN)
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
