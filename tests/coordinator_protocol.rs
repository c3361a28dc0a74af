//! Lookup protocol tests for the cache coordinator.
//!
//! Fakes stand in for the origin and the secondary store so every tier
//! write and every computation can be counted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use localizer::cache::{
    CacheConfig, CacheCoordinator, CacheKey, LookupError, Origin, OriginError, OriginGenerator,
    SecondaryError, SecondaryStatus, SecondaryStore,
};
use tokio::sync::Semaphore;

#[derive(Default)]
struct FakeOrigin {
    calls: AtomicUsize,
    release: Option<Arc<Semaphore>>,
}

impl FakeOrigin {
    /// Origin that parks every computation until `release` hands out a permit.
    fn blocking(release: Arc<Semaphore>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            release: Some(release),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OriginGenerator<String> for FakeOrigin {
    async fn generate(&self, resource_type: &str, variant: &str) -> Result<String, OriginError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(release) = self.release.as_ref() {
            release.acquire().await.expect("release semaphore open").forget();
        }
        if resource_type == "missing" {
            return Err(OriginError::UnknownResource(resource_type.to_string()));
        }
        Ok(format!("{resource_type}/{variant}#{call}"))
    }
}

#[derive(Default)]
struct FakeSecondary {
    entries: Mutex<HashMap<String, String>>,
    ttls: Mutex<Vec<Duration>>,
    fetches: AtomicUsize,
    stores: AtomicUsize,
    failing: AtomicBool,
}

impl FakeSecondary {
    fn seed(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .expect("entries lock")
            .insert(key.to_string(), value.to_string());
    }

    fn stored(&self, key: &str) -> Option<String> {
        self.entries.lock().expect("entries lock").get(key).cloned()
    }

    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn stores(&self) -> usize {
        self.stores.load(Ordering::SeqCst)
    }

    fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), SecondaryError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SecondaryError::unavailable("connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl SecondaryStore<String> for FakeSecondary {
    async fn fetch(&self, key: &CacheKey) -> Result<Option<String>, SecondaryError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.stored(key.as_str()))
    }

    async fn store(&self, key: &CacheKey, value: &String, ttl: Duration) -> Result<(), SecondaryError> {
        self.stores.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.ttls.lock().expect("ttls lock").push(ttl);
        self.seed(key.as_str(), value);
        Ok(())
    }

    async fn ping(&self) -> Result<(), SecondaryError> {
        self.check()
    }
}

fn standalone(config: CacheConfig, origin: Arc<FakeOrigin>) -> CacheCoordinator<String> {
    CacheCoordinator::new(config, origin)
}

fn with_secondary(
    config: CacheConfig,
    origin: Arc<FakeOrigin>,
    secondary: Arc<FakeSecondary>,
) -> CacheCoordinator<String> {
    standalone(config, origin).with_secondary(secondary)
}

async fn wait_for_calls(origin: &FakeOrigin, expected: usize) {
    while origin.calls() < expected {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn primary_hit_performs_no_tier_writes() {
    let origin = Arc::new(FakeOrigin::default());
    let secondary = Arc::new(FakeSecondary::default());
    let coordinator = with_secondary(CacheConfig::default(), origin.clone(), secondary.clone());
    let key = CacheKey::compose("welcome", "en");

    let first = coordinator.lookup(&key).await.expect("computed");
    assert_eq!(first.origin, Origin::Computed);
    assert_eq!(secondary.fetches(), 1);
    assert_eq!(secondary.stores(), 1);

    let second = coordinator.lookup(&key).await.expect("primary hit");

    assert_eq!(second.origin, Origin::PrimaryHit);
    assert_eq!(second.value, first.value);
    assert_eq!(secondary.fetches(), 1);
    assert_eq!(secondary.stores(), 1);
    assert_eq!(origin.calls(), 1);
    assert_eq!(coordinator.primary().len(), 1);
}

#[tokio::test]
async fn secondary_hit_fills_primary_without_refreshing_secondary() {
    let origin = Arc::new(FakeOrigin::default());
    let secondary = Arc::new(FakeSecondary::default());
    secondary.seed("navigation:fr", "shared copy");
    let coordinator = with_secondary(CacheConfig::default(), origin.clone(), secondary.clone());
    let key = CacheKey::compose("navigation", "fr");

    let lookup = coordinator.lookup(&key).await.expect("secondary hit");

    assert_eq!(lookup.origin, Origin::SecondaryHit);
    assert_eq!(lookup.value, "shared copy");
    assert_eq!(secondary.stores(), 0);
    assert_eq!(origin.calls(), 0);

    let again = coordinator.lookup(&key).await.expect("primary hit");
    assert_eq!(again.origin, Origin::PrimaryHit);
    assert_eq!(again.value, "shared copy");
    assert_eq!(secondary.fetches(), 1);
}

#[tokio::test]
async fn secondary_hit_refreshes_secondary_when_enabled() {
    let origin = Arc::new(FakeOrigin::default());
    let secondary = Arc::new(FakeSecondary::default());
    secondary.seed("footer:de", "shared copy");
    let config = CacheConfig {
        refresh_secondary_on_hit: true,
        secondary_ttl_ms: 90_000,
        ..Default::default()
    };
    let coordinator = with_secondary(config, origin.clone(), secondary.clone());

    let lookup = coordinator
        .lookup(&CacheKey::compose("footer", "de"))
        .await
        .expect("secondary hit");

    assert_eq!(lookup.origin, Origin::SecondaryHit);
    assert_eq!(secondary.stores(), 1);
    assert_eq!(
        secondary.ttls.lock().expect("ttls lock").as_slice(),
        &[Duration::from_secs(90)]
    );
    assert_eq!(origin.calls(), 0);
}

#[tokio::test]
async fn computed_artifacts_are_written_to_both_tiers() {
    let origin = Arc::new(FakeOrigin::default());
    let secondary = Arc::new(FakeSecondary::default());
    let coordinator = with_secondary(CacheConfig::default(), origin.clone(), secondary.clone());

    let lookup = coordinator
        .lookup(&CacheKey::compose("user_profile", "es"))
        .await
        .expect("computed");

    assert_eq!(lookup.origin, Origin::Computed);
    assert_eq!(lookup.value, "user_profile/es#1");
    assert_eq!(
        secondary.stored("user_profile:es").as_deref(),
        Some("user_profile/es#1")
    );
    assert_eq!(
        secondary.ttls.lock().expect("ttls lock").as_slice(),
        &[Duration::from_secs(30 * 60)]
    );
    assert_eq!(coordinator.primary().len(), 1);
}

#[tokio::test]
async fn compute_write_back_can_be_disabled() {
    let origin = Arc::new(FakeOrigin::default());
    let secondary = Arc::new(FakeSecondary::default());
    let config = CacheConfig {
        write_secondary_on_compute: false,
        ..Default::default()
    };
    let coordinator = with_secondary(config, origin, secondary.clone());

    coordinator
        .lookup(&CacheKey::compose("welcome", "en"))
        .await
        .expect("computed");

    assert_eq!(secondary.stores(), 0);
    assert_eq!(coordinator.primary().len(), 1);
}

#[tokio::test]
async fn failing_secondary_degrades_to_compute() {
    let origin = Arc::new(FakeOrigin::default());
    let secondary = Arc::new(FakeSecondary::default());
    secondary.fail(true);
    let coordinator = with_secondary(CacheConfig::default(), origin.clone(), secondary.clone());
    let key = CacheKey::compose("welcome", "fr");

    let first = coordinator.lookup(&key).await.expect("computed despite secondary failure");
    let second = coordinator.lookup(&key).await.expect("primary hit");

    assert_eq!(first.origin, Origin::Computed);
    assert_eq!(second.origin, Origin::PrimaryHit);
    assert_eq!(origin.calls(), 1);
    assert_eq!(secondary.fetches(), 1);
    assert_eq!(secondary.stores(), 1);
}

#[tokio::test]
async fn saturated_gate_rejects_without_computing() {
    let release = Arc::new(Semaphore::new(0));
    let origin = Arc::new(FakeOrigin::blocking(release.clone()));
    let coordinator = Arc::new(standalone(CacheConfig::default(), origin.clone()));

    let in_flight: Vec<_> = ["welcome", "footer"]
        .into_iter()
        .map(|resource_type| {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .lookup(&CacheKey::compose(resource_type, "en"))
                    .await
            })
        })
        .collect();
    wait_for_calls(&origin, 2).await;
    assert_eq!(coordinator.gate().available(), 0);

    let rejected = coordinator
        .lookup(&CacheKey::compose("navigation", "en"))
        .await;

    assert!(matches!(rejected, Err(LookupError::CapacityExceeded(_))));
    assert_eq!(origin.calls(), 2);

    release.add_permits(2);
    for handle in in_flight {
        let lookup = handle.await.expect("task joined").expect("computed");
        assert_eq!(lookup.origin, Origin::Computed);
    }
    assert_eq!(coordinator.gate().available(), 2);
    assert!(
        coordinator
            .primary()
            .get(&CacheKey::compose("navigation", "en"))
            .is_none()
    );
}

#[tokio::test]
async fn cached_artifacts_are_served_while_gate_is_saturated() {
    let release = Arc::new(Semaphore::new(1));
    let origin = Arc::new(FakeOrigin::blocking(release.clone()));
    let config = CacheConfig {
        compute_concurrency: 1,
        ..Default::default()
    };
    let coordinator = Arc::new(standalone(config, origin.clone()));
    let cached_key = CacheKey::compose("welcome", "en");
    coordinator.lookup(&cached_key).await.expect("warm");

    let blocked = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move {
            coordinator
                .lookup(&CacheKey::compose("footer", "en"))
                .await
        })
    };
    wait_for_calls(&origin, 2).await;

    let hit = coordinator.lookup(&cached_key).await.expect("primary hit");
    let status = coordinator.status().await;

    assert_eq!(hit.origin, Origin::PrimaryHit);
    assert_eq!(status.admission_available, 0);
    assert_eq!(status.secondary, SecondaryStatus::Disabled);

    release.add_permits(1);
    blocked.await.expect("task joined").expect("computed");
}

#[tokio::test]
async fn overlapping_lookups_within_capacity_all_succeed() {
    let release = Arc::new(Semaphore::new(0));
    let origin = Arc::new(FakeOrigin::blocking(release.clone()));
    let coordinator = Arc::new(standalone(CacheConfig::default(), origin.clone()));

    let handles: Vec<_> = ["es", "de"]
        .into_iter()
        .map(|language| {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .lookup(&CacheKey::compose("navigation", language))
                    .await
            })
        })
        .collect();
    wait_for_calls(&origin, 2).await;
    release.add_permits(2);

    for handle in handles {
        assert!(handle.await.expect("task joined").is_ok());
    }
    assert_eq!(coordinator.primary().len(), 2);
}

#[tokio::test]
async fn unknown_resource_is_not_found_and_never_cached() {
    let origin = Arc::new(FakeOrigin::default());
    let secondary = Arc::new(FakeSecondary::default());
    let coordinator = with_secondary(CacheConfig::default(), origin.clone(), secondary.clone());
    let key = CacheKey::compose("missing", "en");

    let result = coordinator.lookup(&key).await;

    match result {
        Err(LookupError::NotFound(OriginError::UnknownResource(resource_type))) => {
            assert_eq!(resource_type, "missing")
        }
        other => panic!("expected not found, got {other:?}"),
    }
    assert!(coordinator.primary().is_empty());
    assert_eq!(secondary.stores(), 0);
    assert_eq!(coordinator.gate().available(), 2);
}

#[tokio::test]
async fn resource_type_with_separator_never_aliases_another_key() {
    let origin = Arc::new(FakeOrigin::default());
    let secondary = Arc::new(FakeSecondary::default());
    let coordinator = with_secondary(CacheConfig::default(), origin.clone(), secondary.clone());

    let aliased = coordinator
        .lookup_resource("welcome", "x:fr")
        .await
        .expect("computed");
    assert_eq!(aliased.origin, Origin::Computed);
    assert_eq!(aliased.value, "welcome/x:fr#1");

    let result = coordinator.lookup_resource("welcome:x", "fr").await;

    match result {
        Err(LookupError::NotFound(OriginError::UnknownResource(resource_type))) => {
            assert_eq!(resource_type, "welcome:x")
        }
        other => panic!("expected not found, got {other:?}"),
    }
    assert_eq!(origin.calls(), 1);
    assert_eq!(secondary.fetches(), 1);
    assert_eq!(coordinator.primary().len(), 1);
    assert_eq!(coordinator.gate().available(), 2);
}

#[tokio::test]
async fn cancelled_lookup_returns_its_permit() {
    let release = Arc::new(Semaphore::new(0));
    let origin = Arc::new(FakeOrigin::blocking(release));
    let coordinator = Arc::new(standalone(CacheConfig::default(), origin.clone()));

    let handle = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move {
            coordinator
                .lookup(&CacheKey::compose("welcome", "en"))
                .await
        })
    };
    wait_for_calls(&origin, 1).await;
    assert_eq!(coordinator.gate().available(), 1);

    handle.abort();
    let joined = handle.await;

    assert!(joined.expect_err("aborted").is_cancelled());
    assert_eq!(coordinator.gate().available(), 2);
    assert!(coordinator.primary().is_empty());
}

#[tokio::test(start_paused = true)]
async fn eviction_and_expiry_drive_recomputation() {
    let origin = Arc::new(FakeOrigin::default());
    let config = CacheConfig {
        primary_capacity: 2,
        primary_ttl_ms: 1_000,
        compute_concurrency: 1,
        ..Default::default()
    };
    let coordinator = standalone(config, origin.clone());
    let a = CacheKey::compose("welcome", "en");
    let b = CacheKey::compose("footer", "en");
    let c = CacheKey::compose("navigation", "en");

    assert_eq!(coordinator.lookup(&a).await.expect("a").origin, Origin::Computed);
    assert_eq!(coordinator.lookup(&b).await.expect("b").origin, Origin::Computed);
    assert_eq!(coordinator.lookup(&a).await.expect("a").origin, Origin::PrimaryHit);

    // b is least recently used and makes room for c.
    assert_eq!(coordinator.lookup(&c).await.expect("c").origin, Origin::Computed);
    assert_eq!(coordinator.lookup(&b).await.expect("b").origin, Origin::Computed);
    assert_eq!(origin.calls(), 4);

    tokio::time::advance(Duration::from_millis(1_100)).await;

    let expired = coordinator.lookup(&b).await.expect("b after ttl");
    assert_eq!(expired.origin, Origin::Computed);
    assert_eq!(expired.value, "footer/en#5");
}

#[tokio::test(start_paused = true)]
async fn expired_entry_is_served_from_secondary_when_one_is_configured() {
    let origin = Arc::new(FakeOrigin::default());
    let secondary = Arc::new(FakeSecondary::default());
    let config = CacheConfig {
        primary_capacity: 2,
        primary_ttl_ms: 1_000,
        compute_concurrency: 1,
        ..Default::default()
    };
    let coordinator = with_secondary(config, origin.clone(), secondary.clone());
    let key = CacheKey::compose("welcome", "en");

    let first = coordinator.lookup(&key).await.expect("computed");
    assert_eq!(first.origin, Origin::Computed);
    assert_eq!(coordinator.lookup(&key).await.expect("hit").origin, Origin::PrimaryHit);

    tokio::time::advance(Duration::from_millis(1_100)).await;

    let after_ttl = coordinator.lookup(&key).await.expect("secondary hit");
    assert_eq!(after_ttl.origin, Origin::SecondaryHit);
    assert_eq!(after_ttl.value, first.value);
    assert_eq!(origin.calls(), 1);
    assert_eq!(secondary.stores(), 1);
}

#[tokio::test]
async fn status_reports_secondary_reachability() {
    let origin = Arc::new(FakeOrigin::default());
    let secondary = Arc::new(FakeSecondary::default());
    let coordinator = with_secondary(CacheConfig::default(), origin, secondary.clone());

    assert_eq!(coordinator.status().await.secondary, SecondaryStatus::Connected);

    secondary.fail(true);
    let status = coordinator.status().await;

    assert_eq!(status.secondary, SecondaryStatus::Disconnected);
    assert_eq!(status.primary_entries, 0);
    assert_eq!(status.admission_capacity, 2);
}
