//! Component lookup service backing the HTTP surface.

use std::sync::Arc;

use serde::Serialize;

use crate::cache::{CacheCoordinator, CacheStatus, LookupError, Origin};
use crate::domain::{components, entities::LocalizedComponent, locales};

pub const SERVICE_NAME: &str = "localization-manager-backend";

/// Component served to a client together with the tier that answered.
#[derive(Debug, Clone)]
pub struct ServedComponent {
    pub component: LocalizedComponent,
    pub origin: Origin,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub cache_size: usize,
    pub cache_capacity: usize,
    pub concurrency_limit: usize,
    pub concurrency_available: usize,
    pub redis_status: &'static str,
}

impl HealthReport {
    fn from_status(status: CacheStatus) -> Self {
        Self {
            status: "healthy",
            service: SERVICE_NAME,
            version: env!("CARGO_PKG_VERSION"),
            cache_size: status.primary_entries,
            cache_capacity: status.primary_capacity,
            concurrency_limit: status.admission_capacity,
            concurrency_available: status.admission_available,
            redis_status: status.secondary.as_str(),
        }
    }
}

pub struct ComponentService {
    coordinator: Arc<CacheCoordinator<LocalizedComponent>>,
}

impl ComponentService {
    pub fn new(coordinator: Arc<CacheCoordinator<LocalizedComponent>>) -> Self {
        Self { coordinator }
    }

    /// Resolve `component_type` in `language` through the cache tiers.
    pub async fn component(
        &self,
        component_type: &str,
        language: &str,
    ) -> Result<ServedComponent, LookupError> {
        let lookup = self
            .coordinator
            .lookup_resource(component_type, language)
            .await?;
        Ok(ServedComponent {
            component: lookup.value.with_cached(lookup.origin.is_cached()),
            origin: lookup.origin,
        })
    }

    /// Health snapshot. Never passes through the admission gate.
    pub async fn health(&self) -> HealthReport {
        HealthReport::from_status(self.coordinator.status().await)
    }

    pub fn available_components(&self) -> Vec<&'static str> {
        components::component_types()
    }

    pub fn available_languages(&self) -> Vec<&'static str> {
        locales::locale_codes()
    }
}
