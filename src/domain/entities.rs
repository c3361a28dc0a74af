//! Artifacts produced by the component generator.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentMetadata {
    pub component_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated: OffsetDateTime,
    pub required_keys: Vec<String>,
}

/// A component template rendered for one language.
///
/// This is the payload stored in both cache tiers. `cached` is response
/// metadata set on the way out; stored copies always carry `false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalizedComponent {
    pub component_name: String,
    pub component_type: String,
    pub language: String,
    pub template: String,
    pub localized_data: BTreeMap<String, String>,
    pub metadata: ComponentMetadata,
    #[serde(default, skip_serializing_if = "is_false")]
    pub cached: bool,
}

impl LocalizedComponent {
    /// Copy marked with whether it was served from a cache tier.
    pub fn with_cached(mut self, cached: bool) -> Self {
        self.cached = cached;
        self
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}
