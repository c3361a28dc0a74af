//! Cache key type shared by both tiers.

use std::{borrow::Borrow, fmt};

const SEPARATOR: char = ':';

/// Opaque identifier for one artifact variant, e.g. `welcome:en`.
///
/// Keys compare by exact string equality. No case folding or trimming is
/// applied, so `welcome:EN` and `welcome:en` are distinct entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Wrap an already composed key.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Compose a key from the resource type and its variant.
    pub fn compose(resource_type: &str, variant: &str) -> Self {
        Self(format!("{resource_type}{SEPARATOR}{variant}"))
    }

    /// Like [`CacheKey::compose`], but `None` when `resource_type` is empty
    /// or contains the separator, since [`CacheKey::parts`] could not
    /// recover it.
    pub fn try_compose(resource_type: &str, variant: &str) -> Option<Self> {
        if resource_type.is_empty() || resource_type.contains(SEPARATOR) {
            return None;
        }
        Some(Self::compose(resource_type, variant))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into `(resource_type, variant)` at the first separator.
    ///
    /// Returns `None` when the key carries no separator; such a key can be
    /// cached but never computed.
    pub fn parts(&self) -> Option<(&str, &str)> {
        self.0.split_once(SEPARATOR)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for CacheKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CacheKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CacheKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}
