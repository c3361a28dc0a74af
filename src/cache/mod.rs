//! Localizer cache system.
//!
//! Serves artifacts through two tiers in front of an expensive origin:
//!
//! - **Primary**: bounded in-process LRU with per-entry TTL
//! - **Secondary**: optional shared key/value store (Redis in production)
//!
//! Full misses run the origin computation behind an admission gate that
//! rejects work once every permit is taken.
//!
//! ## Configuration
//!
//! Cache behavior is controlled via `localizer.toml`:
//!
//! ```toml
//! [cache]
//! capacity = 50
//! ttl_seconds = 600
//! secondary_ttl_seconds = 1800
//! refresh_secondary_on_hit = false
//! # ... see config.rs for all options
//! ```

mod config;
mod coordinator;
mod gate;
mod keys;
mod lock;
mod origin;
mod secondary;
mod store;

pub use config::CacheConfig;
pub use coordinator::{CacheCoordinator, CacheStatus, Lookup, LookupError, Origin, SecondaryStatus};
pub use gate::{AdmissionGate, AdmissionPermit, AdmissionRejected};
pub use keys::CacheKey;
pub use origin::{OriginError, OriginGenerator};
pub use secondary::{SecondaryError, SecondaryStore};
pub use store::ExpiringLru;
