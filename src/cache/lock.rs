use std::sync::{Mutex, MutexGuard};

use tracing::warn;

/// Lock the primary tier, recovering the guard if a previous holder panicked.
///
/// Every store operation completes its map and recency updates before
/// releasing the guard, so a poisoned lock still protects a consistent index.
pub(crate) fn lock_primary<'a, T>(lock: &'a Mutex<T>, op: &'static str) -> MutexGuard<'a, T> {
    match lock.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!(
                op,
                target_module = "cache::store",
                lock_kind = "mutex.lock",
                result = "poisoned_recovered",
                "Recovered from poisoned primary cache lock"
            );
            poisoned.into_inner()
        }
    }
}
