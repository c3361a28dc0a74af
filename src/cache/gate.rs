//! Admission gate in front of the origin computation.

use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tracing::debug;

const METRIC_ADMISSION_REJECTED: &str = "localizer_admission_rejected_total";

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("all {capacity} compute permits are in use")]
pub struct AdmissionRejected {
    pub capacity: usize,
}

/// Fixed pool of compute permits.
///
/// Acquisition never waits: when every permit is held the caller is turned
/// away at once. Excess load is rejected, not buffered.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    capacity: usize,
    permits: Arc<Semaphore>,
}

/// A held compute permit, returned to the gate when dropped.
///
/// Dropping covers success, error, unwinding and cancellation of the future
/// that owns it, so each acquisition is released exactly once.
#[derive(Debug)]
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
}

impl AdmissionGate {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            permits: Arc::new(Semaphore::new(capacity)),
        }
    }

    pub fn try_acquire(&self) -> Result<AdmissionPermit, AdmissionRejected> {
        match self.permits.clone().try_acquire_owned() {
            Ok(permit) => Ok(AdmissionPermit { _permit: permit }),
            Err(TryAcquireError::NoPermits) | Err(TryAcquireError::Closed) => {
                debug!(
                    capacity = self.capacity,
                    outcome = "rejected",
                    "admission gate full"
                );
                counter!(METRIC_ADMISSION_REJECTED).increment(1);
                Err(AdmissionRejected {
                    capacity: self.capacity,
                })
            }
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits currently free.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}
