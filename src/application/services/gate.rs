use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

/// Admission control for the transcription pipeline: at most `capacity`
/// (normally 1) active jobs. The slot is represented by an owned permit so
/// release happens on drop, surviving worker panics and early returns.
#[derive(Clone)]
pub struct ConcurrencyGate {
    slots: Arc<Semaphore>,
}

/// RAII admission token. Dropping it frees the slot exactly once.
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

impl ConcurrencyGate {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(capacity)),
        }
    }

    /// Non-blocking admission attempt.
    pub fn try_admit(&self) -> Option<GatePermit> {
        match Arc::clone(&self.slots).try_acquire_owned() {
            Ok(permit) => Some(GatePermit { _permit: permit }),
            Err(TryAcquireError::NoPermits) => None,
            // The semaphore is never closed while the gate lives.
            Err(TryAcquireError::Closed) => None,
        }
    }

    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }
}
