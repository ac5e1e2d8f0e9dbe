use std::sync::Arc;
use hd_core::{Error, Result};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Single-slot guard around a digest cycle. A second caller is turned
/// away instead of waiting.
#[derive(Debug, Clone, Default)]
pub struct RunLock {
    slot: Arc<Mutex<()>>,
}

pub type RunGuard = OwnedMutexGuard<()>;

impl RunLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self) -> Result<RunGuard> {
        self.slot.clone().try_lock_owned().map_err(|_| Error::CycleInProgress)
    }

    pub fn is_held(&self) -> bool {
        self.slot.try_lock().is_err()
    }
}
