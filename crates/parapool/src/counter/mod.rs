mod interface;
mod lock;
mod managed;

pub use interface::*;
pub use lock::*;
pub use managed::*;

use crate::{ExecutionMode, Result};
use std::sync::Arc;

/// Builds a fresh counter (starting at 0) with the backing that matches
/// `mode`.
///
/// # Errors
///
/// Returns [`crate::Error::WorkerSpawn`] if the counter manager for
/// [`ExecutionMode::Isolated`] cannot be started.
pub fn counter_for(mode: ExecutionMode) -> Result<Arc<dyn SharedCounter>> {
    match mode {
        ExecutionMode::Shared => Ok(Arc::new(LockCounter::new())),
        ExecutionMode::Isolated => Ok(Arc::new(ManagedCounter::spawn()?)),
    }
}
