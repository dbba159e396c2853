use crate::{Mutex, Result, SharedCounter};
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// A mutex-backed counter for workers that share one memory space.
///
/// The state lives in an [`Arc<Mutex<u64>>`]; clones share the same value. The
/// lock is held only for the read and increment, never while a worker sleeps.
///
/// ## Recommended When
/// - Workers are threads of the same process ([`ExecutionMode::Shared`])
///
/// ## See Also
/// - [`ManagedCounter`]
///
/// [`ExecutionMode::Shared`]: crate::ExecutionMode::Shared
/// [`ManagedCounter`]: crate::ManagedCounter
#[derive(Clone, Debug, Default)]
pub struct LockCounter {
    #[cfg(feature = "cache-padded")]
    pub(crate) state: Arc<crossbeam_utils::CachePadded<Mutex<u64>>>,
    #[cfg(not(feature = "cache-padded"))]
    pub(crate) state: Arc<Mutex<u64>>,
}

impl LockCounter {
    /// Creates a counter starting at 0.
    ///
    /// # Example
    /// ```
    /// use parapool::{LockCounter, SharedCounter};
    ///
    /// let counter = LockCounter::new();
    /// assert_eq!(counter.claim_id().unwrap(), 0);
    /// assert_eq!(counter.claim_id().unwrap(), 1);
    /// assert_eq!(counter.current().unwrap(), 2);
    /// ```
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Creates a counter whose first claimed id is `value`.
    pub fn starting_at(value: u64) -> Self {
        Self {
            #[cfg(feature = "cache-padded")]
            state: Arc::new(crossbeam_utils::CachePadded::new(Mutex::new(value))),
            #[cfg(not(feature = "cache-padded"))]
            state: Arc::new(Mutex::new(value)),
        }
    }
}

impl SharedCounter for LockCounter {
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    fn claim_id(&self) -> Result<u64> {
        let mut value = {
            #[cfg(feature = "parking-lot")]
            {
                self.state.lock()
            }
            #[cfg(not(feature = "parking-lot"))]
            {
                self.state.lock()?
            }
        };
        let id = *value;
        *value += 1;
        Ok(id)
    }

    fn current(&self) -> Result<u64> {
        #[cfg(feature = "parking-lot")]
        let value = self.state.lock();
        #[cfg(not(feature = "parking-lot"))]
        let value = self.state.lock()?;
        Ok(*value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_at_offsets_the_first_id() {
        let counter = LockCounter::starting_at(41);
        assert_eq!(counter.claim_id().unwrap(), 41);
        assert_eq!(counter.claim_id().unwrap(), 42);
        assert_eq!(counter.current().unwrap(), 43);
    }

    #[test]
    fn clones_share_state() {
        let counter = LockCounter::new();
        let other = counter.clone();
        assert_eq!(counter.claim_id().unwrap(), 0);
        assert_eq!(other.claim_id().unwrap(), 1);
        assert_eq!(counter.current().unwrap(), 2);
    }

    #[cfg(not(feature = "parking-lot"))]
    #[test]
    fn poisoned_lock_surfaces_as_error() {
        let counter = LockCounter::new();
        let state = Arc::clone(&counter.state);
        let _ = std::thread::spawn(move || {
            let _guard = state.lock().unwrap();
            panic!("poison the counter");
        })
        .join();

        assert_eq!(counter.claim_id(), Err(crate::Error::LockPoisoned));
        assert!(counter.claim_id().unwrap_err().is_fatal());
    }
}
