use crate::Result;
use std::sync::Arc;

/// A single ordinal counter shared by every worker in a run.
///
/// Implementations hand out each value exactly once: concurrent callers never
/// observe the same id and no value is skipped.
pub trait SharedCounter: Send + Sync {
    /// Claims the next id.
    ///
    /// Atomically reads the current value, stores `value + 1` and returns the
    /// pre-increment value.
    ///
    /// # Errors
    ///
    /// Fails only if the backing primitive is unusable (a poisoned lock or a
    /// counter manager that is no longer running).
    fn claim_id(&self) -> Result<u64>;

    /// Returns the number of ids claimed so far.
    ///
    /// # Errors
    ///
    /// Same conditions as [`SharedCounter::claim_id`].
    fn current(&self) -> Result<u64>;
}

impl<C> SharedCounter for Arc<C>
where
    C: SharedCounter + ?Sized,
{
    fn claim_id(&self) -> Result<u64> {
        (**self).claim_id()
    }

    fn current(&self) -> Result<u64> {
        (**self).current()
    }
}
