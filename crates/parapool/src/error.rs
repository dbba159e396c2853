//! Error types for the worker pool and shared counter.
//!
//! Two layers of failure exist:
//!
//! - [`Error`]: pool-level and counter-level failures. These abort a call and
//!   surface directly to the caller.
//! - [`WorkerFailure`]: a single item failed. These are collected alongside
//!   successful results so one bad item never aborts the rest of a batch.

use core::any::Any;

/// A result type defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// The per-item outcome produced by a worker.
///
/// Each submitted item resolves to exactly one outcome, stored at the item's
/// input index.
pub type WorkOutcome<R, E> = core::result::Result<R, WorkerFailure<E>>;

/// All pool-level and counter-level errors.
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The requested configuration is invalid (e.g. zero workers). Raised
    /// before any work is dispatched.
    #[error("Invalid configuration: {reason}")]
    Configuration { reason: String },

    /// The counter's mutex was **poisoned** by a thread panicking while
    /// holding it.
    ///
    /// When the `parking-lot` feature is enabled, mutexes do **not** poison,
    /// so this variant is not available.
    #[cfg_attr(docsrs, doc(cfg(not(feature = "parking-lot"))))]
    #[cfg(not(feature = "parking-lot"))]
    #[error("Counter lock poisoned")]
    LockPoisoned,

    /// The counter's backing primitive is unavailable, for example the
    /// counter manager was torn down while workers still needed it.
    #[error("Synchronization failure: {context}")]
    Synchronization { context: String },

    /// Work was submitted after the pool began shutting down.
    #[error("Worker pool is shutting down")]
    PoolShutdown,

    /// A worker or counter manager thread could not be spawned.
    #[error("Failed to spawn worker: {context}")]
    WorkerSpawn { context: String },

    /// Internal dispatch or completion channel failure.
    #[error("Channel error: {context}")]
    ChannelError { context: String },
}

impl Error {
    /// Returns `true` if the error means the shared counter can no longer be
    /// trusted. Runs abort on fatal errors instead of collecting them.
    pub const fn is_fatal(&self) -> bool {
        match self {
            Self::Synchronization { .. } => true,
            #[cfg(not(feature = "parking-lot"))]
            Self::LockPoisoned => true,
            _ => false,
        }
    }
}

#[cfg(not(feature = "parking-lot"))]
use crate::mutex::{MutexGuard, PoisonError};
#[cfg(not(feature = "parking-lot"))]
impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}

/// Why a single work item did not produce a value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum WorkerFailure<E> {
    /// The processing function returned an error.
    #[error("processing failed: {0}")]
    Process(E),

    /// The processing function panicked. The worker thread survives and keeps
    /// pulling work.
    #[error("worker panicked: {message}")]
    Panicked { message: String },

    /// The item was never started because the run was cancelled first.
    #[error("cancelled before the item was started")]
    Cancelled,
}

impl<E> WorkerFailure<E> {
    /// Returns the processing error, if this failure carries one.
    pub const fn process_error(&self) -> Option<&E> {
        match self {
            Self::Process(e) => Some(e),
            _ => None,
        }
    }

    pub(crate) fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::Panicked { message }
    }
}
