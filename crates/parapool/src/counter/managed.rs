//! A counter reached only through message passing.
//!
//! The value is owned by a dedicated manager thread. Workers hold a cheap,
//! cloneable [`ManagedCounter`] proxy and claim ids by sending a request and
//! waiting for the reply, so no worker ever reads or writes the counter's
//! memory directly. The manager serves one request at a time, which gives the
//! same mutual exclusion a lock would.

use crate::{Error, Result, SharedCounter};
use crossbeam_channel::{Receiver, Sender};
use std::{
    sync::{Arc, Mutex, PoisonError},
    thread::{self, JoinHandle},
};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Messages understood by the counter manager.
enum CounterRequest {
    Claim { response: Sender<u64> },
    Current { response: Sender<u64> },
    Shutdown,
}

/// Owns the manager thread. Dropped when the last proxy goes away.
struct ManagerHandle {
    requests: Sender<CounterRequest>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl ManagerHandle {
    fn stop(&self) -> Result<()> {
        let handle = self
            .thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let Some(handle) = handle else {
            return Ok(());
        };

        // The manager may already be gone; joining below is what matters.
        let _ = self.requests.send(CounterRequest::Shutdown);

        handle.join().map_err(|_| Error::Synchronization {
            context: "counter manager panicked".to_string(),
        })
    }
}

impl Drop for ManagerHandle {
    fn drop(&mut self) {
        if let Err(_e) = self.stop() {
            #[cfg(feature = "tracing")]
            tracing::error!("Counter manager did not stop cleanly: {_e}");
        }
    }
}

/// A counter for workers that do not share memory.
///
/// Every clone talks to the same
/// manager; the manager stops when [`ManagedCounter::shutdown`] is called or
/// the last clone is dropped. Claims made after the manager stopped fail with
/// [`Error::Synchronization`].
///
/// ## Recommended When
/// - Workers are isolated from each other ([`ExecutionMode::Isolated`])
///
/// ## See Also
/// - [`LockCounter`]
///
/// [`ExecutionMode::Isolated`]: crate::ExecutionMode::Isolated
/// [`LockCounter`]: crate::LockCounter
#[derive(Clone)]
pub struct ManagedCounter {
    requests: Sender<CounterRequest>,
    manager: Arc<ManagerHandle>,
}

impl ManagedCounter {
    /// Starts a counter manager at 0 and returns a proxy to it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerSpawn`] if the manager thread cannot be spawned.
    ///
    /// # Example
    /// ```
    /// use parapool::{ManagedCounter, SharedCounter};
    ///
    /// let counter = ManagedCounter::spawn().unwrap();
    /// assert_eq!(counter.claim_id().unwrap(), 0);
    /// assert_eq!(counter.clone().claim_id().unwrap(), 1);
    /// ```
    pub fn spawn() -> Result<Self> {
        Self::spawn_at(0)
    }

    /// Starts a counter manager whose first claimed id is `value`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerSpawn`] if the manager thread cannot be spawned.
    pub fn spawn_at(value: u64) -> Result<Self> {
        let (tx, rx) = crossbeam_channel::unbounded();
        let thread = thread::Builder::new()
            .name("parapool-counter".to_string())
            .spawn(move || serve(value, rx))
            .map_err(|e| Error::WorkerSpawn {
                context: format!("counter manager: {e}"),
            })?;

        Ok(Self {
            requests: tx.clone(),
            manager: Arc::new(ManagerHandle {
                requests: tx,
                thread: Mutex::new(Some(thread)),
            }),
        })
    }

    /// Stops the manager. Idempotent.
    ///
    /// Pending and future claims through any clone fail with
    /// [`Error::Synchronization`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Synchronization`] if the manager thread panicked.
    pub fn shutdown(&self) -> Result<()> {
        self.manager.stop()
    }

    fn request(&self, build: impl FnOnce(Sender<u64>) -> CounterRequest) -> Result<u64> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        self.requests
            .send(build(tx))
            .map_err(|_| Error::Synchronization {
                context: "counter manager is not running".to_string(),
            })?;
        rx.recv().map_err(|_| Error::Synchronization {
            context: "counter manager stopped before replying".to_string(),
        })
    }
}

impl SharedCounter for ManagedCounter {
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    fn claim_id(&self) -> Result<u64> {
        self.request(|response| CounterRequest::Claim { response })
    }

    fn current(&self) -> Result<u64> {
        self.request(|response| CounterRequest::Current { response })
    }
}

fn serve(mut value: u64, requests: Receiver<CounterRequest>) {
    #[cfg(feature = "tracing")]
    tracing::trace!("Counter manager started at {value}");

    while let Ok(request) = requests.recv() {
        match request {
            CounterRequest::Claim { response } => {
                let id = value;
                value += 1;
                if response.send(id).is_err() {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("Claimant for id {id} went away before the reply");
                }
            }
            CounterRequest::Current { response } => {
                let _ = response.send(value);
            }
            CounterRequest::Shutdown => break,
        }
    }

    #[cfg(feature = "tracing")]
    tracing::trace!("Counter manager stopped at {value}");
}
