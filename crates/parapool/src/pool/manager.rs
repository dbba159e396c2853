use crate::{
    Error, PoolConfig, Result, WorkOutcome, WorkerFailure,
    pool::{Job, WorkRequest, gauge::ActivityGauge, worker::worker_loop},
};
use crossbeam_channel::Sender;
use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    thread::{self, JoinHandle},
};
use tokio_util::sync::CancellationToken;

/// A fixed-size pool of worker threads.
///
/// Workers pull requests from a single bounded queue whose capacity equals the
/// number of workers, so dispatch applies backpressure instead of buffering a
/// whole batch. At most [`WorkerPool::concurrency`] items are processed at any
/// instant.
///
/// Dropping the pool performs [`WorkerPool::shutdown`].
pub struct WorkerPool {
    requests: Sender<WorkRequest>,
    workers: Vec<JoinHandle<()>>,
    concurrency: usize,
    shutdown_token: CancellationToken,
    gauge: Arc<ActivityGauge>,
}

impl WorkerPool {
    /// Spawns a pool of `concurrency` workers.
    ///
    /// # Errors
    ///
    /// - [`Error::Configuration`] if `concurrency` is zero. No thread is
    ///   spawned.
    /// - [`Error::WorkerSpawn`] if a worker thread cannot be created. Workers
    ///   spawned before the failure are shut down.
    pub fn new(concurrency: usize) -> Result<Self> {
        if concurrency == 0 {
            return Err(Error::Configuration {
                reason: "concurrency must be at least 1".to_string(),
            });
        }

        let (tx, rx) = crossbeam_channel::bounded(concurrency);
        let mut pool = Self {
            requests: tx,
            workers: Vec::with_capacity(concurrency),
            concurrency,
            shutdown_token: CancellationToken::new(),
            gauge: Arc::new(ActivityGauge::default()),
        };

        for worker_id in 0..concurrency {
            let rx = rx.clone();
            let handle = thread::Builder::new()
                .name(format!("parapool-worker-{worker_id}"))
                .spawn(move || worker_loop(worker_id, rx))
                .map_err(|e| Error::WorkerSpawn {
                    context: format!("worker {worker_id}: {e}"),
                })?;
            pool.workers.push(handle);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("Spawned worker pool with {concurrency} workers");

        Ok(pool)
    }

    /// Spawns a pool sized and configured from `config`.
    ///
    /// # Errors
    ///
    /// See [`WorkerPool::new`].
    pub fn from_config(config: &PoolConfig) -> Result<Self> {
        config.validate()?;
        Self::new(config.concurrency)
    }

    /// Number of workers, the upper bound on concurrently processed items.
    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Number of items being processed right now.
    pub fn active(&self) -> usize {
        self.gauge.active()
    }

    /// Highest number of items ever observed processing at the same time.
    pub fn peak_active(&self) -> usize {
        self.gauge.peak()
    }

    /// Returns `true` once shutdown has begun.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }

    /// Processes every item with `process` and blocks until all of them have an
    /// outcome.
    ///
    /// The returned vector has one entry per item, at the item's input index.
    /// An item whose `process` call fails or panics resolves to a
    /// [`WorkerFailure`]; every other item still runs. An empty `items`
    /// returns immediately without calling `process`.
    ///
    /// # Errors
    ///
    /// - [`Error::PoolShutdown`] if the pool is shutting down.
    /// - [`Error::ChannelError`] if the workers went away mid-run.
    ///
    /// # Example
    /// ```
    /// use parapool::WorkerPool;
    ///
    /// let pool = WorkerPool::new(2).unwrap();
    /// let outcomes = pool
    ///     .run(vec![1, 2, 3], |n: &u32| if *n == 2 { Err("two") } else { Ok(n * 10) })
    ///     .unwrap();
    ///
    /// assert_eq!(outcomes[0], Ok(10));
    /// assert!(outcomes[1].is_err());
    /// assert_eq!(outcomes[2], Ok(30));
    /// ```
    pub fn run<T, R, E, F>(&self, items: Vec<T>, process: F) -> Result<Vec<WorkOutcome<R, E>>>
    where
        T: Send + 'static,
        R: Send + 'static,
        E: Send + 'static,
        F: Fn(&T) -> core::result::Result<R, E> + Send + Sync + 'static,
    {
        self.run_with_cancel(items, process, &CancellationToken::new())
    }

    /// Like [`WorkerPool::run`], but stops starting new items once `cancel` is
    /// cancelled.
    ///
    /// Items already being processed finish normally. Items not yet started
    /// resolve to [`WorkerFailure::Cancelled`]. The call still returns one
    /// outcome per item.
    ///
    /// # Errors
    ///
    /// See [`WorkerPool::run`].
    pub fn run_with_cancel<T, R, E, F>(
        &self,
        items: Vec<T>,
        process: F,
        cancel: &CancellationToken,
    ) -> Result<Vec<WorkOutcome<R, E>>>
    where
        T: Send + 'static,
        R: Send + 'static,
        E: Send + 'static,
        F: Fn(&T) -> core::result::Result<R, E> + Send + Sync + 'static,
    {
        if self.is_shutdown() {
            return Err(Error::PoolShutdown);
        }

        if items.is_empty() {
            return Ok(Vec::new());
        }

        let total = items.len();
        let process = Arc::new(process);

        // Sized to the batch so a worker never blocks on reporting.
        let (done_tx, done_rx) = crossbeam_channel::bounded(total);

        #[cfg(feature = "tracing")]
        tracing::debug!("Dispatching {total} items to {} workers", self.concurrency);

        for (index, item) in items.into_iter().enumerate() {
            let process = Arc::clone(&process);
            let done_tx = done_tx.clone();
            let cancel = cancel.clone();
            let gauge = Arc::clone(&self.gauge);

            let job: Job = Box::new(move || {
                let outcome = if cancel.is_cancelled() {
                    Err(WorkerFailure::Cancelled)
                } else {
                    execute(&gauge, &*process, &item)
                };
                // The receiver only disappears if `run` already bailed out.
                let _ = done_tx.send((index, outcome));
            });

            if self.requests.send(WorkRequest::Execute { job }).is_err() {
                return Err(Error::ChannelError {
                    context: format!("Worker queue closed while dispatching item {index}"),
                });
            }
        }
        drop(done_tx);

        let mut slots: Vec<Option<WorkOutcome<R, E>>> = (0..total).map(|_| None).collect();
        for _ in 0..total {
            let (index, outcome) = done_rx.recv().map_err(|_| Error::ChannelError {
                context: "Workers stopped before reporting every outcome".to_string(),
            })?;
            slots[index] = Some(outcome);
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| Error::ChannelError {
                    context: format!("No outcome reported for item {index}"),
                })
            })
            .collect()
    }

    /// Stops and joins every worker.
    ///
    /// `run` borrows the pool for the whole batch, so by the time this can be
    /// called every worker is idle. New runs are refused afterwards with
    /// [`Error::PoolShutdown`]. Calling this more than once is a no-op.
    #[allow(clippy::used_underscore_binding)]
    pub fn shutdown(&mut self) {
        self.shutdown_token.cancel();
        if self.workers.is_empty() {
            return;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("Notifying all {} workers to shut down", self.workers.len());

        for _i in 0..self.workers.len() {
            if let Err(_e) = self.requests.send(WorkRequest::Shutdown) {
                #[cfg(feature = "tracing")]
                tracing::error!("Failed to send shutdown request {_i}: {_e}");
            }
        }

        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                #[cfg(feature = "tracing")]
                tracing::error!("Worker thread panicked");
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("Worker pool shutdown complete");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn execute<T, R, E, F>(gauge: &ActivityGauge, process: &F, item: &T) -> WorkOutcome<R, E>
where
    F: Fn(&T) -> core::result::Result<R, E> + ?Sized,
{
    let _active = gauge.enter();
    match panic::catch_unwind(AssertUnwindSafe(|| process(item))) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(WorkerFailure::Process(e)),
        Err(payload) => {
            #[cfg(feature = "tracing")]
            tracing::warn!("Worker panicked while processing an item");
            Err(WorkerFailure::from_panic(&*payload))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::TrySendError;

    #[test]
    fn shutdown_joins_every_worker() {
        let mut pool = WorkerPool::new(4).unwrap();
        let outcomes = pool.run(vec![1_u32, 2, 3], |n: &u32| Ok::<_, ()>(*n)).unwrap();
        assert_eq!(outcomes.len(), 3);

        pool.shutdown();

        assert!(pool.workers.is_empty());
        // Every worker dropped its receiver on exit, so the queue is closed.
        assert!(matches!(
            pool.requests.try_send(WorkRequest::Shutdown),
            Err(TrySendError::Disconnected(_))
        ));
    }

    #[test]
    fn from_config_sizes_the_pool() {
        let config = PoolConfig::new(3).unwrap();
        let pool = WorkerPool::from_config(&config).unwrap();
        assert_eq!(pool.concurrency(), 3);
        assert_eq!(pool.workers.len(), 3);
    }
}
