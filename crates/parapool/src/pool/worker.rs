use crate::pool::WorkRequest;
use crossbeam_channel::Receiver;

/// Worker thread body.
///
/// Pulls [`WorkRequest`]s from the shared queue until it receives
/// [`WorkRequest::Shutdown`] or the queue is closed. Each worker handles one
/// job at a time, which is what bounds concurrency to the number of workers.
///
/// Jobs catch their own panics, so a failing item never takes the worker down.
#[allow(clippy::used_underscore_binding)]
pub(crate) fn worker_loop(_worker_id: usize, rx: Receiver<WorkRequest>) {
    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {_worker_id} started");

    while let Ok(request) = rx.recv() {
        match request {
            WorkRequest::Execute { job } => job(),
            WorkRequest::Shutdown => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Worker {_worker_id} received shutdown signal");
                break;
            }
        }
    }

    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {_worker_id} stopped");
}
