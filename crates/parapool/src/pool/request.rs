/// A type-erased unit of work. Jobs report their own outcome, so workers only
/// need to call them.
pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// Messages sent to worker threads.
pub(crate) enum WorkRequest {
    /// Run a single job.
    Execute { job: Job },
    /// Stop pulling work and exit.
    Shutdown,
}
