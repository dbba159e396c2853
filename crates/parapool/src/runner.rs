//! Batch runner tying the pieces together.
//!
//! A [`Runner`] builds a fresh counter for its [`ExecutionMode`], spawns a
//! [`WorkerPool`] sized to the configured concurrency, processes every payload
//! with [`process_item`] and tears the pool down again.

use crate::{
    Error, ExecutionMode, LatencySource, PoolConfig, RandomLatency, Result, SharedCounter,
    Sleeper, ThreadSleeper, WorkItem, WorkOutcome, WorkResult, WorkerFailure, WorkerPool,
    counter_for, process_item,
};
use core::{fmt, time::Duration};
use std::{sync::Arc, time::Instant};
use tokio_util::sync::CancellationToken;

/// Runs batches of payloads through a worker pool.
///
/// Latency sampling and sleeping are injectable; the defaults draw a random
/// latency and really sleep.
pub struct Runner<L = RandomLatency, S = ThreadSleeper> {
    config: PoolConfig,
    latency: Arc<L>,
    sleeper: Arc<S>,
}

impl Runner {
    /// Creates a runner with random latencies and real sleeping.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `config` is invalid.
    pub fn new(config: PoolConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            latency: Arc::new(RandomLatency),
            sleeper: Arc::new(ThreadSleeper),
        })
    }
}

impl<L, S> Runner<L, S>
where
    L: LatencySource + 'static,
    S: Sleeper + 'static,
{
    /// Replaces the latency source.
    pub fn with_latency<L2: LatencySource + 'static>(self, latency: L2) -> Runner<L2, S> {
        Runner {
            config: self.config,
            latency: Arc::new(latency),
            sleeper: self.sleeper,
        }
    }

    /// Replaces the sleeper.
    pub fn with_sleeper<S2: Sleeper + 'static>(self, sleeper: S2) -> Runner<L, S2> {
        Runner {
            config: self.config,
            latency: self.latency,
            sleeper: Arc::new(sleeper),
        }
    }

    pub const fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Processes `payloads` with a fresh counter for the configured mode.
    ///
    /// # Errors
    ///
    /// See [`Runner::run_with_counter`].
    pub fn run<P>(&self, payloads: impl IntoIterator<Item = P>) -> Result<RunReport<P>>
    where
        P: Clone + fmt::Display + Send + Sync + 'static,
    {
        let counter = counter_for(self.config.execution_mode)?;
        self.run_with_counter(payloads, counter)
    }

    /// Processes `payloads`, claiming progress ids from `counter`.
    ///
    /// Per-item failures are collected in the report. A failure of the counter
    /// itself is fatal: the remaining unstarted items are cancelled and the
    /// counter's error is returned.
    ///
    /// # Errors
    ///
    /// - [`Error::Configuration`] for an invalid configuration.
    /// - [`Error::Synchronization`] or [`Error::LockPoisoned`] if the counter
    ///   fails during the run.
    /// - Pool errors from [`WorkerPool::run_with_cancel`].
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(skip_all, fields(mode = %self.config.execution_mode, concurrency = self.config.concurrency))
    )]
    pub fn run_with_counter<P>(
        &self,
        payloads: impl IntoIterator<Item = P>,
        counter: Arc<dyn SharedCounter>,
    ) -> Result<RunReport<P>>
    where
        P: Clone + fmt::Display + Send + Sync + 'static,
    {
        let start = Instant::now();
        let items: Vec<WorkItem<P>> = payloads
            .into_iter()
            .map(|payload| WorkItem::new(payload, self.config.simulate_latency))
            .collect();

        let mut pool = WorkerPool::from_config(&self.config)?;
        let cancel = CancellationToken::new();

        let process = {
            let counter = Arc::clone(&counter);
            let latency = Arc::clone(&self.latency);
            let sleeper = Arc::clone(&self.sleeper);
            let cancel = cancel.clone();
            move |item: &WorkItem<P>| {
                let result = process_item(&*counter, &*latency, &*sleeper, item);
                if matches!(&result, Err(e) if e.is_fatal()) {
                    cancel.cancel();
                }
                result
            }
        };

        let outcomes = pool.run_with_cancel(items, process, &cancel);
        pool.shutdown();
        let outcomes = outcomes?;

        if let Some(fatal) = outcomes.iter().find_map(|o| match o {
            Err(WorkerFailure::Process(e)) if e.is_fatal() => Some(e.clone()),
            _ => None,
        }) {
            #[cfg(feature = "tracing")]
            tracing::error!("Run aborted: {fatal}");
            return Err(fatal);
        }

        Ok(RunReport {
            outcomes,
            ids_claimed: counter.current()?,
            elapsed: start.elapsed(),
            mode: self.config.execution_mode,
            concurrency: self.config.concurrency,
        })
    }
}

/// The outcome of one [`Runner`] batch.
#[derive(Debug)]
pub struct RunReport<P> {
    outcomes: Vec<WorkOutcome<WorkResult<P>, Error>>,
    ids_claimed: u64,
    elapsed: Duration,
    mode: ExecutionMode,
    concurrency: usize,
}

impl<P> RunReport<P> {
    /// One outcome per payload, in input order.
    pub fn outcomes(&self) -> &[WorkOutcome<WorkResult<P>, Error>] {
        &self.outcomes
    }

    pub fn into_outcomes(self) -> Vec<WorkOutcome<WorkResult<P>, Error>> {
        self.outcomes
    }

    /// Successful results, in input order.
    pub fn results(&self) -> impl Iterator<Item = &WorkResult<P>> {
        self.outcomes.iter().filter_map(|o| o.as_ref().ok())
    }

    /// Failed items as `(input index, failure)`.
    pub fn failures(&self) -> impl Iterator<Item = (usize, &WorkerFailure<Error>)> {
        self.outcomes
            .iter()
            .enumerate()
            .filter_map(|(i, o)| o.as_ref().err().map(|e| (i, e)))
    }

    /// Returns `true` if every item succeeded.
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(|o| o.is_ok())
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Number of ids handed out by the counter during the run.
    pub const fn ids_claimed(&self) -> u64 {
        self.ids_claimed
    }

    /// Wall time from submission until every worker was released.
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub const fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }
}

impl<P: fmt::Display> fmt::Display for RunReport<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, outcome) in self.outcomes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match outcome {
                Ok(result) => write!(f, "{result}")?,
                Err(failure) => write!(f, "<{failure}>")?,
            }
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FixedLatency, Latency, LockCounter, ManagedCounter, NoopSleeper};
    use portable_atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Wraps a counter and records every id it hands out.
    struct RecordingCounter<C> {
        inner: C,
        claimed: Mutex<Vec<u64>>,
    }

    impl<C: SharedCounter> RecordingCounter<C> {
        fn new(inner: C) -> Self {
            Self {
                inner,
                claimed: Mutex::new(Vec::new()),
            }
        }

        fn sorted_ids(&self) -> Vec<u64> {
            let mut ids = self.claimed.lock().unwrap().clone();
            ids.sort_unstable();
            ids
        }
    }

    impl<C: SharedCounter> SharedCounter for RecordingCounter<C> {
        fn claim_id(&self) -> Result<u64> {
            let id = self.inner.claim_id()?;
            self.claimed.lock().unwrap().push(id);
            Ok(id)
        }

        fn current(&self) -> Result<u64> {
            self.inner.current()
        }
    }

    /// Hands out ids until `fail_from`, then reports the counter as gone.
    struct FailingCounter {
        inner: LockCounter,
        fail_from: u64,
        calls: AtomicUsize,
    }

    impl SharedCounter for FailingCounter {
        fn claim_id(&self) -> Result<u64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let id = self.inner.claim_id()?;
            if id >= self.fail_from {
                return Err(Error::Synchronization {
                    context: format!("counter lost at id {id}"),
                });
            }
            Ok(id)
        }

        fn current(&self) -> Result<u64> {
            self.inner.current()
        }
    }

    fn quiet_runner(config: PoolConfig) -> Runner<FixedLatency, NoopSleeper> {
        Runner::new(config)
            .unwrap()
            .with_latency(FixedLatency(Latency::from_centis(42)))
            .with_sleeper(NoopSleeper)
    }

    #[test]
    fn abc_without_latency() {
        let config = PoolConfig::new(2).unwrap().with_latency(false);
        let counter = Arc::new(RecordingCounter::new(LockCounter::new()));

        let report = quiet_runner(config)
            .run_with_counter(["A", "B", "C"], counter.clone())
            .unwrap();

        let results: Vec<_> = report.results().cloned().collect();
        assert_eq!(
            results,
            vec![
                WorkResult::new("A", Latency::ZERO),
                WorkResult::new("B", Latency::ZERO),
                WorkResult::new("C", Latency::ZERO),
            ]
        );
        assert_eq!(report.to_string(), "[(A, 0.00), (B, 0.00), (C, 0.00)]");
        assert_eq!(counter.sorted_ids(), vec![0, 1, 2]);
        assert_eq!(report.ids_claimed(), 3);
        assert!(report.is_complete());
    }

    #[test]
    fn ids_cover_every_item_in_both_modes() {
        for mode in ExecutionMode::ALL {
            for concurrency in [1, 3, 10] {
                let config = PoolConfig::new(concurrency).unwrap().with_mode(mode);
                let backing = counter_for(mode).unwrap();
                let counter = Arc::new(RecordingCounter::new(backing));
                let payloads: Vec<char> = ('a'..='z').collect();

                let report = quiet_runner(config)
                    .run_with_counter(payloads.clone(), counter.clone())
                    .unwrap();

                assert_eq!(report.len(), payloads.len());
                assert_eq!(counter.sorted_ids(), (0..26).collect::<Vec<u64>>());
                assert_eq!(report.mode(), mode);
                assert_eq!(report.concurrency(), concurrency);
            }
        }
    }

    #[test]
    fn latency_is_applied_when_enabled() {
        let config = PoolConfig::new(4).unwrap();
        let report = quiet_runner(config).run(vec!['x', 'y']).unwrap();
        assert!(
            report
                .results()
                .all(|r| r.latency() == Latency::from_centis(42))
        );
    }

    #[test]
    fn repeated_runs_match_positionally() {
        let config = PoolConfig::new(5).unwrap();
        let runner = Runner::new(config).unwrap().with_sleeper(NoopSleeper);
        let payloads: Vec<char> = "parallel".chars().collect();

        let first = runner.run(payloads.clone()).unwrap();
        let second = runner.run(payloads.clone()).unwrap();

        assert_eq!(first.len(), second.len());
        let first: Vec<char> = first.results().map(|r| *r.payload()).collect();
        let second: Vec<char> = second.results().map(|r| *r.payload()).collect();
        assert_eq!(first, payloads);
        assert_eq!(second, payloads);
    }

    #[test]
    fn empty_payloads_produce_an_empty_report() {
        let config = PoolConfig::new(3).unwrap();
        let report = quiet_runner(config).run(Vec::<char>::new()).unwrap();
        assert!(report.is_empty());
        assert_eq!(report.ids_claimed(), 0);
        assert_eq!(report.to_string(), "[]");
    }

    #[test]
    fn torn_down_counter_aborts_the_run() {
        let config = PoolConfig::new(2).unwrap().with_mode(ExecutionMode::Isolated);
        let counter = ManagedCounter::spawn().unwrap();
        counter.shutdown().unwrap();

        let err = quiet_runner(config)
            .run_with_counter(vec!['A', 'B', 'C'], Arc::new(counter))
            .unwrap_err();

        assert!(matches!(err, Error::Synchronization { .. }));
    }

    #[test]
    fn counter_failure_mid_run_cancels_the_rest() {
        let config = PoolConfig::new(1).unwrap().with_latency(false);
        let counter = Arc::new(FailingCounter {
            inner: LockCounter::new(),
            fail_from: 2,
            calls: AtomicUsize::new(0),
        });
        let payloads: Vec<u32> = (0..20).collect();

        let err = quiet_runner(config)
            .run_with_counter(payloads, counter.clone())
            .unwrap_err();

        assert!(matches!(err, Error::Synchronization { .. }));
        // Items 0 and 1 succeed, item 2 fails, the other 17 never start.
        assert_eq!(counter.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let config = PoolConfig {
            concurrency: 0,
            ..PoolConfig::default()
        };
        assert!(matches!(
            Runner::new(config),
            Err(Error::Configuration { .. })
        ));
    }
}
