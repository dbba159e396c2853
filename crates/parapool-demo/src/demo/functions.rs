//! The function scenario: different workers run different functions on one
//! shared pool. Function A is scheduled three times, B twice and C once.

use super::{Timing, config::DemoConfig};
use anyhow::Context;
use core::fmt;
use parapool::{
    Latency, LatencySource, RandomLatency, SharedCounter, Sleeper, ThreadSleeper, WorkerFailure,
    WorkerPool, counter_for,
};
use std::{sync::Arc, time::Instant};
use tokio_util::sync::CancellationToken;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Function {
    A,
    B,
    C,
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
        };
        f.write_str(name)
    }
}

const SCHEDULE: [(Function, usize); 3] = [(Function::A, 3), (Function::B, 2), (Function::C, 1)];

/// Every scheduled call, grouped by function.
pub fn schedule() -> Vec<Function> {
    SCHEDULE
        .iter()
        .flat_map(|&(function, times)| std::iter::repeat_n(function, times))
        .collect()
}

/// Runs the schedule once per selected mode.
pub fn run(config: &DemoConfig) -> anyhow::Result<Vec<Timing>> {
    let mut timings = Vec::with_capacity(config.modes.len());

    for &mode in &config.modes {
        println!();
        println!("Executing Parallel {} Test:", mode.label());

        let start = Instant::now();
        let mut pool = WorkerPool::from_config(&config.pool_config(mode))?;
        let counter = counter_for(mode)?;
        let completed = run_schedule(
            &pool,
            Arc::clone(&counter),
            RandomLatency,
            ThreadSleeper,
            config.simulate_latency,
        )
        .with_context(|| format!("{mode} run aborted"));
        pool.shutdown();
        let elapsed = start.elapsed();

        println!(
            "   {} calls finished, {} ids claimed",
            completed?,
            counter.current()?
        );

        timings.push(Timing { mode, elapsed });
    }

    Ok(timings)
}

/// Runs the whole schedule on `pool` and returns how many calls finished.
///
/// A failing counter is fatal: calls not yet started are cancelled and the
/// counter's error is returned.
fn run_schedule<C, L, S>(
    pool: &WorkerPool,
    counter: Arc<C>,
    latency: L,
    sleeper: S,
    simulate_latency: bool,
) -> parapool::Result<usize>
where
    C: SharedCounter + ?Sized + 'static,
    L: LatencySource + 'static,
    S: Sleeper + 'static,
{
    let cancel = CancellationToken::new();
    let process = {
        let cancel = cancel.clone();
        move |function: &Function| {
            let result = call(&*counter, &latency, &sleeper, simulate_latency, *function);
            if matches!(&result, Err(e) if e.is_fatal()) {
                cancel.cancel();
            }
            result
        }
    };

    let mut completed = 0usize;
    for outcome in pool.run_with_cancel(schedule(), process, &cancel)? {
        match outcome {
            Ok(_) => completed += 1,
            Err(WorkerFailure::Process(e)) if e.is_fatal() => return Err(e),
            Err(failure) => tracing::warn!("Call failed: {failure}"),
        }
    }
    Ok(completed)
}

/// One scheduled call: claim an id, announce, optionally sleep, announce again.
fn call<C, L, S>(
    counter: &C,
    latency: &L,
    sleeper: &S,
    simulate_latency: bool,
    function: Function,
) -> parapool::Result<Latency>
where
    C: SharedCounter + ?Sized,
    L: LatencySource + ?Sized,
    S: Sleeper + ?Sized,
{
    let id = counter.claim_id()?;
    tracing::info!("Worker {id} starting function {function}.");
    let delay = if simulate_latency {
        latency.sample()
    } else {
        Latency::ZERO
    };
    sleeper.sleep(delay);
    tracing::info!("Worker {id} ending function {function}.");
    Ok(delay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parapool::{Error, FixedLatency, LockCounter, NoopSleeper};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails every claim after the first `healthy` ones.
    struct FlakyCounter {
        inner: LockCounter,
        healthy: u64,
        calls: AtomicUsize,
    }

    impl SharedCounter for FlakyCounter {
        fn claim_id(&self) -> parapool::Result<u64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let id = self.inner.claim_id()?;
            if id >= self.healthy {
                return Err(Error::Synchronization {
                    context: "counter manager gone".to_string(),
                });
            }
            Ok(id)
        }

        fn current(&self) -> parapool::Result<u64> {
            self.inner.current()
        }
    }

    #[test]
    fn schedule_runs_a_three_times_b_twice_c_once() {
        let schedule = schedule();
        let count = |f| schedule.iter().filter(|&&g| g == f).count();
        assert_eq!(schedule.len(), 6);
        assert_eq!(count(Function::A), 3);
        assert_eq!(count(Function::B), 2);
        assert_eq!(count(Function::C), 1);
    }

    #[test]
    fn call_claims_one_id_and_respects_the_latency_flag() {
        let counter = LockCounter::new();
        let latency = FixedLatency(Latency::from_centis(30));

        let slept = call(&counter, &latency, &NoopSleeper, true, Function::A).unwrap();
        let skipped = call(&counter, &latency, &NoopSleeper, false, Function::B).unwrap();

        assert_eq!(slept, Latency::from_centis(30));
        assert_eq!(skipped, Latency::ZERO);
        assert_eq!(counter.current().unwrap(), 2);
    }

    #[test]
    fn whole_schedule_runs_on_a_small_pool() {
        let pool = WorkerPool::new(2).unwrap();
        let counter = Arc::new(LockCounter::new());

        let completed =
            run_schedule(&pool, Arc::clone(&counter), RandomLatency, NoopSleeper, false).unwrap();

        assert_eq!(completed, 6);
        assert_eq!(counter.current().unwrap(), 6);
    }

    #[test]
    fn counter_failure_cancels_the_remaining_calls() {
        let pool = WorkerPool::new(1).unwrap();
        let counter = Arc::new(FlakyCounter {
            inner: LockCounter::new(),
            healthy: 1,
            calls: AtomicUsize::new(0),
        });

        let err = run_schedule(&pool, Arc::clone(&counter), RandomLatency, NoopSleeper, true)
            .unwrap_err();

        assert!(matches!(err, Error::Synchronization { .. }));
        // The first call succeeds, the second fails, the last four never start.
        assert_eq!(counter.calls.load(Ordering::SeqCst), 2);
    }
}
