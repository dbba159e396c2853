use crate::{Latency, LatencySource, Result, SharedCounter, Sleeper, WorkItem, WorkResult};
use core::fmt;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Processes one [`WorkItem`] on the calling worker.
///
/// 1. Claims a unique id from `counter`. The id only labels progress output.
/// 2. If the item simulates latency, samples a delay from `latency` and
///    suspends through `sleeper`. The counter is not held while sleeping.
/// 3. Returns the `(payload, latency)` pair.
///
/// Safe to call from every worker at once: the only shared state touched is
/// the counter, through its synchronized interface.
///
/// # Errors
///
/// Returns the counter's error if the id cannot be claimed. Such errors are
/// fatal ([`crate::Error::is_fatal`]).
///
/// # Example
/// ```
/// use parapool::{FixedLatency, Latency, LockCounter, NoopSleeper, SharedCounter, WorkItem, process_item};
///
/// let counter = LockCounter::new();
/// let latency = FixedLatency(Latency::from_centis(25));
/// let result = process_item(&counter, &latency, &NoopSleeper, &WorkItem::new('A', true)).unwrap();
/// assert_eq!(result.latency().as_centis(), 25);
/// assert_eq!(counter.current().unwrap(), 1);
/// ```
#[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all))]
pub fn process_item<P, C, L, S>(
    counter: &C,
    latency: &L,
    sleeper: &S,
    item: &WorkItem<P>,
) -> Result<WorkResult<P>>
where
    P: Clone + fmt::Display,
    C: SharedCounter + ?Sized,
    L: LatencySource + ?Sized,
    S: Sleeper + ?Sized,
{
    let _id = counter.claim_id()?;

    #[cfg(feature = "tracing")]
    tracing::info!("Started worker #{_id}");

    let applied = if item.simulate_latency() {
        let delay = latency.sample();
        sleeper.sleep(delay);
        delay
    } else {
        Latency::ZERO
    };

    #[cfg(feature = "tracing")]
    tracing::info!("Worker #{_id} received item: {}", item.payload());

    Ok(WorkResult::new(item.payload().clone(), applied))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, FixedLatency, LockCounter, ManagedCounter, NoopSleeper};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSleeper {
        slept: Mutex<Vec<Latency>>,
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, latency: Latency) {
            self.slept.lock().unwrap().push(latency);
        }
    }

    #[test]
    fn no_latency_skips_the_sleeper() {
        let counter = LockCounter::new();
        let sleeper = RecordingSleeper::default();
        let latency = FixedLatency(Latency::from_centis(90));

        let result = process_item(&counter, &latency, &sleeper, &WorkItem::new('A', false)).unwrap();

        assert_eq!(result, WorkResult::new('A', Latency::ZERO));
        assert!(sleeper.slept.lock().unwrap().is_empty());
        assert_eq!(counter.current().unwrap(), 1);
    }

    #[test]
    fn latency_is_slept_and_reported() {
        let counter = LockCounter::new();
        let sleeper = RecordingSleeper::default();
        let latency = FixedLatency(Latency::from_centis(90));

        let result = process_item(&counter, &latency, &sleeper, &WorkItem::new("x", true)).unwrap();

        assert_eq!(result.latency(), Latency::from_centis(90));
        assert_eq!(*sleeper.slept.lock().unwrap(), vec![Latency::from_centis(90)]);
    }

    #[test]
    fn counter_failure_propagates() {
        let counter = ManagedCounter::spawn().unwrap();
        counter.shutdown().unwrap();

        let err = process_item(
            &counter,
            &FixedLatency(Latency::ZERO),
            &NoopSleeper,
            &WorkItem::new('A', true),
        )
        .unwrap_err();

        assert!(matches!(err, Error::Synchronization { .. }));
    }
}
