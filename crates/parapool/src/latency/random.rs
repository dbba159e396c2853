use crate::{Latency, LatencySource};
use rand::{Rng, rng};

/// A [`LatencySource`] drawing uniformly from `[0.00, 2.00]` seconds in 0.01
/// steps, using the thread-local RNG.
///
/// Each OS thread has its own RNG instance, so concurrent workers sample
/// without contention. This type is zero-sized and does not store the RNG.
#[derive(Default, Clone, Copy, Debug)]
pub struct RandomLatency;

impl LatencySource for RandomLatency {
    fn sample(&self) -> Latency {
        Latency::from_centis(rng().random_range(0..=Latency::MAX_CENTIS))
    }
}

/// A [`LatencySource`] that always returns the same delay.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedLatency(pub Latency);

impl LatencySource for FixedLatency {
    fn sample(&self) -> Latency {
        self.0
    }
}
