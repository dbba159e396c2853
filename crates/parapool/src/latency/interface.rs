use crate::Latency;

/// A source of simulated latencies.
///
/// This abstraction allows you to plug in a random source for demos or a fixed
/// source in tests.
///
/// # Example
/// ```
/// use parapool::{Latency, LatencySource};
///
/// struct HalfSecond;
/// impl LatencySource for HalfSecond {
///     fn sample(&self) -> Latency {
///         Latency::from_centis(50)
///     }
/// }
///
/// assert_eq!(HalfSecond.sample().as_centis(), 50);
/// ```
pub trait LatencySource: Send + Sync {
    /// Returns the next delay, within `[Latency::ZERO, Latency::MAX]`.
    fn sample(&self) -> Latency;
}

/// Suspends the calling worker.
///
/// Injected so tests can skip real sleeping entirely.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, latency: Latency);
}
