use crate::{Latency, Sleeper};

/// Blocks the current thread with [`std::thread::sleep`].
#[derive(Default, Clone, Copy, Debug)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, latency: Latency) {
        if !latency.is_zero() {
            std::thread::sleep(latency.as_duration());
        }
    }
}

/// Returns immediately. Useful for deterministic tests.
#[derive(Default, Clone, Copy, Debug)]
pub struct NoopSleeper;

impl Sleeper for NoopSleeper {
    fn sleep(&self, _latency: Latency) {}
}
