use crate::Latency;
use core::fmt;

/// One unit of input: an opaque payload and whether to simulate latency while
/// processing it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorkItem<P> {
    payload: P,
    simulate_latency: bool,
}

impl<P> WorkItem<P> {
    pub const fn new(payload: P, simulate_latency: bool) -> Self {
        Self {
            payload,
            simulate_latency,
        }
    }

    pub const fn payload(&self) -> &P {
        &self.payload
    }

    pub const fn simulate_latency(&self) -> bool {
        self.simulate_latency
    }
}

/// The `(payload, latency)` pair produced for each [`WorkItem`].
///
/// `latency` is the delay that was actually applied, [`Latency::ZERO`] when the
/// item did not simulate latency.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorkResult<P> {
    payload: P,
    latency: Latency,
}

impl<P> WorkResult<P> {
    pub const fn new(payload: P, latency: Latency) -> Self {
        Self { payload, latency }
    }

    pub const fn payload(&self) -> &P {
        &self.payload
    }

    pub const fn latency(&self) -> Latency {
        self.latency
    }

    pub fn into_parts(self) -> (P, Latency) {
        (self.payload, self.latency)
    }
}

impl<P: fmt::Display> fmt::Display for WorkResult<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.payload, self.latency)
    }
}
