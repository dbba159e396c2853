mod interface;
mod random;
mod sleeper;

pub use interface::*;
pub use random::*;
pub use sleeper::*;

use core::{fmt, time::Duration};

/// A simulated processing delay, stored at 0.01 second granularity.
///
/// Values are clamped to the inclusive range `[0.00, 2.00]` seconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Latency {
    centis: u16,
}

impl Latency {
    /// No delay.
    pub const ZERO: Self = Self { centis: 0 };

    /// The largest delay a [`LatencySource`] may produce (2.00 seconds).
    pub const MAX: Self = Self {
        centis: Self::MAX_CENTIS,
    };

    pub const MAX_CENTIS: u16 = 200;

    /// Creates a latency of `centis` hundredths of a second, clamped to
    /// [`Latency::MAX`].
    pub const fn from_centis(centis: u16) -> Self {
        if centis > Self::MAX_CENTIS {
            Self::MAX
        } else {
            Self { centis }
        }
    }

    pub const fn as_centis(self) -> u16 {
        self.centis
    }

    pub const fn is_zero(self) -> bool {
        self.centis == 0
    }

    pub fn as_secs_f64(self) -> f64 {
        f64::from(self.centis) / 100.0
    }

    pub const fn as_duration(self) -> Duration {
        Duration::from_millis(self.centis as u64 * 10)
    }
}

impl fmt::Display for Latency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.as_secs_f64())
    }
}
