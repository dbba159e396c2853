use crate::{Error, Result};
use core::fmt;

/// Default number of workers in a pool.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// How workers share state with each other.
///
/// The choice only changes the backing of the [`SharedCounter`]; the pool and
/// the processing function behave identically in both modes.
///
/// [`SharedCounter`]: crate::SharedCounter
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ExecutionMode {
    /// Thread-style: workers share one memory space and the counter is a
    /// mutex-guarded integer ([`LockCounter`]).
    ///
    /// [`LockCounter`]: crate::LockCounter
    #[default]
    Shared,
    /// Process-style: workers never touch the counter's memory. The counter is
    /// owned by a manager thread and reached through message passing
    /// ([`ManagedCounter`]).
    ///
    /// [`ManagedCounter`]: crate::ManagedCounter
    Isolated,
}

impl ExecutionMode {
    /// Both modes, in the order they are usually compared.
    pub const ALL: [Self; 2] = [Self::Shared, Self::Isolated];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shared => "shared",
            Self::Isolated => "isolated",
        }
    }

    /// Human readable name of the strategy, e.g. for report headings.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Shared => "Threading",
            Self::Isolated => "Processing",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings for one pool run.
///
/// Construct with [`PoolConfig::new`] (validated) or [`Default`], then adjust
/// with the `with_*` methods.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolConfig {
    /// Number of worker threads. Must be at least 1.
    pub concurrency: usize,
    /// Whether items sleep for a random latency while being processed.
    pub simulate_latency: bool,
    /// Counter backing and worker isolation.
    pub execution_mode: ExecutionMode,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            simulate_latency: true,
            execution_mode: ExecutionMode::default(),
        }
    }
}

impl PoolConfig {
    /// Creates a configuration with `concurrency` workers and defaults for
    /// everything else.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `concurrency` is zero.
    pub fn new(concurrency: usize) -> Result<Self> {
        let config = Self {
            concurrency,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub const fn with_latency(mut self, simulate_latency: bool) -> Self {
        self.simulate_latency = simulate_latency;
        self
    }

    #[must_use]
    pub const fn with_mode(mut self, execution_mode: ExecutionMode) -> Self {
        self.execution_mode = execution_mode;
        self
    }

    /// Checks the configuration before any worker is spawned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `concurrency` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::Configuration {
                reason: "concurrency must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
