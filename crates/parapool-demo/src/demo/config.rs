use anyhow::bail;
use clap::{Parser, ValueEnum};
use parapool::{DEFAULT_CONCURRENCY, ExecutionMode, PoolConfig};

/// The demo's default work items: A-Z, a-z and 1-9.
pub const DEFAULT_ITEMS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz123456789";

/// Which execution modes to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeSelection {
    /// Thread-style only.
    Shared,
    /// Process-style only.
    Isolated,
    /// Thread-style, then process-style.
    Both,
}

impl ModeSelection {
    pub fn modes(self) -> Vec<ExecutionMode> {
        match self {
            Self::Shared => vec![ExecutionMode::Shared],
            Self::Isolated => vec![ExecutionMode::Isolated],
            Self::Both => ExecutionMode::ALL.to_vec(),
        }
    }
}

/// Which demo to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Every worker runs the same function over the item list.
    Items,
    /// Three different functions share one pool.
    Functions,
}

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Runtime configuration for the `parapool-demo` binary.
///
/// All values are parsed from CLI arguments or environment variables (a `.env`
/// file is loaded first), with defaults that reproduce the classic comparison:
/// 61 items, 10 workers, random latency, both modes.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "parapool-demo",
    version,
    about = "Compare thread-style and process-style worker pools"
)]
pub struct CliArgs {
    /// Number of workers in each pool.
    ///
    /// At most this many items are processed at the same time.
    ///
    /// Environment variable: `CONCURRENCY`
    #[arg(long, env = "CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Skip the random per-item latency (0.00 to 2.00 seconds).
    ///
    /// Environment variable: `NO_LATENCY`
    #[arg(long, env = "NO_LATENCY", default_value_t = false)]
    pub no_latency: bool,

    /// Execution modes to compare.
    ///
    /// Environment variable: `EXECUTION_MODE`
    #[arg(long, env = "EXECUTION_MODE", value_enum, default_value_t = ModeSelection::Both)]
    pub mode: ModeSelection,

    /// Demo scenario.
    ///
    /// Environment variable: `SCENARIO`
    #[arg(long, env = "SCENARIO", value_enum, default_value_t = Scenario::Items)]
    pub scenario: Scenario,

    /// Work items, one per character. Whitespace and commas are ignored.
    ///
    /// Environment variable: `ITEMS`
    #[arg(long, env = "ITEMS", default_value = DEFAULT_ITEMS)]
    pub items: String,

    /// Print each run's report as JSON instead of a results list.
    ///
    /// Environment variable: `JSON_OUTPUT`
    #[arg(long, env = "JSON_OUTPUT", default_value_t = false)]
    pub json: bool,

    /// Log output format.
    ///
    /// Environment variable: `LOG_FORMAT`
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub concurrency: usize,
    pub simulate_latency: bool,
    pub modes: Vec<ExecutionMode>,
    pub scenario: Scenario,
    pub items: Vec<char>,
    pub json: bool,
    pub log_format: LogFormat,
}

impl DemoConfig {
    /// The pool configuration for one run in `mode`.
    pub fn pool_config(&self, mode: ExecutionMode) -> PoolConfig {
        PoolConfig {
            concurrency: self.concurrency,
            simulate_latency: self.simulate_latency,
            execution_mode: mode,
        }
    }
}

impl TryFrom<CliArgs> for DemoConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.concurrency == 0 {
            bail!("CONCURRENCY must be greater than 0");
        }

        let items = parse_items(&args.items);

        Ok(Self {
            concurrency: args.concurrency,
            simulate_latency: !args.no_latency,
            modes: args.mode.modes(),
            scenario: args.scenario,
            items,
            json: args.json,
            log_format: args.log_format,
        })
    }
}

fn parse_items(raw: &str) -> Vec<char> {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect()
}
