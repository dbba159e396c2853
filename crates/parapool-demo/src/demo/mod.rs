//! Demo scenarios and their supporting configuration and telemetry.
//!
//! ## Structure
//!
//! - [`config`] - CLI/env configuration (`CliArgs` -> `DemoConfig`).
//! - [`telemetry`] - `tracing` subscriber setup.
//! - [`items`] - every worker runs the same function over a list of items.
//! - [`functions`] - different workers run different functions.

pub mod config;
pub mod functions;
pub mod items;
pub mod telemetry;

use core::time::Duration;
use parapool::ExecutionMode;

/// Wall time of one scenario run in one execution mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timing {
    pub mode: ExecutionMode,
    pub elapsed: Duration,
}

/// Short noun for the final comparison table.
pub const fn strategy_noun(mode: ExecutionMode) -> &'static str {
    match mode {
        ExecutionMode::Shared => "Thread",
        ExecutionMode::Isolated => "Process",
    }
}

pub fn print_timings(timings: &[Timing]) {
    println!();
    println!("Final Results");
    for timing in timings {
        println!(
            "Parallel {} Execution Time: {:.6}",
            strategy_noun(timing.mode),
            timing.elapsed.as_secs_f64()
        );
    }
    println!();
}
