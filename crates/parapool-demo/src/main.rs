#![doc = include_str!("../README.md")]

mod demo;

use clap::Parser;
use demo::config::{CliArgs, DemoConfig, Scenario};
use demo::telemetry::init_telemetry;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = DemoConfig::try_from(args)?;

    init_telemetry(config.log_format)?;
    log_startup_info(&config);

    println!("Starting program.");
    let timings = match config.scenario {
        Scenario::Items => demo::items::run(&config)?,
        Scenario::Functions => demo::functions::run(&config)?,
    };
    demo::print_timings(&timings);
    println!("Terminating program.");

    Ok(())
}

fn log_startup_info(config: &DemoConfig) {
    if cfg!(debug_assertions) {
        tracing::debug!("Starting demo with full config: {:#?}", config);
    } else {
        tracing::info!(
            "Starting {:?} demo with {} workers",
            config.scenario,
            config.concurrency
        );
    }
}
