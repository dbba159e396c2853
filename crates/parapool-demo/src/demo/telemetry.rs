//! Console logging for the demo.
//!
//! Events from `parapool` (built with its `tracing` feature) and from the demo
//! itself are written to stderr through `tracing_subscriber::fmt`. The level is
//! read from `RUST_LOG` and defaults to `info`, which shows every worker's
//! start and finish line.
//!
//! ```bash
//! RUST_LOG=debug cargo run -p parapool-demo -- --log-format json
//! ```

use super::config::LogFormat;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry(format: LogFormat) -> anyhow::Result<()> {
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_thread_ids(true)
        .with_target(false)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339());

    let layer = match format {
        LogFormat::Pretty => layer.compact().boxed(),
        LogFormat::Json => layer.json().flatten_event(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(layer)
        .try_init()?;

    Ok(())
}
