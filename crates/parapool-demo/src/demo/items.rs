//! The item scenario: every worker runs the same function over a list of
//! items, once per selected execution mode.

use super::{Timing, config::DemoConfig};
use parapool::{ExecutionMode, RunReport, Runner, WorkResult};
use serde::Serialize;
use std::time::Instant;

/// JSON view of one run.
#[derive(Serialize)]
struct JsonReport<'a> {
    mode: ExecutionMode,
    concurrency: usize,
    elapsed_secs: f64,
    ids_claimed: u64,
    results: Vec<&'a WorkResult<char>>,
    failures: Vec<JsonFailure>,
}

#[derive(Serialize)]
struct JsonFailure {
    index: usize,
    reason: String,
}

impl<'a> From<&'a RunReport<char>> for JsonReport<'a> {
    fn from(report: &'a RunReport<char>) -> Self {
        Self {
            mode: report.mode(),
            concurrency: report.concurrency(),
            elapsed_secs: report.elapsed().as_secs_f64(),
            ids_claimed: report.ids_claimed(),
            results: report.results().collect(),
            failures: report
                .failures()
                .map(|(index, failure)| JsonFailure {
                    index,
                    reason: failure.to_string(),
                })
                .collect(),
        }
    }
}

/// Runs the item list through a fresh pool per mode and prints each report.
pub fn run(config: &DemoConfig) -> anyhow::Result<Vec<Timing>> {
    let mut timings = Vec::with_capacity(config.modes.len());

    for &mode in &config.modes {
        println!();
        println!("Executing Parallel {} Test:", mode.label());

        let start = Instant::now();
        let runner = Runner::new(config.pool_config(mode))?;
        let report = runner.run(config.items.iter().copied())?;
        let elapsed = start.elapsed();

        if config.json {
            println!("{}", serde_json::to_string_pretty(&JsonReport::from(&report))?);
        } else {
            println!("   {} Results: {report}", mode.label());
        }

        for (index, failure) in report.failures() {
            tracing::warn!("Item {} failed: {failure}", config.items[index]);
        }
        tracing::debug!(
            "{mode} run claimed {} ids in {:.3}s",
            report.ids_claimed(),
            elapsed.as_secs_f64()
        );

        timings.push(Timing { mode, elapsed });
    }

    Ok(timings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parapool::{FixedLatency, Latency, NoopSleeper, PoolConfig};

    #[test]
    fn json_report_lists_results_in_order() {
        let config = PoolConfig::new(2).unwrap();
        let runner = Runner::new(config)
            .unwrap()
            .with_latency(FixedLatency(Latency::from_centis(5)))
            .with_sleeper(NoopSleeper);
        let report = runner.run(['A', 'B', 'C']).unwrap();

        let json = serde_json::to_value(JsonReport::from(&report)).unwrap();

        assert_eq!(json["mode"], "shared");
        assert_eq!(json["concurrency"], 2);
        assert_eq!(json["ids_claimed"], 3);
        let payloads: Vec<_> = json["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["payload"].as_str().unwrap().to_owned())
            .collect();
        assert_eq!(payloads, vec!["A", "B", "C"]);
        assert!(json["failures"].as_array().unwrap().is_empty());
    }
}
