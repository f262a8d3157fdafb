//! Prometheus Exposition
//!
//! Renders one scrape into the Prometheus text format. Every scrape gets a
//! fresh recorder, so nothing survives from one request to the next and
//! monitors that disappear from an account stop being reported at once.
//!
//! Samples of a monitor carry an extra `monitor` label; process-level
//! samples are rendered as they are.

pub mod process;
pub mod runtime;

use std::collections::HashSet;

use metrics::{Label, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::application::scrape::ScrapeResult;
use crate::domain::metrics::{MetricDesc, Sample};

pub use process::ProcessCollector;
pub use runtime::RuntimeCollector;

/// Content type of the rendered body.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Label added to every sample of a monitor.
pub const MONITOR_LABEL: &str = "monitor";

/// Render a scrape. `advertised` descriptors are described even when no
/// sample of theirs was emitted.
#[must_use]
pub fn render(result: &ScrapeResult, advertised: &[&'static MetricDesc]) -> String {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();

    metrics::with_local_recorder(&recorder, || {
        let mut described = HashSet::new();
        for desc in advertised {
            describe(desc, &mut described);
        }

        for report in &result.monitors {
            let monitor = report.monitor.to_string();
            for sample in &report.samples {
                describe(sample.desc, &mut described);
                record(sample, Some(&monitor));
            }
        }

        for sample in &result.runtime {
            describe(sample.desc, &mut described);
            record(sample, None);
        }
    });

    handle.render()
}

fn describe(desc: &'static MetricDesc, described: &mut HashSet<&'static str>) {
    if described.insert(desc.name) {
        describe_gauge!(desc.name, desc.help);
    }
}

fn record(sample: &Sample, monitor: Option<&str>) {
    let mut labels: Vec<Label> = sample
        .labels()
        .map(|(name, value)| Label::new(name, value.to_string()))
        .collect();
    if let Some(monitor) = monitor {
        labels.push(Label::new(MONITOR_LABEL, monitor.to_string()));
    }
    gauge!(sample.desc.name, labels).set(sample.value);
}

// =============================================================================
// Tests
// =============================================================================
