//! Metric Descriptors and Samples
//!
//! The fixed set of gauges the exporter can emit. The set is built at
//! compile time and shared by reference with every collector, so it needs
//! no synchronization.
//!
//! # Metrics
//!
//! | Name | Labels |
//! |------|--------|
//! | `sense_monitor_up` | |
//! | `sense_scrape_time_seconds` | |
//! | `sense_device_watts` | `device_id`, `name`, `type`, `make`, `model` |
//! | `sense_monitor_volts` | `channel` |
//! | `sense_monitor_watts` | |
//! | `sense_monitor_hz` | |
//! | `sense_device_active` | `device_id`, `name`, `type`, `make`, `model` |
//! | `sense_device_online` | `device_id`, `name`, `type`, `make`, `model` |

/// Labels attached to per-device metrics.
pub const DEVICE_LABELS: &[&str] = &["device_id", "name", "type", "make", "model"];

/// Label attached to voltage readings.
pub const CHANNEL_LABELS: &[&str] = &["channel"];

/// Metric descriptor: name, help text and label names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricDesc {
    /// Fully qualified metric name.
    pub name: &'static str,
    /// Help text rendered as `# HELP`.
    pub help: &'static str,
    /// Label names, in the order values are given to [`Sample::new`].
    pub labels: &'static [&'static str],
}

impl MetricDesc {
    /// Create a descriptor.
    #[must_use]
    pub const fn new(
        name: &'static str,
        help: &'static str,
        labels: &'static [&'static str],
    ) -> Self {
        Self { name, help, labels }
    }
}

/// The descriptors of every metric a monitor collection can produce.
#[derive(Debug)]
pub struct Descriptors {
    /// Whether the monitor was reachable.
    pub up: MetricDesc,
    /// Duration of the collection.
    pub scrape_time: MetricDesc,
    /// Power per device.
    pub device_watts: MetricDesc,
    /// Voltage per channel.
    pub monitor_volts: MetricDesc,
    /// Total power.
    pub monitor_watts: MetricDesc,
    /// Line frequency.
    pub monitor_hz: MetricDesc,
    /// Device activity.
    pub device_active: MetricDesc,
    /// Device connectivity.
    pub device_online: MetricDesc,
}

impl Descriptors {
    const fn new() -> Self {
        Self {
            up: MetricDesc::new(
                "sense_monitor_up",
                "Whether a Sense monitor is online and accessible to us",
                &[],
            ),
            scrape_time: MetricDesc::new(
                "sense_scrape_time_seconds",
                "Time spent scraping Sense",
                &[],
            ),
            device_watts: MetricDesc::new(
                "sense_device_watts",
                "Current power usage of a device",
                DEVICE_LABELS,
            ),
            monitor_volts: MetricDesc::new(
                "sense_monitor_volts",
                "Current voltage detected by the Sense monitor",
                CHANNEL_LABELS,
            ),
            monitor_watts: MetricDesc::new(
                "sense_monitor_watts",
                "Current power usage detected by the Sense monitor",
                &[],
            ),
            monitor_hz: MetricDesc::new(
                "sense_monitor_hz",
                "Current frequency detected by the Sense monitor",
                &[],
            ),
            device_active: MetricDesc::new(
                "sense_device_active",
                "Whether a Sense device is active",
                DEVICE_LABELS,
            ),
            device_online: MetricDesc::new(
                "sense_device_online",
                "Whether a Sense device is online",
                DEVICE_LABELS,
            ),
        }
    }

    /// Every descriptor, in a stable order.
    #[must_use]
    pub const fn all(&self) -> [&MetricDesc; 8] {
        [
            &self.up,
            &self.scrape_time,
            &self.device_watts,
            &self.monitor_volts,
            &self.monitor_watts,
            &self.monitor_hz,
            &self.device_active,
            &self.device_online,
        ]
    }
}

/// The descriptor set used by every collector.
pub static DESCRIPTORS: Descriptors = Descriptors::new();

// =============================================================================
// Samples
// =============================================================================

/// One observed value of a metric.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Descriptor this sample belongs to.
    pub desc: &'static MetricDesc,
    /// Label values, parallel to `desc.labels`.
    pub label_values: Vec<String>,
    /// Observed value.
    pub value: f64,
}

impl Sample {
    /// Create a sample.
    ///
    /// `label_values` must line up with the descriptor's label names.
    #[must_use]
    pub fn new(desc: &'static MetricDesc, value: f64, label_values: Vec<String>) -> Self {
        debug_assert_eq!(
            desc.labels.len(),
            label_values.len(),
            "label cardinality mismatch for {}",
            desc.name
        );
        Self {
            desc,
            label_values,
            value,
        }
    }

    /// Create a sample for a metric without labels.
    #[must_use]
    pub fn unlabeled(desc: &'static MetricDesc, value: f64) -> Self {
        Self::new(desc, value, Vec::new())
    }

    /// Metric name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.desc.name
    }

    /// Value of the named label, if the descriptor has it.
    #[must_use]
    pub fn label(&self, name: &str) -> Option<&str> {
        self.desc
            .labels
            .iter()
            .position(|l| *l == name)
            .and_then(|i| self.label_values.get(i))
            .map(String::as_str)
    }

    /// Label name/value pairs.
    pub fn labels(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.desc
            .labels
            .iter()
            .copied()
            .zip(self.label_values.iter().map(String::as_str))
    }
}

/// Append-only output of one collection.
#[derive(Debug, Default)]
pub struct SampleSink {
    samples: Vec<Sample>,
}

impl SampleSink {
    /// Create an empty sink.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            samples: Vec::new(),
        }
    }

    /// Emit a sample.
    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    /// Number of samples emitted so far.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether nothing has been emitted.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples emitted so far.
    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Consume the sink.
    #[must_use]
    pub fn into_samples(self) -> Vec<Sample> {
        self.samples
    }
}
