//! Tokio runtime statistics.

use tokio::runtime::Handle;

use crate::application::ports::SampleSource;
use crate::domain::metrics::{MetricDesc, Sample};

/// Number of worker threads.
pub static WORKERS: MetricDesc = MetricDesc::new(
    "tokio_runtime_workers",
    "Number of worker threads used by the runtime",
    &[],
);

/// Number of alive tasks.
pub static ALIVE_TASKS: MetricDesc = MetricDesc::new(
    "tokio_runtime_alive_tasks",
    "Number of tasks currently alive in the runtime",
    &[],
);

/// Depth of the global injection queue.
pub static GLOBAL_QUEUE_DEPTH: MetricDesc = MetricDesc::new(
    "tokio_runtime_global_queue_depth",
    "Number of tasks waiting in the global queue",
    &[],
);

/// Reads the metrics of the runtime the scrape runs on.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuntimeCollector;

impl SampleSource for RuntimeCollector {
    fn name(&self) -> &'static str {
        "runtime"
    }

    #[allow(clippy::cast_precision_loss)]
    fn collect(&self) -> Vec<Sample> {
        let Ok(handle) = Handle::try_current() else {
            tracing::debug!("No tokio runtime, skipping runtime metrics");
            return Vec::new();
        };
        let metrics = handle.metrics();
        vec![
            Sample::unlabeled(&WORKERS, metrics.num_workers() as f64),
            Sample::unlabeled(&ALIVE_TASKS, metrics.num_alive_tasks() as f64),
            Sample::unlabeled(&GLOBAL_QUEUE_DEPTH, metrics.global_queue_depth() as f64),
        ]
    }
}
