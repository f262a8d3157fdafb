//! Monitor Collector
//!
//! Produces the samples of one monitor for one scrape: device catalog,
//! then the realtime feed, then zero watts for every catalogued device the
//! feed never reported. `sense_monitor_up` and `sense_scrape_time_seconds`
//! are emitted on every path, including failures and deadline expiry.
//!
//! Samples emitted before a failure are kept; the monitor is still reported
//! as down.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::Instrument;

use crate::domain::aggregator::StreamAggregator;
use crate::domain::metrics::{Descriptors, Sample, SampleSink};
use crate::domain::model::{MonitorId, StreamMessage};

use super::catalog::fetch_catalog;
use super::context::CollectContext;
use super::ports::{ClientError, SenseClient, Stopped};

/// Result of one collection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollectionOutcome {
    /// Whether both the catalog fetch and the feed succeeded.
    pub success: bool,
    /// Wall-clock time spent.
    pub elapsed: Duration,
}

/// Everything one collection produced.
#[derive(Debug, Clone)]
pub struct MonitorReport {
    /// Monitor the samples belong to.
    pub monitor: MonitorId,
    /// Success flag and duration.
    pub outcome: CollectionOutcome,
    /// Emitted samples, in emission order.
    pub samples: Vec<Sample>,
}

/// Collector for one (client, monitor) pair, scoped to one scrape.
pub struct MonitorCollector {
    client: Arc<dyn SenseClient>,
    monitor: MonitorId,
    timeout: Duration,
    descs: &'static Descriptors,
}

impl std::fmt::Debug for MonitorCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorCollector")
            .field("account_id", &self.client.account_id())
            .field("monitor", &self.monitor)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl MonitorCollector {
    /// Create a collector. A zero timeout disables the deadline.
    #[must_use]
    pub fn new(
        client: Arc<dyn SenseClient>,
        monitor: MonitorId,
        timeout: Duration,
        descs: &'static Descriptors,
    ) -> Self {
        Self {
            client,
            monitor,
            timeout,
            descs,
        }
    }

    /// Monitor this collector reads.
    #[must_use]
    pub const fn monitor(&self) -> MonitorId {
        self.monitor
    }

    /// Run one collection under `parent`.
    pub async fn collect(&self, parent: &CollectContext) -> MonitorReport {
        let span = tracing::info_span!(
            "collect_monitor",
            account_id = self.client.account_id(),
            user_id = self.client.user_id(),
            monitor_id = %self.monitor,
            error = tracing::field::Empty,
        );

        async {
            tracing::debug!("Collecting from monitor");
            let ctx = parent.child(self.timeout);
            let _cancel_guard = ctx.cancel_on_drop();
            let start = Instant::now();
            let mut sink = SampleSink::new();

            let result = self.collect_into(&ctx, &mut sink).await;
            if let Err(e) = &result {
                tracing::Span::current().record("error", tracing::field::display(e));
                tracing::warn!(error = %e, "Monitor collection failed");
            }

            let outcome = CollectionOutcome {
                success: result.is_ok(),
                elapsed: start.elapsed(),
            };
            sink.push(Sample::unlabeled(
                &self.descs.up,
                if outcome.success { 1.0 } else { 0.0 },
            ));
            sink.push(Sample::unlabeled(
                &self.descs.scrape_time,
                outcome.elapsed.as_secs_f64(),
            ));
            tracing::info!(
                elapsed_ms = outcome.elapsed.as_millis(),
                success = outcome.success,
                "Monitor collection completed"
            );

            MonitorReport {
                monitor: self.monitor,
                outcome,
                samples: sink.into_samples(),
            }
        }
        .instrument(span)
        .await
    }

    async fn collect_into(
        &self,
        ctx: &CollectContext,
        sink: &mut SampleSink,
    ) -> Result<(), ClientError> {
        let catalog = fetch_catalog(self.client.as_ref(), ctx, self.monitor).await?;

        let mut aggregator = StreamAggregator::new(self.descs, &catalog);
        let streamed = {
            let mut on_message = |msg: StreamMessage| aggregator.handle(msg, sink);
            ctx.run(self.client.stream(ctx.token(), self.monitor, &mut on_message))
                .await
        };
        tracing::debug!(state = ?aggregator.state(), "Realtime feed finished");

        for device in catalog.iter() {
            if !aggregator.saw_watts(&device.id) {
                sink.push(Sample::new(
                    &self.descs.device_watts,
                    0.0,
                    catalog.device_labels(&device.id),
                ));
            }
        }

        streamed.map(|Stopped| ())
    }
}
