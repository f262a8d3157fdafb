//! Scrape Coordinator
//!
//! One scrape: enumerate the monitors of every configured account, run one
//! collector per monitor concurrently, then gather the process-level
//! sources. A failing monitor only affects its own samples.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use crate::domain::metrics::{DESCRIPTORS, Descriptors, MetricDesc, Sample};

use super::collector::{MonitorCollector, MonitorReport};
use super::context::CollectContext;
use super::ports::{SampleSource, SenseClient};

/// Output of one scrape, ready for rendering.
#[derive(Debug, Clone, Default)]
pub struct ScrapeResult {
    /// One report per monitor, in configuration order.
    pub monitors: Vec<MonitorReport>,
    /// Samples from process-level sources, without a monitor label.
    pub runtime: Vec<Sample>,
}

impl ScrapeResult {
    /// Number of monitors whose collection failed.
    #[must_use]
    pub fn failed_monitors(&self) -> usize {
        self.monitors.iter().filter(|r| !r.outcome.success).count()
    }
}

/// Scrape coordinator shared by all HTTP requests.
pub struct Exporter {
    clients: Vec<Arc<dyn SenseClient>>,
    timeout: Duration,
    descs: &'static Descriptors,
    sources: Vec<Box<dyn SampleSource>>,
}

impl std::fmt::Debug for Exporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exporter")
            .field("clients", &self.clients.len())
            .field("timeout", &self.timeout)
            .field(
                "sources",
                &self.sources.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl Exporter {
    /// Create an exporter. A zero timeout disables per-collection deadlines.
    #[must_use]
    pub fn new(clients: Vec<Arc<dyn SenseClient>>, timeout: Duration) -> Self {
        Self {
            clients,
            timeout,
            descs: &DESCRIPTORS,
            sources: Vec::new(),
        }
    }

    /// Add a process-level source gathered on every scrape.
    #[must_use]
    pub fn with_source(mut self, source: Box<dyn SampleSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Number of configured accounts.
    #[must_use]
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Descriptors advertised regardless of configured accounts.
    #[must_use]
    pub const fn describe(&self) -> [&'static MetricDesc; 8] {
        self.descs.all()
    }

    /// Fresh collectors for every (account, monitor) pair.
    #[must_use]
    pub fn collectors(&self) -> Vec<MonitorCollector> {
        self.clients
            .iter()
            .flat_map(|client| {
                client.monitors().into_iter().map(|m| {
                    MonitorCollector::new(Arc::clone(client), m.id, self.timeout, self.descs)
                })
            })
            .collect()
    }

    /// Run one scrape under `ctx`.
    pub async fn scrape(&self, ctx: &CollectContext) -> ScrapeResult {
        let collectors = self.collectors();
        let monitors = join_all(collectors.iter().map(|c| c.collect(ctx))).await;
        let runtime = self.sources.iter().flat_map(|s| s.collect()).collect();

        let result = ScrapeResult { monitors, runtime };
        tracing::debug!(
            monitors = result.monitors.len(),
            failed = result.failed_monitors(),
            "Scrape completed"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::application::testing::{FakeClient, FeedEnd};
    use crate::domain::model::{Device, DeviceStateBatch, RealtimeUpdate, StreamMessage};

    struct FixedSource;

    impl SampleSource for FixedSource {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn collect(&self) -> Vec<Sample> {
            vec![Sample::unlabeled(&DESCRIPTORS.up, 42.0)]
        }
    }

    fn healthy(monitor: i64) -> FakeClient {
        FakeClient::new(monitor)
            .with_devices(vec![Device::new("d1", "Fridge")])
            .with_feed(
                vec![
                    StreamMessage::Realtime(RealtimeUpdate::default()),
                    StreamMessage::DeviceStates(DeviceStateBatch::default()),
                ],
                FeedEnd::Close,
            )
    }

    fn shared(client: FakeClient) -> Arc<dyn SenseClient> {
        Arc::new(client)
    }

    fn root() -> CollectContext {
        CollectContext::new(CancellationToken::new())
    }

    #[tokio::test]
    async fn enumerates_every_monitor_of_every_client() {
        let exporter = Exporter::new(
            vec![
                shared(healthy(1).with_monitors(&[1, 2])),
                shared(healthy(3)),
            ],
            Duration::from_secs(1),
        );

        let result = exporter.scrape(&root()).await;

        assert_eq!(exporter.client_count(), 2);
        let ids: Vec<_> = result.monitors.iter().map(|r| r.monitor.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(result.failed_monitors(), 0);
    }

    #[tokio::test]
    async fn failing_monitor_does_not_affect_others() {
        let exporter = Exporter::new(
            vec![
                shared(FakeClient::new(1).with_catalog_error("down")),
                shared(healthy(2)),
            ],
            Duration::from_secs(1),
        );

        let result = exporter.scrape(&root()).await;

        assert_eq!(result.failed_monitors(), 1);
        assert_eq!(result.monitors[0].samples.len(), 2);
        assert!(result.monitors[1].outcome.success);
        assert!(result.monitors[1]
            .samples
            .iter()
            .any(|s| s.name() == "sense_device_watts"));
    }

    #[tokio::test]
    async fn no_clients_yields_only_runtime_samples() {
        let exporter =
            Exporter::new(Vec::new(), Duration::ZERO).with_source(Box::new(FixedSource));

        let result = exporter.scrape(&root()).await;

        assert!(result.monitors.is_empty());
        assert_eq!(result.runtime.len(), 1);
        assert_eq!(exporter.describe().len(), 8);
    }
}
