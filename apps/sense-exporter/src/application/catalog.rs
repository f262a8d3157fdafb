//! Device Catalog Fetcher
//!
//! Bounded wrapper around the device listing of a monitor.

use crate::domain::catalog::DeviceCatalog;
use crate::domain::model::MonitorId;

use super::context::CollectContext;
use super::ports::{ClientError, SenseClient};

/// Fetch the device catalog of `monitor`, honouring the context's
/// cancellation and deadline. Merged devices are not expanded.
pub async fn fetch_catalog(
    client: &dyn SenseClient,
    ctx: &CollectContext,
    monitor: MonitorId,
) -> Result<DeviceCatalog, ClientError> {
    let devices = ctx
        .run(client.get_devices(ctx.token(), monitor, false))
        .await?;
    tracing::debug!(monitor_id = %monitor, devices = devices.len(), "Fetched device catalog");
    Ok(DeviceCatalog::new(devices))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::application::testing::FakeClient;
    use crate::domain::model::Device;

    #[tokio::test]
    async fn builds_lookup_from_devices() {
        let client = FakeClient::new(1).with_devices(vec![
            Device::new("d1", "Fridge"),
            Device::new("d2", "Oven"),
        ]);
        let ctx = CollectContext::new(CancellationToken::new());

        let catalog = fetch_catalog(&client, &ctx, MonitorId(1)).await.unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("d2").map(|d| d.name.as_str()), Some("Oven"));
    }

    #[tokio::test]
    async fn propagates_upstream_error() {
        let client = FakeClient::new(1).with_catalog_error("monitor unknown");
        let ctx = CollectContext::new(CancellationToken::new());

        let err = fetch_catalog(&client, &ctx, MonitorId(1)).await.unwrap_err();

        assert!(matches!(err, ClientError::Status { status: 404, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_catalog_hits_deadline() {
        let client = FakeClient::new(1).with_catalog_delay(Duration::from_secs(60));
        let ctx = CollectContext::new(CancellationToken::new()).child(Duration::from_secs(1));

        let err = fetch_catalog(&client, &ctx, MonitorId(1)).await.unwrap_err();

        assert!(matches!(err, ClientError::DeadlineExceeded));
    }
}
