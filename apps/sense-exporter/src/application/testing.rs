//! In-memory client used by unit tests.

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::model::{Device, Monitor, MonitorId, StreamMessage};

use super::ports::{ClientError, OnMessage, SenseClient, Stopped};

/// How the fake feed ends once its script is exhausted.
#[derive(Debug, Clone)]
pub enum FeedEnd {
    /// Peer closes the connection.
    Close,
    /// Transport failure.
    Fail(String),
    /// Never ends on its own.
    Hang,
}

/// Scripted client: fixed catalog, fixed feed.
#[derive(Debug)]
pub struct FakeClient {
    monitors: Vec<Monitor>,
    devices: Result<Vec<Device>, String>,
    catalog_delay: Option<Duration>,
    feed: Vec<StreamMessage>,
    feed_end: FeedEnd,
    pub stream_calls: AtomicUsize,
}

impl FakeClient {
    pub fn new(monitor: i64) -> Self {
        Self {
            monitors: vec![Monitor::new(monitor)],
            devices: Ok(Vec::new()),
            catalog_delay: None,
            feed: Vec::new(),
            feed_end: FeedEnd::Close,
            stream_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_monitors(mut self, ids: &[i64]) -> Self {
        self.monitors = ids.iter().map(|id| Monitor::new(*id)).collect();
        self
    }

    pub fn with_devices(mut self, devices: Vec<Device>) -> Self {
        self.devices = Ok(devices);
        self
    }

    pub fn with_catalog_error(mut self, msg: &str) -> Self {
        self.devices = Err(msg.to_string());
        self
    }

    pub const fn with_catalog_delay(mut self, delay: Duration) -> Self {
        self.catalog_delay = Some(delay);
        self
    }

    pub fn with_feed(mut self, feed: Vec<StreamMessage>, end: FeedEnd) -> Self {
        self.feed = feed;
        self.feed_end = end;
        self
    }
}

#[async_trait]
impl SenseClient for FakeClient {
    fn user_id(&self) -> i64 {
        123
    }

    fn account_id(&self) -> i64 {
        456
    }

    fn monitors(&self) -> Vec<Monitor> {
        self.monitors.clone()
    }

    async fn get_devices(
        &self,
        _cancel: &CancellationToken,
        _monitor: MonitorId,
        _include_merged: bool,
    ) -> Result<Vec<Device>, ClientError> {
        if let Some(delay) = self.catalog_delay {
            tokio::time::sleep(delay).await;
        }
        self.devices.clone().map_err(|body| ClientError::Status { status: 404, body })
    }

    async fn stream(
        &self,
        cancel: &CancellationToken,
        _monitor: MonitorId,
        on_message: &mut OnMessage<'_>,
    ) -> Result<Stopped, ClientError> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        for msg in self.feed.clone() {
            if let ControlFlow::Break(()) = on_message(msg) {
                return Ok(Stopped);
            }
        }
        match &self.feed_end {
            FeedEnd::Close => Err(ClientError::StreamClosed),
            FeedEnd::Fail(msg) => Err(ClientError::WebSocket(msg.clone())),
            FeedEnd::Hang => {
                cancel.cancelled().await;
                Err(ClientError::Cancelled)
            }
        }
    }
}
