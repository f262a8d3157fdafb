//! Port Interfaces
//!
//! The capability the collectors need from a Sense account. The production
//! adapter lives in `infrastructure::sense`; tests provide their own.
//!
//! ## Driven Ports (Outbound)
//!
//! - `SenseClient`: account identity, monitor list, device catalog and the
//!   realtime feed of a monitor
//! - `SampleSource`: process-level metrics gathered once per scrape

use std::ops::ControlFlow;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::metrics::Sample;
use crate::domain::model::{Device, Monitor, MonitorId, StreamMessage};

/// Callback invoked once per realtime feed message.
///
/// Returning `Break` asks the feed to stop; the stream call then ends with
/// [`Stopped`].
pub type OnMessage<'a> = dyn FnMut(StreamMessage) -> ControlFlow<()> + Send + 'a;

/// Marker returned by [`SenseClient::stream`] when the callback requested a
/// stop. This is the only successful way for a feed to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stopped;

/// Errors returned by a [`SenseClient`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Authentication was refused or the token is no longer valid.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Upstream answered with a non-success status.
    #[error("unexpected status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// Response or message could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// WebSocket failure.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// The feed ended before a stop was requested.
    #[error("stream closed by peer")]
    StreamClosed,

    /// The collection was cancelled.
    #[error("cancelled")]
    Cancelled,

    /// The collection deadline passed.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// A Sense account: identity, monitors, and per-monitor queries.
///
/// Implementations are shared read-only between concurrent scrapes.
#[async_trait]
pub trait SenseClient: Send + Sync {
    /// User identifier of the authenticated account.
    fn user_id(&self) -> i64;

    /// Account identifier.
    fn account_id(&self) -> i64;

    /// Monitors owned by the account. Queried on every scrape.
    fn monitors(&self) -> Vec<Monitor>;

    /// Devices known to a monitor.
    async fn get_devices(
        &self,
        cancel: &CancellationToken,
        monitor: MonitorId,
        include_merged: bool,
    ) -> Result<Vec<Device>, ClientError>;

    /// Stream realtime messages until `on_message` breaks, the token is
    /// cancelled or the feed fails.
    async fn stream(
        &self,
        cancel: &CancellationToken,
        monitor: MonitorId,
        on_message: &mut OnMessage<'_>,
    ) -> Result<Stopped, ClientError>;
}

/// Synchronous source of samples that are not tied to a monitor, such as
/// process and runtime statistics.
pub trait SampleSource: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Gather the current samples. Sources skip what they cannot read.
    fn collect(&self) -> Vec<Sample>;
}
