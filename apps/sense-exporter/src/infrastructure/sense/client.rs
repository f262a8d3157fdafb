//! Sense Cloud Client
//!
//! [`SenseClient`] implementation backed by the Sense REST API and the
//! realtime WebSocket feed. Each `stream` call opens its own connection and
//! closes it when the callback stops, the token is cancelled, or the peer
//! goes away.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use reqwest::Client;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{ClientError, OnMessage, SenseClient, Stopped};
use crate::domain::model::{Device, Monitor, MonitorId};
use crate::infrastructure::config::{Credentials, EndpointSettings};

use super::auth::{SenseSession, authenticate, check_status};
use super::codec;
use super::messages::DeviceWire;

/// Sense account client.
#[derive(Debug, Clone)]
pub struct HttpSenseClient {
    http: Client,
    api_url: String,
    realtime_url: String,
    session: SenseSession,
}

impl HttpSenseClient {
    /// Authenticate one account.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the
    /// credentials are refused.
    pub async fn connect(
        credentials: &Credentials,
        endpoints: &EndpointSettings,
    ) -> Result<Self, ClientError> {
        let http = Client::builder()
            .user_agent(concat!("sense-exporter/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Http(e.to_string()))?;

        let session = authenticate(&http, &endpoints.api_url, credentials).await?;
        Ok(Self::from_session(http, endpoints, session))
    }

    /// Build a client around an existing session.
    #[must_use]
    pub fn from_session(http: Client, endpoints: &EndpointSettings, session: SenseSession) -> Self {
        Self {
            http,
            api_url: endpoints.api_url.clone(),
            realtime_url: endpoints.realtime_url.clone(),
            session,
        }
    }

    fn feed_url(&self, monitor: MonitorId) -> String {
        format!(
            "{}/monitors/{monitor}/realtimefeed?access_token={}",
            self.realtime_url,
            self.session.access_token()
        )
    }

    async fn fetch_devices(
        &self,
        monitor: MonitorId,
        include_merged: bool,
    ) -> Result<Vec<Device>, ClientError> {
        let url = format!("{}/app/monitors/{monitor}/devices", self.api_url);
        let response = self
            .http
            .get(&url)
            .query(&[("include_merged", include_merged)])
            .header(
                reqwest::header::AUTHORIZATION,
                format!("bearer {}", self.session.access_token()),
            )
            .send()
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?;

        let devices: Vec<DeviceWire> = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;

        Ok(devices.into_iter().map(Device::from).collect())
    }
}

/// Authenticate every configured account, in order.
///
/// # Errors
///
/// Fails on the first account that cannot be authenticated.
pub async fn connect_all(
    accounts: &[Credentials],
    endpoints: &EndpointSettings,
) -> Result<Vec<Arc<dyn SenseClient>>, ClientError> {
    let mut clients: Vec<Arc<dyn SenseClient>> = Vec::with_capacity(accounts.len());
    for credentials in accounts {
        let client = HttpSenseClient::connect(credentials, endpoints).await?;
        tracing::info!(
            account_id = client.account_id(),
            monitors = ?client.monitors().iter().map(|m| m.id.0).collect::<Vec<_>>(),
            "Successfully authenticated account"
        );
        clients.push(Arc::new(client));
    }
    Ok(clients)
}

#[async_trait]
impl SenseClient for HttpSenseClient {
    fn user_id(&self) -> i64 {
        self.session.user_id()
    }

    fn account_id(&self) -> i64 {
        self.session.account_id()
    }

    fn monitors(&self) -> Vec<Monitor> {
        self.session.monitors().to_vec()
    }

    async fn get_devices(
        &self,
        cancel: &CancellationToken,
        monitor: MonitorId,
        include_merged: bool,
    ) -> Result<Vec<Device>, ClientError> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(ClientError::Cancelled),
            result = self.fetch_devices(monitor, include_merged) => result,
        }
    }

    async fn stream(
        &self,
        cancel: &CancellationToken,
        monitor: MonitorId,
        on_message: &mut OnMessage<'_>,
    ) -> Result<Stopped, ClientError> {
        tracing::debug!(monitor_id = %monitor, "Opening realtime feed");

        let connect = tokio_tungstenite::connect_async(self.feed_url(monitor));
        let (ws_stream, _response) = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ClientError::Cancelled),
            result = connect => result.map_err(|e| ClientError::WebSocket(e.to_string()))?,
        };

        let (mut write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    let _ = write.send(Message::Close(None)).await;
                    return Err(ClientError::Cancelled);
                }
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            let Some(message) = codec::decode(text.as_str())? else {
                                continue;
                            };
                            if on_message(message).is_break() {
                                tracing::debug!(monitor_id = %monitor, "Closing realtime feed");
                                let _ = write.send(Message::Close(None)).await;
                                return Ok(Stopped);
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            write
                                .send(Message::Pong(data))
                                .await
                                .map_err(|e| ClientError::WebSocket(e.to_string()))?;
                        }
                        Some(Ok(Message::Close(_))) => {
                            tracing::debug!(monitor_id = %monitor, "Server sent close frame");
                            return Err(ClientError::StreamClosed);
                        }
                        Some(Ok(_)) => {
                            // Binary, pong and raw frames carry nothing we use
                        }
                        Some(Err(e)) => {
                            return Err(ClientError::WebSocket(e.to_string()));
                        }
                        None => {
                            tracing::debug!(monitor_id = %monitor, "Realtime feed ended");
                            return Err(ClientError::StreamClosed);
                        }
                    }
                }
            }
        }
    }
}
