//! Shared helpers for integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::ops::ControlFlow;

use async_trait::async_trait;
use axum::body::{Body, to_bytes};
use axum::http::Request;
use axum::response::Response;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use sense_exporter::{
    ClientError, Device, DeviceReading, DeviceState, DeviceStateBatch, Monitor, MonitorId,
    OnMessage, RealtimeUpdate, SenseClient, Stopped, StreamMessage,
};

/// Scripted account: fixed catalog and feed for every monitor.
pub struct ScriptedClient {
    pub monitors: Vec<Monitor>,
    pub devices: Result<Vec<Device>, u16>,
    pub feed: Vec<StreamMessage>,
}

impl ScriptedClient {
    pub fn new(monitors: &[i64]) -> Self {
        Self {
            monitors: monitors.iter().map(|id| Monitor::new(*id)).collect(),
            devices: Ok(Vec::new()),
            feed: Vec::new(),
        }
    }
}

#[async_trait]
impl SenseClient for ScriptedClient {
    fn user_id(&self) -> i64 {
        1
    }

    fn account_id(&self) -> i64 {
        2
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
        self.devices.clone().map_err(|status| ClientError::Status {
            status,
            body: String::new(),
        })
    }

    async fn stream(
        &self,
        _cancel: &CancellationToken,
        _monitor: MonitorId,
        on_message: &mut OnMessage<'_>,
    ) -> Result<Stopped, ClientError> {
        for msg in self.feed.clone() {
            if let ControlFlow::Break(()) = on_message(msg) {
                return Ok(Stopped);
            }
        }
        Err(ClientError::StreamClosed)
    }
}

pub fn fridge_and_oven() -> Vec<Device> {
    vec![Device::new("D1", "Fridge"), Device::new("D2", "Oven")]
}

pub fn realtime(watts: &[(&str, f64)]) -> StreamMessage {
    StreamMessage::Realtime(RealtimeUpdate {
        watts: 25.5,
        hz: 60.0,
        voltage: vec![120.5, 119.8],
        devices: watts
            .iter()
            .map(|(id, w)| DeviceReading::new(*id, *w))
            .collect(),
    })
}

pub fn d1_on_d2_off() -> StreamMessage {
    StreamMessage::DeviceStates(DeviceStateBatch {
        states: vec![
            DeviceState::new("D1", "active", "online"),
            DeviceState::new("D2", "inactive", "offline"),
        ],
    })
}

/// GET `uri` through the router and return the body.
pub async fn get(app: axum::Router, uri: &str) -> (Response, String) {
    let response = app
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let (parts, body) = response.into_parts();
    let bytes = to_bytes(body, usize::MAX).await.unwrap();
    (
        Response::from_parts(parts, Body::empty()),
        String::from_utf8(bytes.to_vec()).unwrap(),
    )
}

/// Value of the first sample of `name` carrying every given label.
pub fn sample(body: &str, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
    body.lines()
        .filter(|line| !line.starts_with('#'))
        .filter(|line| {
            line.strip_prefix(name)
                .is_some_and(|rest| rest.starts_with('{') || rest.starts_with(' '))
        })
        .find(|line| {
            labels
                .iter()
                .all(|(k, v)| line.contains(&format!("{k}=\"{v}\"")))
        })
        .and_then(|line| line.rsplit(' ').next())
        .and_then(|value| value.parse().ok())
}
