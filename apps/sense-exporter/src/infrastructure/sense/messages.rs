//! Sense Wire Types
//!
//! Serde mappings for the Sense REST API and the realtime feed. Only the
//! fields the exporter reads are declared; everything else is ignored.
//!
//! # REST
//!
//! - `POST /authenticate` -> [`AuthResponse`]
//! - `GET /app/monitors/{id}/devices` -> `[DeviceWire]`
//!
//! # Realtime feed
//!
//! Every text frame is an [`Envelope`]. Only two types carry data the
//! exporter uses:
//!
//! - `realtime_update` -> [`RealtimePayload`]
//! - `device_states` -> [`DeviceStatesPayload`]

use serde::Deserialize;

use crate::domain::model::{
    Device, DeviceReading, DeviceState, DeviceStateBatch, Monitor, MonitorId, RealtimeUpdate,
};

// =============================================================================
// REST
// =============================================================================

/// Successful authentication.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    /// Bearer token for later calls.
    pub access_token: String,
    /// User identifier.
    pub user_id: i64,
    /// Account identifier.
    pub account_id: i64,
    /// Monitors owned by the account.
    #[serde(default)]
    pub monitors: Vec<MonitorWire>,
}

/// Monitor entry of [`AuthResponse`].
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorWire {
    /// Monitor identifier.
    pub id: i64,
    /// Hardware serial number.
    #[serde(default)]
    pub serial_number: Option<String>,
}

impl From<MonitorWire> for Monitor {
    fn from(wire: MonitorWire) -> Self {
        Self {
            id: MonitorId(wire.id),
            serial_number: wire.serial_number,
        }
    }
}

/// Device entry of the device list.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceWire {
    /// Device identifier.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Manufacturer.
    #[serde(default)]
    pub make: Option<String>,
    /// Model.
    #[serde(default)]
    pub model: Option<String>,
    /// Detected device type.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: DeviceTags,
}

/// The tags of a device that determine its type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceTags {
    /// Type chosen by the user.
    #[serde(rename = "UserDeviceType", default)]
    pub user_device_type: Option<String>,
    /// Type suggested by Sense.
    #[serde(rename = "DefaultUserDeviceType", default)]
    pub default_user_device_type: Option<String>,
}

impl DeviceWire {
    /// User-facing device type: the user's choice, then Sense's suggestion,
    /// then the detected type.
    #[must_use]
    pub fn device_type(&self) -> String {
        [
            &self.tags.user_device_type,
            &self.tags.default_user_device_type,
            &self.kind,
        ]
        .into_iter()
        .flatten()
        .find(|t| !t.is_empty())
        .cloned()
        .unwrap_or_default()
    }
}

impl From<DeviceWire> for Device {
    fn from(wire: DeviceWire) -> Self {
        let device_type = wire.device_type();
        Self {
            id: wire.id,
            name: wire.name,
            device_type,
            make: wire.make.unwrap_or_default(),
            model: wire.model.unwrap_or_default(),
        }
    }
}

// =============================================================================
// Realtime feed
// =============================================================================

/// Outer frame of every realtime message.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    /// Message type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Type-specific payload.
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Payload of `realtime_update`.
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimePayload {
    /// Total power.
    #[serde(default)]
    pub w: f64,
    /// Line frequency.
    #[serde(default)]
    pub hz: f64,
    /// Voltage per channel.
    #[serde(default)]
    pub voltage: Vec<f64>,
    /// Devices currently drawing power.
    #[serde(default)]
    pub devices: Vec<DeviceWattsWire>,
}

/// Device entry of [`RealtimePayload`].
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceWattsWire {
    /// Device identifier.
    pub id: String,
    /// Power.
    #[serde(default)]
    pub w: f64,
}

impl From<RealtimePayload> for RealtimeUpdate {
    fn from(wire: RealtimePayload) -> Self {
        Self {
            watts: wire.w,
            hz: wire.hz,
            voltage: wire.voltage,
            devices: wire
                .devices
                .into_iter()
                .map(|d| DeviceReading::new(d.id, d.w))
                .collect(),
        }
    }
}

/// Payload of `device_states`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceStatesPayload {
    /// One entry per device.
    #[serde(default)]
    pub states: Vec<DeviceStateWire>,
}

/// Entry of [`DeviceStatesPayload`].
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceStateWire {
    /// Device identifier.
    pub device_id: String,
    /// `active` or `inactive`.
    #[serde(default)]
    pub mode: String,
    /// `online` or `offline`.
    #[serde(default)]
    pub state: String,
}

impl From<DeviceStatesPayload> for DeviceStateBatch {
    fn from(wire: DeviceStatesPayload) -> Self {
        Self {
            states: wire
                .states
                .into_iter()
                .map(|s| DeviceState::new(s.device_id, s.mode, s.state))
                .collect(),
        }
    }
}
