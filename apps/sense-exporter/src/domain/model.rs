//! Monitor, Device and Stream Message Types
//!
//! Codec-agnostic representation of what the Sense cloud reports about a
//! monitor. Adapters decode their wire formats into these types before the
//! aggregator sees them.

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Monitor
// =============================================================================

/// Identifier of a Sense monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonitorId(pub i64);

impl fmt::Display for MonitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A monitor owned by an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monitor {
    /// Monitor identifier.
    pub id: MonitorId,
    /// Hardware serial number, when the API reports one.
    #[serde(default)]
    pub serial_number: Option<String>,
}

impl Monitor {
    /// Create a monitor with only an identifier.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self {
            id: MonitorId(id),
            serial_number: None,
        }
    }
}

// =============================================================================
// Device
// =============================================================================

/// An appliance or circuit tracked by a monitor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Device identifier, unique within a monitor.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Device type (e.g. "Fridge").
    pub device_type: String,
    /// Manufacturer.
    pub make: String,
    /// Model.
    pub model: String,
}

impl Device {
    /// Create a device with an identifier and name, other fields empty.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }
}

// =============================================================================
// Stream Messages
// =============================================================================

/// A message received from the realtime feed of one monitor.
///
/// The set is closed: adapters drop every upstream message type that does
/// not map onto one of these variants, and the aggregator matches on it
/// exhaustively so a new variant fails to compile until it is handled.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    /// Instantaneous power readings.
    Realtime(RealtimeUpdate),
    /// Activity and connectivity of devices.
    DeviceStates(DeviceStateBatch),
}

impl StreamMessage {
    /// Kind of this message, for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Realtime(_) => "realtime_update",
            Self::DeviceStates(_) => "device_states",
        }
    }
}

/// Realtime power readings of a monitor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RealtimeUpdate {
    /// Total power in watts.
    pub watts: f64,
    /// Line frequency in hertz.
    pub hz: f64,
    /// Voltage per channel, in channel order.
    pub voltage: Vec<f64>,
    /// Power per device.
    pub devices: Vec<DeviceReading>,
}

/// Power draw of one device.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceReading {
    /// Device identifier.
    pub device_id: String,
    /// Power in watts.
    pub watts: f64,
}

impl DeviceReading {
    /// Create a reading.
    #[must_use]
    pub fn new(device_id: impl Into<String>, watts: f64) -> Self {
        Self {
            device_id: device_id.into(),
            watts,
        }
    }
}

/// Batch of device states.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceStateBatch {
    /// One entry per device.
    pub states: Vec<DeviceState>,
}

/// Mode and connectivity of one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceState {
    /// Device identifier.
    pub device_id: String,
    /// Mode as reported, e.g. "active" or "inactive".
    pub mode: String,
    /// Connectivity as reported, e.g. "online" or "offline".
    pub state: String,
}

impl DeviceState {
    /// Create a device state entry.
    #[must_use]
    pub fn new(
        device_id: impl Into<String>,
        mode: impl Into<String>,
        state: impl Into<String>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            mode: mode.into(),
            state: state.into(),
        }
    }

    /// 1.0 when the device is active, 0.0 for every other mode.
    #[must_use]
    pub fn active_value(&self) -> f64 {
        if self.mode == "active" { 1.0 } else { 0.0 }
    }

    /// 1.0 when the device is online, 0.0 for every other state.
    #[must_use]
    pub fn online_value(&self) -> f64 {
        if self.state == "online" { 1.0 } else { 0.0 }
    }
}
