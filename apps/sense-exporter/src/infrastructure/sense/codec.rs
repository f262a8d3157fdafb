//! Realtime Feed Codec
//!
//! Decodes realtime feed text frames into [`StreamMessage`]s. Frames of any
//! other type (`hello`, `monitor_info`, `data_change`, ...) decode to `None`.

use crate::application::ports::ClientError;
use crate::domain::model::StreamMessage;

use super::messages::{DeviceStatesPayload, Envelope, RealtimePayload};

/// Realtime update frame type.
pub const REALTIME_UPDATE: &str = "realtime_update";

/// Device states frame type.
pub const DEVICE_STATES: &str = "device_states";

/// Codec errors.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// JSON decoding failed.
    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload does not match its declared type.
    #[error("invalid {kind} payload: {source}")]
    InvalidPayload {
        /// Declared frame type.
        kind: &'static str,
        /// Underlying error.
        source: serde_json::Error,
    },
}

impl From<CodecError> for ClientError {
    fn from(e: CodecError) -> Self {
        Self::Decode(e.to_string())
    }
}

/// Decode one text frame.
///
/// # Errors
///
/// Returns an error if the frame is not a JSON envelope, or if a frame of a
/// recognised type carries a malformed payload.
pub fn decode(text: &str) -> Result<Option<StreamMessage>, CodecError> {
    let envelope: Envelope = serde_json::from_str(text)?;

    match envelope.kind.as_str() {
        REALTIME_UPDATE => serde_json::from_value::<RealtimePayload>(envelope.payload)
            .map(|p| Some(StreamMessage::Realtime(p.into())))
            .map_err(|source| CodecError::InvalidPayload {
                kind: REALTIME_UPDATE,
                source,
            }),
        DEVICE_STATES => serde_json::from_value::<DeviceStatesPayload>(envelope.payload)
            .map(|p| Some(StreamMessage::DeviceStates(p.into())))
            .map_err(|source| CodecError::InvalidPayload {
                kind: DEVICE_STATES,
                source,
            }),
        other => {
            tracing::trace!(kind = other, "Ignoring realtime frame");
            Ok(None)
        }
    }
}
