// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed event envelopes sent to subscribers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use wagate_core::{DeviceInfo, SessionStatus};

/// Display hint sent alongside QR codes; the protocol library's QR channel
/// controls the real expiry.
const QR_EXPIRES_HINT_SECS: u32 = 60;

/// Kind discriminator on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    QrUpdate,
    StatusUpdate,
    MessageReceived,
}

/// The envelope serialized to every subscriber:
/// `{"type": ..., "data": ..., "timestamp": ...}`.
#[derive(Debug, Clone, Serialize)]
pub struct EventMessage {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

impl EventMessage {
    fn new(kind: EventKind, data: Value) -> Self {
        Self {
            kind,
            data,
            timestamp: Utc::now(),
        }
    }

    /// A fresh QR code for an unpaired session.
    pub fn qr_update(code: &str) -> Self {
        Self::new(
            EventKind::QrUpdate,
            json!({
                "qr_code": code,
                "expires_in": QR_EXPIRES_HINT_SECS,
            }),
        )
    }

    /// A session lifecycle transition.
    ///
    /// `phone_number` is included when known (it may be an empty string on
    /// reconnects whose JID could not be read back); `device_info` only
    /// accompanies a fresh pairing.
    pub fn status_update(
        status: SessionStatus,
        phone_number: Option<&str>,
        device_info: Option<&DeviceInfo>,
    ) -> Self {
        let mut data = json!({ "status": status });
        if let Some(phone_number) = phone_number {
            data["phone_number"] = Value::String(phone_number.to_string());
        }
        if let Some(info) = device_info {
            data["device_info"] = serde_json::to_value(info).unwrap_or(Value::Null);
        }
        Self::new(EventKind::StatusUpdate, data)
    }

    /// A serialized incoming message, for dashboard debugging views.
    pub fn message_received(serialized_message: String) -> Self {
        Self::new(
            EventKind::MessageReceived,
            json!({ "message": serialized_message }),
        )
    }

    /// The frame written to subscriber queues. Serialized once per publish.
    pub fn to_frame(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qr_update_frame_shape() {
        let frame = EventMessage::qr_update("2@abc123").to_frame();
        let value: Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["type"], "qr_update");
        assert_eq!(value["data"]["qr_code"], "2@abc123");
        assert_eq!(value["data"]["expires_in"], 60);
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn status_update_includes_optional_fields() {
        let info = DeviceInfo {
            platform: Some("android".into()),
            ..DeviceInfo::default()
        };
        let event = EventMessage::status_update(
            SessionStatus::Connected,
            Some("6281@s.whatsapp.net:12"),
            Some(&info),
        );
        let value: Value = serde_json::from_str(&event.to_frame()).unwrap();
        assert_eq!(value["data"]["status"], "connected");
        assert_eq!(value["data"]["phone_number"], "6281@s.whatsapp.net:12");
        assert_eq!(value["data"]["device_info"]["platform"], "android");
    }

    #[test]
    fn status_update_omits_absent_fields() {
        let event = EventMessage::status_update(SessionStatus::Disconnected, None, None);
        let value: Value = serde_json::from_str(&event.to_frame()).unwrap();
        assert_eq!(value["data"]["status"], "disconnected");
        assert!(value["data"].get("phone_number").is_none());
        assert!(value["data"].get("device_info").is_none());
    }

    #[test]
    fn message_received_wraps_serialized_payload() {
        let event = EventMessage::message_received(r#"{"conversation":"hi"}"#.to_string());
        let value: Value = serde_json::from_str(&event.to_frame()).unwrap();
        assert_eq!(value["type"], "message_received");
        assert_eq!(value["data"]["message"], r#"{"conversation":"hi"}"#);
    }
}
