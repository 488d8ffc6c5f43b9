// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the workspace.
//!
//! The row-shaped structs here mirror the persisted tables; timestamps are
//! ISO 8601 strings the way the storage layer writes them.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lifecycle state of a session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Disconnected,
    Qr,
    Connected,
}

/// Direction of a logged message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
}

/// Result of driving a session towards its connected state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ConnectOutcome {
    /// The device is unpaired; QR codes are being streamed to subscribers.
    Qr,
    /// The device is paired and the client is connecting or connected.
    Connected,
}

/// Descriptor of the phone that paired with a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_manufacturer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_model: Option<String>,
}

/// A persisted session row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Opaque session identifier (UUID).
    pub id: String,
    /// Owner of the session; `(user_id, name)` is unique.
    pub user_id: String,
    /// Human-readable session name.
    pub name: String,
    /// Webhook endpoint invoked for incoming messages. Empty disables dispatch.
    pub webhook_url: String,
    /// Current lifecycle state.
    pub status: SessionStatus,
    /// Full JID (`user@server:device`) once pairing has succeeded, else empty.
    pub phone_number: String,
    /// Descriptor of the paired phone, when known.
    pub device_info: Option<DeviceInfo>,
    /// ISO 8601 timestamp of the last transition to `connected`.
    pub last_connected: Option<String>,
    /// Whether group messages may trigger webhook dispatch at all.
    pub is_group_response_enabled: bool,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
    /// ISO 8601 last-update timestamp.
    pub updated_at: String,
}

/// A row in the message log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageLogRecord {
    pub session_id: String,
    pub direction: Direction,
    pub from_number: String,
    pub to_number: String,
    pub message_type: String,
    pub content: String,
    pub media_url: Option<String>,
    pub group_id: Option<String>,
    pub group_name: Option<String>,
    pub is_group: bool,
    pub quoted_message_id: Option<String>,
    /// ISO 8601 timestamp of the message itself.
    pub timestamp: String,
}

/// An append-only analytics row, written once per dispatched inbound message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsRecord {
    pub session_id: String,
    pub message_id: String,
    pub from_number: String,
    pub message_type: String,
    pub is_group: bool,
    pub is_mention: bool,
    pub webhook_sent: bool,
    pub webhook_success: bool,
    pub webhook_response_time_ms: i64,
    /// Last observed HTTP status; 0 when the failure was transport-level.
    pub webhook_status_code: i64,
    pub error_message: Option<String>,
}
