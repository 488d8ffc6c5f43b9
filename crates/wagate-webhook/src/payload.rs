// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire format of the webhook request body.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Group descriptor attached to group-chat payloads.
#[derive(Debug, Clone, Serialize)]
pub struct GroupInfo {
    pub id: String,
    pub name: String,
}

/// The payload POSTed to a session's webhook for each inbound message.
///
/// Serialized as JSON when no media is attached; as `multipart/form-data`
/// with an extra `file` part otherwise. The media fields never appear in the
/// JSON body.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookPayload {
    pub session_id: String,
    pub from: String,
    /// Always empty; the receiver's own number is not carried by the
    /// protocol library's message metadata.
    pub to: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub is_group: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_info: Option<GroupInfo>,
    pub push_name: String,
    pub message_type: String,
    #[serde(skip)]
    pub media_data: Vec<u8>,
    #[serde(skip)]
    pub media_name: String,
    #[serde(skip)]
    pub media_mime_type: String,
}

impl WebhookPayload {
    /// Whether this payload must be sent as multipart.
    pub fn has_media(&self) -> bool {
        !self.media_data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> WebhookPayload {
        WebhookPayload {
            session_id: "sess-1".into(),
            from: "6281".into(),
            to: String::new(),
            message: "hello".into(),
            timestamp: Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap(),
            is_group: false,
            group_info: None,
            push_name: "Alice".into(),
            message_type: "text".into(),
            media_data: Vec::new(),
            media_name: String::new(),
            media_mime_type: String::new(),
        }
    }

    #[test]
    fn json_body_matches_wire_format() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["session_id"], "sess-1");
        assert_eq!(value["from"], "6281");
        assert_eq!(value["to"], "");
        assert_eq!(value["message"], "hello");
        assert_eq!(value["is_group"], false);
        assert_eq!(value["push_name"], "Alice");
        assert_eq!(value["message_type"], "text");
        assert!(value["timestamp"].as_str().unwrap().starts_with("2026-01-01T12:00:00"));
        // Media fields and absent group_info never leak into the JSON body.
        assert!(value.get("media_data").is_none());
        assert!(value.get("group_info").is_none());
    }

    #[test]
    fn group_info_serializes_when_present() {
        let mut payload = sample();
        payload.is_group = true;
        payload.group_info = Some(GroupInfo {
            id: "120363@g.us".into(),
            name: "Alice".into(),
        });
        let value = serde_json::to_value(payload).unwrap();
        assert_eq!(value["group_info"]["id"], "120363@g.us");
    }

    #[test]
    fn has_media_tracks_bytes() {
        let mut payload = sample();
        assert!(!payload.has_media());
        payload.media_data = vec![1, 2, 3];
        assert!(payload.has_media());
    }
}
