// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data carried across the WhatsApp client port.
//!
//! Events mirror the subset of the protocol library's surface the runtime
//! consumes: pairing, connection transitions, logout, and incoming messages.
//! Message content is modeled as optional parts; only the parts the pipeline
//! reads carry payload fields, the rest exist to surface their mention lists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::jid::Jid;

/// An event emitted by a live WhatsApp client.
#[derive(Debug, Clone)]
pub enum WaEvent {
    /// First successful pairing of this device. Never fired on reconnect.
    PairSuccess {
        jid: Jid,
        platform: String,
        business_name: String,
    },
    /// The socket reached its connected state (initial connect and reconnects).
    Connected,
    /// The account was logged out remotely; the device record is now invalid.
    LoggedOut,
    /// An incoming message.
    Message(Box<IncomingMessage>),
}

/// An incoming message together with its delivery metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub info: MessageInfo,
    pub message: WaMessage,
}

/// Delivery metadata for an incoming message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageInfo {
    pub id: String,
    pub sender: Jid,
    pub chat: Jid,
    pub is_group: bool,
    pub push_name: String,
    pub timestamp: DateTime<Utc>,
}

/// Explicit mention list and quoting context attached to a message part.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextInfo {
    #[serde(default)]
    pub mentioned_jids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quoted_message_id: Option<String>,
}

/// Reference to downloadable media held by the protocol servers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaRef {
    pub direct_path: String,
    #[serde(default)]
    pub media_key: Vec<u8>,
    #[serde(default)]
    pub file_length: u64,
}

/// Extended (formatted / link-preview) text part.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtendedTextContent {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_info: Option<ContextInfo>,
}

/// Image part.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageContent {
    pub caption: String,
    pub mimetype: String,
    pub media: MediaRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_info: Option<ContextInfo>,
}

/// Media part the pipeline does not download in this version.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaContent {
    #[serde(default)]
    pub mimetype: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_info: Option<ContextInfo>,
}

/// Location part.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationContent {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_info: Option<ContextInfo>,
}

/// The content parts of an incoming message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WaMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_text: Option<ExtendedTextContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<MediaContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<MediaContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<MediaContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sticker: Option<MediaContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_location: Option<LocationContent>,
}

impl WaMessage {
    /// First non-empty human-readable text: plain body, extended text, image caption.
    pub fn body_text(&self) -> String {
        if let Some(text) = &self.conversation {
            if !text.is_empty() {
                return text.clone();
            }
        }
        if let Some(extended) = &self.extended_text {
            if !extended.text.is_empty() {
                return extended.text.clone();
            }
        }
        if let Some(image) = &self.image {
            if !image.caption.is_empty() {
                return image.caption.clone();
            }
        }
        String::new()
    }

    /// Message type reported to webhooks and logs.
    pub fn message_type(&self) -> &'static str {
        if self.image.is_some() { "image" } else { "text" }
    }

    /// Context infos from every part that can carry a mention list.
    pub fn context_infos(&self) -> Vec<&ContextInfo> {
        let mut contexts = Vec::new();
        if let Some(part) = &self.extended_text {
            contexts.extend(part.context_info.as_ref());
        }
        if let Some(part) = &self.image {
            contexts.extend(part.context_info.as_ref());
        }
        for part in [&self.video, &self.document, &self.audio, &self.sticker] {
            if let Some(part) = part {
                contexts.extend(part.context_info.as_ref());
            }
        }
        for part in [&self.location, &self.live_location] {
            if let Some(part) = part {
                contexts.extend(part.context_info.as_ref());
            }
        }
        contexts
    }

    /// Quoted message id, if any part carries one.
    pub fn quoted_message_id(&self) -> Option<String> {
        self.context_infos()
            .iter()
            .find_map(|ctx| ctx.quoted_message_id.clone())
    }
}

/// An event on the QR pairing channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrEvent {
    /// A fresh code to render; supersedes any previous code.
    Code(String),
    /// The pairing window expired without a scan.
    Timeout,
    /// Pairing completed; the success itself arrives as [`WaEvent::PairSuccess`].
    Success,
}

/// Chat presence states the runtime toggles around webhook calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatPresence {
    Composing,
    Paused,
}

/// A device record from the protocol library's store.
///
/// A freshly created record has no JID; pairing binds one.
#[derive(Debug, Clone, Default)]
pub struct DeviceRecord {
    pub jid: Option<Jid>,
    pub key_data: Vec<u8>,
}

impl DeviceRecord {
    /// True once pairing has bound an identity to this device.
    pub fn has_identity(&self) -> bool {
        self.jid.is_some()
    }
}
