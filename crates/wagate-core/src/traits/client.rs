// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp client port.
//!
//! The protocol stack is an external library; the runtime only depends on
//! this trait pair. A factory builds one client per session from a device
//! record and hands back the client's ordered event stream.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::WagateError;
use crate::jid::Jid;
use crate::wa::{ChatPresence, DeviceRecord, MediaRef, QrEvent, WaEvent};

/// A live connection to WhatsApp Web for a single session.
///
/// Send, presence, and download calls are safe to make concurrently from
/// event-handler tasks.
#[async_trait]
pub trait WaClient: Send + Sync {
    /// Whether the socket is currently connected.
    fn is_connected(&self) -> bool;

    /// Whether the backing device record carries a paired identity.
    fn is_logged_in(&self) -> bool;

    /// The paired JID from the in-memory device store, when present.
    fn device_jid(&self) -> Option<Jid>;

    /// The hidden-user (LID) alias of the paired account, when known.
    fn lid_jid(&self) -> Option<Jid>;

    /// Drives the client towards its connected state.
    async fn connect(&self) -> Result<(), WagateError>;

    /// Tears the connection down. Idempotent.
    async fn disconnect(&self);

    /// Opens the QR pairing channel.
    ///
    /// Only valid before pairing; fails once the device has an identity.
    async fn qr_channel(&self) -> Result<mpsc::Receiver<QrEvent>, WagateError>;

    /// Sends a plain text message to a chat. Returns the message id.
    async fn send_text(&self, chat: &Jid, text: &str) -> Result<String, WagateError>;

    /// Updates the typing indicator for a chat.
    async fn send_chat_presence(
        &self,
        chat: &Jid,
        presence: ChatPresence,
    ) -> Result<(), WagateError>;

    /// Downloads media bytes referenced by an incoming message part.
    async fn download(&self, media: &MediaRef) -> Result<Vec<u8>, WagateError>;
}

/// Builds live clients from device records.
#[async_trait]
pub trait WaClientFactory: Send + Sync {
    /// Creates a client bound to `device` along with its event stream.
    ///
    /// Events arrive on the receiver in the order the protocol library
    /// emits them; the stream closes when the client is torn down.
    async fn create(
        &self,
        device: DeviceRecord,
    ) -> Result<(Arc<dyn WaClient>, mpsc::Receiver<WaEvent>), WagateError>;
}
