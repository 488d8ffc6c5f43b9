// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence ports.

use async_trait::async_trait;

use crate::error::WagateError;
use crate::jid::Jid;
use crate::types::{AnalyticsRecord, DeviceInfo, MessageLogRecord, SessionRecord, SessionStatus};
use crate::wa::DeviceRecord;

/// Repository of session rows, message logs, and analytics.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Inserts a new session row. Fails on an `(owner, name)` conflict.
    async fn create_session(&self, record: &SessionRecord) -> Result<(), WagateError>;

    /// Fetches one session by id.
    async fn get_session(&self, id: &str) -> Result<Option<SessionRecord>, WagateError>;

    /// Lists the sessions owned by one user, newest first.
    async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionRecord>, WagateError>;

    /// Updates the lifecycle state of a session.
    ///
    /// `phone_number` and `device_info` are left unchanged when `None`;
    /// `Some("")` clears the stored JID. A transition to
    /// [`SessionStatus::Connected`] also bumps `last_connected`.
    async fn update_session_status(
        &self,
        id: &str,
        status: SessionStatus,
        phone_number: Option<&str>,
        device_info: Option<&DeviceInfo>,
    ) -> Result<(), WagateError>;

    /// Sessions with a non-empty stored JID, regardless of persisted status.
    async fn sessions_with_stored_jid(&self) -> Result<Vec<SessionRecord>, WagateError>;

    /// Deletes a session; message logs and analytics cascade.
    async fn delete_session(&self, id: &str) -> Result<(), WagateError>;

    /// Appends a message log row.
    async fn insert_message_log(&self, record: &MessageLogRecord) -> Result<(), WagateError>;

    /// Appends an analytics row.
    async fn insert_analytics(&self, record: &AnalyticsRecord) -> Result<(), WagateError>;
}

/// Store of protocol-level device records, keyed by paired JID.
#[async_trait]
pub trait DeviceStore: Send + Sync {
    /// Looks a device up by its exact JID.
    async fn get_device(&self, jid: &Jid) -> Result<Option<DeviceRecord>, WagateError>;

    /// Enumerates every stored device.
    async fn get_all_devices(&self) -> Result<Vec<DeviceRecord>, WagateError>;

    /// Creates a fresh, unpaired device record. Not persisted until
    /// [`DeviceStore::put_device`] after pairing binds a JID.
    fn new_device(&self) -> DeviceRecord;

    /// Persists a device record. Requires a bound JID.
    async fn put_device(&self, device: &DeviceRecord) -> Result<(), WagateError>;

    /// Removes the device record for a JID, if present.
    async fn delete_device(&self, jid: &Jid) -> Result<(), WagateError>;
}
