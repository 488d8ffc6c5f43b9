// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed implementation of the `SessionStore` port.

use async_trait::async_trait;
use wagate_core::{
    AnalyticsRecord, DeviceInfo, MessageLogRecord, SessionRecord, SessionStatus, SessionStore,
    WagateError,
};

use crate::database::Database;
use crate::queries;

/// `SessionStore` over the shared [`Database`] handle.
#[derive(Clone)]
pub struct SqliteSessionStore {
    db: Database,
}

impl SqliteSessionStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn create_session(&self, record: &SessionRecord) -> Result<(), WagateError> {
        queries::sessions::create_session(&self.db, record).await
    }

    async fn get_session(&self, id: &str) -> Result<Option<SessionRecord>, WagateError> {
        queries::sessions::get_session(&self.db, id).await
    }

    async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionRecord>, WagateError> {
        queries::sessions::list_sessions(&self.db, user_id).await
    }

    async fn update_session_status(
        &self,
        id: &str,
        status: SessionStatus,
        phone_number: Option<&str>,
        device_info: Option<&DeviceInfo>,
    ) -> Result<(), WagateError> {
        queries::sessions::update_session_status(&self.db, id, status, phone_number, device_info)
            .await
    }

    async fn sessions_with_stored_jid(&self) -> Result<Vec<SessionRecord>, WagateError> {
        queries::sessions::sessions_with_stored_jid(&self.db).await
    }

    async fn delete_session(&self, id: &str) -> Result<(), WagateError> {
        queries::sessions::delete_session(&self.db, id).await
    }

    async fn insert_message_log(&self, record: &MessageLogRecord) -> Result<(), WagateError> {
        queries::messages::insert_message_log(&self.db, record).await
    }

    async fn insert_analytics(&self, record: &AnalyticsRecord) -> Result<(), WagateError> {
        queries::analytics::insert_analytics(&self.db, record).await
    }
}
