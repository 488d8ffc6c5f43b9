// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session CRUD operations.

use rusqlite::params;
use wagate_core::{DeviceInfo, SessionRecord, SessionStatus, WagateError};

use crate::database::Database;

const SESSION_COLUMNS: &str = "id, user_id, name, webhook_url, status, phone_number, \
     device_info, last_connected, is_group_response_enabled, created_at, updated_at";

fn row_to_session(row: &rusqlite::Row<'_>) -> Result<SessionRecord, rusqlite::Error> {
    let status_raw: String = row.get(4)?;
    let status = status_raw.parse::<SessionStatus>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;

    // Unreadable device_info JSON is treated as absent rather than failing the row.
    let device_info = row
        .get::<_, Option<String>>(6)?
        .and_then(|raw| serde_json::from_str::<DeviceInfo>(&raw).ok());

    Ok(SessionRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        webhook_url: row.get(3)?,
        status,
        phone_number: row.get(5)?,
        device_info,
        last_connected: row.get(7)?,
        is_group_response_enabled: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

/// Create a new session row. Fails on an `(user_id, name)` conflict.
pub async fn create_session(db: &Database, record: &SessionRecord) -> Result<(), WagateError> {
    let record = record.clone();
    db.connection()
        .call(move |conn| {
            let device_info = record
                .device_info
                .as_ref()
                .map(serde_json::to_string)
                .transpose()
                .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?;
            conn.execute(
                "INSERT INTO sessions (id, user_id, name, webhook_url, status, phone_number,
                                       device_info, last_connected, is_group_response_enabled,
                                       created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    record.id,
                    record.user_id,
                    record.name,
                    record.webhook_url,
                    record.status.to_string(),
                    record.phone_number,
                    device_info,
                    record.last_connected,
                    record.is_group_response_enabled,
                    record.created_at,
                    record.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a session by id.
pub async fn get_session(db: &Database, id: &str) -> Result<Option<SessionRecord>, WagateError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"
            ))?;
            let result = stmt.query_row(params![id], row_to_session);
            match result {
                Ok(session) => Ok(Some(session)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List the sessions owned by one user, newest first.
pub async fn list_sessions(
    db: &Database,
    user_id: &str,
) -> Result<Vec<SessionRecord>, WagateError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM sessions
                 WHERE user_id = ?1 ORDER BY created_at DESC"
            ))?;
            let rows = stmt.query_map(params![user_id], row_to_session)?;
            let mut sessions = Vec::new();
            for row in rows {
                sessions.push(row?);
            }
            Ok(sessions)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Update a session's lifecycle state.
///
/// `phone_number` and `device_info` are left unchanged when `None`. A
/// transition to `connected` also bumps `last_connected`.
pub async fn update_session_status(
    db: &Database,
    id: &str,
    status: SessionStatus,
    phone_number: Option<&str>,
    device_info: Option<&DeviceInfo>,
) -> Result<(), WagateError> {
    let id = id.to_string();
    let status = status.to_string();
    let phone_number = phone_number.map(|p| p.to_string());
    let device_info = device_info.cloned();
    db.connection()
        .call(move |conn| {
            let device_info = device_info
                .as_ref()
                .map(serde_json::to_string)
                .transpose()
                .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?;
            conn.execute(
                "UPDATE sessions SET
                     status = ?1,
                     phone_number = COALESCE(?2, phone_number),
                     device_info = COALESCE(?3, device_info),
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now'),
                     last_connected = CASE WHEN ?1 = 'connected'
                         THEN strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                         ELSE last_connected END
                 WHERE id = ?4",
                params![status, phone_number, device_info, id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Sessions with a non-empty stored JID, regardless of persisted status.
pub async fn sessions_with_stored_jid(db: &Database) -> Result<Vec<SessionRecord>, WagateError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM sessions
                 WHERE phone_number <> '' ORDER BY created_at ASC"
            ))?;
            let rows = stmt.query_map([], row_to_session)?;
            let mut sessions = Vec::new();
            for row in rows {
                sessions.push(row?);
            }
            Ok(sessions)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Delete a session row; logs and analytics cascade via foreign keys.
pub async fn delete_session(db: &Database, id: &str) -> Result<(), WagateError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn make_session(id: &str, name: &str) -> SessionRecord {
        SessionRecord {
            id: id.to_string(),
            user_id: "user-1".to_string(),
            name: name.to_string(),
            webhook_url: "https://hooks.example/ai".to_string(),
            status: SessionStatus::Disconnected,
            phone_number: String::new(),
            device_info: None,
            last_connected: None,
            is_group_response_enabled: false,
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
            updated_at: "2026-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[tokio::test]
    async fn create_and_get_session_roundtrips() {
        let (db, _dir) = setup_db().await;
        let session = make_session("sess-1", "primary");

        create_session(&db, &session).await.unwrap();
        let retrieved = get_session(&db, "sess-1").await.unwrap().unwrap();
        assert_eq!(retrieved.id, "sess-1");
        assert_eq!(retrieved.name, "primary");
        assert_eq!(retrieved.status, SessionStatus::Disconnected);
        assert_eq!(retrieved.phone_number, "");
        assert!(retrieved.device_info.is_none());
        assert!(!retrieved.is_group_response_enabled);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn get_nonexistent_session_returns_none() {
        let (db, _dir) = setup_db().await;
        assert!(get_session(&db, "no-such-session").await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_owner_and_name_is_rejected() {
        let (db, _dir) = setup_db().await;
        create_session(&db, &make_session("s1", "same")).await.unwrap();
        let result = create_session(&db, &make_session("s2", "same")).await;
        assert!(result.is_err());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn update_status_bumps_last_connected_only_when_connected() {
        let (db, _dir) = setup_db().await;
        create_session(&db, &make_session("s1", "a")).await.unwrap();

        update_session_status(&db, "s1", SessionStatus::Qr, None, None)
            .await
            .unwrap();
        let session = get_session(&db, "s1").await.unwrap().unwrap();
        assert_eq!(session.status, SessionStatus::Qr);
        assert!(session.last_connected.is_none());

        let info = DeviceInfo {
            platform: Some("android".into()),
            ..DeviceInfo::default()
        };
        update_session_status(
            &db,
            "s1",
            SessionStatus::Connected,
            Some("6281@s.whatsapp.net:12"),
            Some(&info),
        )
        .await
        .unwrap();
        let session = get_session(&db, "s1").await.unwrap().unwrap();
        assert_eq!(session.status, SessionStatus::Connected);
        assert_eq!(session.phone_number, "6281@s.whatsapp.net:12");
        assert_eq!(session.device_info.unwrap().platform.as_deref(), Some("android"));
        assert!(session.last_connected.is_some());
    }

    #[tokio::test]
    async fn update_status_with_none_preserves_phone_number() {
        let (db, _dir) = setup_db().await;
        create_session(&db, &make_session("s1", "a")).await.unwrap();
        update_session_status(
            &db,
            "s1",
            SessionStatus::Connected,
            Some("6281@s.whatsapp.net"),
            None,
        )
        .await
        .unwrap();

        // A plain status write must not clear the stored JID.
        update_session_status(&db, "s1", SessionStatus::Disconnected, None, None)
            .await
            .unwrap();
        let session = get_session(&db, "s1").await.unwrap().unwrap();
        assert_eq!(session.phone_number, "6281@s.whatsapp.net");

        // An explicit empty string does clear it.
        update_session_status(&db, "s1", SessionStatus::Disconnected, Some(""), None)
            .await
            .unwrap();
        let session = get_session(&db, "s1").await.unwrap().unwrap();
        assert_eq!(session.phone_number, "");
    }

    #[tokio::test]
    async fn sessions_with_stored_jid_filters_unpaired() {
        let (db, _dir) = setup_db().await;
        create_session(&db, &make_session("paired", "a")).await.unwrap();
        create_session(&db, &make_session("unpaired", "b")).await.unwrap();
        update_session_status(
            &db,
            "paired",
            SessionStatus::Disconnected,
            Some("6281@s.whatsapp.net:3"),
            None,
        )
        .await
        .unwrap();

        let sessions = sessions_with_stored_jid(&db).await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, "paired");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn delete_session_cascades_to_logs_and_analytics() {
        let (db, _dir) = setup_db().await;
        create_session(&db, &make_session("s1", "a")).await.unwrap();

        db.connection()
            .call(|conn| {
                conn.execute(
                    "INSERT INTO messages_log (session_id, direction, message_type, content, timestamp)
                     VALUES ('s1', 'incoming', 'text', 'hi', '2026-01-01T00:00:00Z')",
                    [],
                )?;
                conn.execute(
                    "INSERT INTO analytics (session_id, message_id, message_type)
                     VALUES ('s1', 'm1', 'text')",
                    [],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        delete_session(&db, "s1").await.unwrap();

        let (logs, rows) = db
            .connection()
            .call(|conn| {
                let logs: i64 =
                    conn.query_row("SELECT COUNT(*) FROM messages_log", [], |r| r.get(0))?;
                let rows: i64 =
                    conn.query_row("SELECT COUNT(*) FROM analytics", [], |r| r.get(0))?;
                Ok((logs, rows))
            })
            .await
            .unwrap();
        assert_eq!(logs, 0);
        assert_eq!(rows, 0);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_sessions_is_scoped_to_owner() {
        let (db, _dir) = setup_db().await;
        create_session(&db, &make_session("s1", "a")).await.unwrap();
        let mut other = make_session("s2", "b");
        other.user_id = "user-2".to_string();
        create_session(&db, &other).await.unwrap();

        let sessions = list_sessions(&db, "user-1").await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, "s1");
        db.close().await.unwrap();
    }
}
