// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message log writes and reads.

use rusqlite::params;
use wagate_core::{Direction, MessageLogRecord, WagateError};

use crate::database::Database;

fn row_to_log(row: &rusqlite::Row<'_>) -> Result<MessageLogRecord, rusqlite::Error> {
    let direction_raw: String = row.get(1)?;
    let direction = direction_raw.parse::<Direction>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(MessageLogRecord {
        session_id: row.get(0)?,
        direction,
        from_number: row.get(2)?,
        to_number: row.get(3)?,
        message_type: row.get(4)?,
        content: row.get(5)?,
        media_url: row.get(6)?,
        group_id: row.get(7)?,
        group_name: row.get(8)?,
        is_group: row.get(9)?,
        quoted_message_id: row.get(10)?,
        timestamp: row.get(11)?,
    })
}

/// Append a message log row.
pub async fn insert_message_log(
    db: &Database,
    record: &MessageLogRecord,
) -> Result<(), WagateError> {
    let record = record.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages_log (session_id, direction, from_number, to_number,
                                           message_type, content, media_url, group_id,
                                           group_name, is_group, quoted_message_id, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    record.session_id,
                    record.direction.to_string(),
                    record.from_number,
                    record.to_number,
                    record.message_type,
                    record.content,
                    record.media_url,
                    record.group_id,
                    record.group_name,
                    record.is_group,
                    record.quoted_message_id,
                    record.timestamp,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Message log rows for a session in chronological order.
pub async fn logs_for_session(
    db: &Database,
    session_id: &str,
) -> Result<Vec<MessageLogRecord>, WagateError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT session_id, direction, from_number, to_number, message_type, content,
                        media_url, group_id, group_name, is_group, quoted_message_id, timestamp
                 FROM messages_log WHERE session_id = ?1 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![session_id], row_to_log)?;
            let mut logs = Vec::new();
            for row in rows {
                logs.push(row?);
            }
            Ok(logs)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::sessions::create_session;
    use tempfile::tempdir;
    use wagate_core::{SessionRecord, SessionStatus};

    async fn setup_db_with_session() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();

        let session = SessionRecord {
            id: "sess-1".to_string(),
            user_id: "user-1".to_string(),
            name: "primary".to_string(),
            webhook_url: String::new(),
            status: SessionStatus::Disconnected,
            phone_number: String::new(),
            device_info: None,
            last_connected: None,
            is_group_response_enabled: false,
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
            updated_at: "2026-01-01T00:00:00.000Z".to_string(),
        };
        create_session(&db, &session).await.unwrap();
        (db, dir)
    }

    fn make_log(direction: Direction, content: &str) -> MessageLogRecord {
        MessageLogRecord {
            session_id: "sess-1".to_string(),
            direction,
            from_number: "6281".to_string(),
            to_number: String::new(),
            message_type: "text".to_string(),
            content: content.to_string(),
            media_url: None,
            group_id: None,
            group_name: None,
            is_group: false,
            quoted_message_id: None,
            timestamp: "2026-01-01T00:00:01Z".to_string(),
        }
    }

    #[tokio::test]
    async fn insert_and_read_logs_in_order() {
        let (db, _dir) = setup_db_with_session().await;

        insert_message_log(&db, &make_log(Direction::Incoming, "hello"))
            .await
            .unwrap();
        insert_message_log(&db, &make_log(Direction::Outgoing, "hi there"))
            .await
            .unwrap();

        let logs = logs_for_session(&db, "sess-1").await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].direction, Direction::Incoming);
        assert_eq!(logs[0].content, "hello");
        assert_eq!(logs[1].direction, Direction::Outgoing);
        assert_eq!(logs[1].content, "hi there");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn group_fields_roundtrip() {
        let (db, _dir) = setup_db_with_session().await;

        let mut log = make_log(Direction::Incoming, "group hello");
        log.is_group = true;
        log.group_id = Some("120363@g.us".to_string());
        log.group_name = Some("Alice".to_string());
        log.quoted_message_id = Some("Q1".to_string());
        insert_message_log(&db, &log).await.unwrap();

        let logs = logs_for_session(&db, "sess-1").await.unwrap();
        assert!(logs[0].is_group);
        assert_eq!(logs[0].group_id.as_deref(), Some("120363@g.us"));
        assert_eq!(logs[0].quoted_message_id.as_deref(), Some("Q1"));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn insert_for_unknown_session_fails() {
        let (db, _dir) = setup_db_with_session().await;
        let mut log = make_log(Direction::Incoming, "orphan");
        log.session_id = "missing".to_string();
        assert!(insert_message_log(&db, &log).await.is_err());
        db.close().await.unwrap();
    }
}
