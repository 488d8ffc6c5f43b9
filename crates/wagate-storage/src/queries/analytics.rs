// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Analytics row writes and reads.

use rusqlite::params;
use wagate_core::{AnalyticsRecord, WagateError};

use crate::database::Database;

fn row_to_analytics(row: &rusqlite::Row<'_>) -> Result<AnalyticsRecord, rusqlite::Error> {
    Ok(AnalyticsRecord {
        session_id: row.get(0)?,
        message_id: row.get(1)?,
        from_number: row.get(2)?,
        message_type: row.get(3)?,
        is_group: row.get(4)?,
        is_mention: row.get(5)?,
        webhook_sent: row.get(6)?,
        webhook_success: row.get(7)?,
        webhook_response_time_ms: row.get(8)?,
        webhook_status_code: row.get(9)?,
        error_message: row.get(10)?,
    })
}

/// Append an analytics row.
pub async fn insert_analytics(db: &Database, record: &AnalyticsRecord) -> Result<(), WagateError> {
    let record = record.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO analytics (session_id, message_id, from_number, message_type,
                                        is_group, is_mention, webhook_sent, webhook_success,
                                        webhook_response_time_ms, webhook_status_code,
                                        error_message)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    record.session_id,
                    record.message_id,
                    record.from_number,
                    record.message_type,
                    record.is_group,
                    record.is_mention,
                    record.webhook_sent,
                    record.webhook_success,
                    record.webhook_response_time_ms,
                    record.webhook_status_code,
                    record.error_message,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Analytics rows for a session in insertion order.
pub async fn analytics_for_session(
    db: &Database,
    session_id: &str,
) -> Result<Vec<AnalyticsRecord>, WagateError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT session_id, message_id, from_number, message_type, is_group,
                        is_mention, webhook_sent, webhook_success, webhook_response_time_ms,
                        webhook_status_code, error_message
                 FROM analytics WHERE session_id = ?1 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![session_id], row_to_analytics)?;
            let mut records = Vec::new();
            for row in rows {
                records.push(row?);
            }
            Ok(records)
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

    #[tokio::test]
    async fn insert_and_read_analytics() {
        let (db, _dir) = setup_db_with_session().await;

        let record = AnalyticsRecord {
            session_id: "sess-1".to_string(),
            message_id: "3EB0".to_string(),
            from_number: "6281".to_string(),
            message_type: "text".to_string(),
            is_group: true,
            is_mention: true,
            webhook_sent: true,
            webhook_success: false,
            webhook_response_time_ms: 420,
            webhook_status_code: 500,
            error_message: Some("webhook returned status 500".to_string()),
        };
        insert_analytics(&db, &record).await.unwrap();

        let records = analytics_for_session(&db, "sess-1").await.unwrap();
        assert_eq!(records.len(), 1);
        let row = &records[0];
        assert_eq!(row.message_id, "3EB0");
        assert!(row.is_group);
        assert!(row.is_mention);
        assert!(row.webhook_sent);
        assert!(!row.webhook_success);
        assert_eq!(row.webhook_response_time_ms, 420);
        assert_eq!(row.webhook_status_code, 500);
        assert!(row.error_message.is_some());

        db.close().await.unwrap();
    }
}
