// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed implementation of the `DeviceStore` port.
//!
//! The protocol library persists its device records in the same database as
//! the application tables; this store gives it the `wa_devices` table. A
//! freshly created device has no JID and lives only in memory until pairing
//! binds one and the client writes it back.

use async_trait::async_trait;
use rusqlite::params;
use wagate_core::{DeviceRecord, DeviceStore, Jid, WagateError};

use crate::database::{map_tr_err, Database};

/// `DeviceStore` over the shared [`Database`] handle.
#[derive(Clone)]
pub struct SqliteDeviceStore {
    db: Database,
}

impl SqliteDeviceStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

fn row_to_device(row: &rusqlite::Row<'_>) -> Result<DeviceRecord, rusqlite::Error> {
    let jid_raw: String = row.get(0)?;
    let jid = Jid::parse(&jid_raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(DeviceRecord {
        jid: Some(jid),
        key_data: row.get(1)?,
    })
}

#[async_trait]
impl DeviceStore for SqliteDeviceStore {
    async fn get_device(&self, jid: &Jid) -> Result<Option<DeviceRecord>, WagateError> {
        let jid = jid.to_string();
        self.db
            .connection()
            .call(move |conn| {
                let mut stmt =
                    conn.prepare("SELECT jid, key_data FROM wa_devices WHERE jid = ?1")?;
                let result = stmt.query_row(params![jid], row_to_device);
                match result {
                    Ok(device) => Ok(Some(device)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(map_tr_err)
    }

    async fn get_all_devices(&self) -> Result<Vec<DeviceRecord>, WagateError> {
        self.db
            .connection()
            .call(move |conn| {
                let mut stmt =
                    conn.prepare("SELECT jid, key_data FROM wa_devices ORDER BY jid ASC")?;
                let rows = stmt.query_map([], row_to_device)?;
                let mut devices = Vec::new();
                for row in rows {
                    devices.push(row?);
                }
                Ok(devices)
            })
            .await
            .map_err(map_tr_err)
    }

    fn new_device(&self) -> DeviceRecord {
        DeviceRecord {
            jid: None,
            key_data: uuid::Uuid::new_v4().into_bytes().to_vec(),
        }
    }

    async fn put_device(&self, device: &DeviceRecord) -> Result<(), WagateError> {
        let jid = device
            .jid
            .as_ref()
            .ok_or_else(|| WagateError::Internal("cannot persist an unpaired device".into()))?
            .to_string();
        let key_data = device.key_data.clone();
        self.db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO wa_devices (jid, key_data) VALUES (?1, ?2)
                     ON CONFLICT (jid) DO UPDATE SET key_data = excluded.key_data",
                    params![jid, key_data],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    async fn delete_device(&self, jid: &Jid) -> Result<(), WagateError> {
        let jid = jid.to_string();
        self.db
            .connection()
            .call(move |conn| {
                conn.execute("DELETE FROM wa_devices WHERE jid = ?1", params![jid])?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}
