// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test support for the Wagate workspace.
//!
//! Provides a scripted mock of the WhatsApp client port and a helper for
//! opening an isolated, migrated on-disk database. Intended for use from
//! `#[cfg(test)]` modules and integration tests only.

pub mod mock_wa;

pub use mock_wa::{MockWaClient, MockWaFactory};

use tempfile::TempDir;
use wagate_storage::Database;

/// Opens a fresh migrated database in a temporary directory.
///
/// The returned [`TempDir`] must be kept alive for the database's lifetime.
pub async fn open_test_database() -> (Database, TempDir) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let db_path = dir.path().join("test.db");
    let db = Database::open(db_path.to_str().expect("utf-8 temp path"))
        .await
        .expect("failed to open test database");
    (db, dir)
}
