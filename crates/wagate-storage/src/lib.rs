// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Wagate gateway.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, typed query modules for sessions,
//! message logs, and analytics, and the SQLite-backed implementations of the
//! `SessionStore` and `DeviceStore` ports.

pub mod database;
pub mod devices;
pub mod migrations;
pub mod queries;
pub mod store;

pub use database::Database;
pub use devices::SqliteDeviceStore;
pub use store::SqliteSessionStore;
