// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Wagate WhatsApp-to-webhook gateway.
//!
//! This crate provides the foundational error type, domain types (JIDs,
//! session records, WhatsApp events), and the port traits the rest of the
//! workspace programs against. The WhatsApp protocol stack and the
//! persistence backend both plug in behind traits defined here.

pub mod error;
pub mod jid;
pub mod traits;
pub mod types;
pub mod wa;

// Re-export key items at crate root for ergonomic imports.
pub use error::WagateError;
pub use jid::Jid;
pub use types::{
    AnalyticsRecord, ConnectOutcome, DeviceInfo, Direction, MessageLogRecord, SessionRecord,
    SessionStatus,
};
pub use wa::{
    ChatPresence, ContextInfo, DeviceRecord, IncomingMessage, MediaRef, MessageInfo, QrEvent,
    WaEvent, WaMessage,
};

// Re-export the port traits at crate root.
pub use traits::{DeviceStore, SessionStore, WaClient, WaClientFactory};
