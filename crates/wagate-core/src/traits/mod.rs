// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Port traits the workspace programs against.

pub mod client;
pub mod store;

pub use client::{WaClient, WaClientFactory};
pub use store::{DeviceStore, SessionStore};
