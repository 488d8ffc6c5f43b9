// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook dispatch for the Wagate gateway.
//!
//! Turns an inbound-message payload into an HTTP POST (JSON, or multipart
//! when media is attached), retries transient failures with bounded backoff,
//! and extracts a reply string from whatever shape the endpoint returns.

pub mod dispatcher;
pub mod extract;
pub mod payload;

pub use dispatcher::{DispatchError, DispatchOutcome, WebhookDispatcher};
pub use payload::{GroupInfo, WebhookPayload};
