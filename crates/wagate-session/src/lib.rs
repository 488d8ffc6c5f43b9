// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session lifecycle and the per-session event runtime.
//!
//! The [`SessionRegistry`] owns every live WhatsApp client and serializes
//! connect/disconnect against it. Events from each client flow through an
//! ordered pump into the handler, which runs the inbound-message pipeline
//! (group filtering, media download, webhook dispatch, reply send-back,
//! log and analytics writes) in a dedicated task per message.

pub mod handler;
pub mod media;
pub mod mention;
pub mod recovery;
pub mod registry;

pub use registry::SessionRegistry;
