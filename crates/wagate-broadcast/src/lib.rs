// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event fan-out from the session runtime to dashboard subscribers.
//!
//! A single coordinator task owns the session-id -> subscriber-set map.
//! Subscribers carry bounded queues of pre-serialized frames; a subscriber
//! that cannot keep up is closed and dropped so event ingress never blocks.

pub mod event;
pub mod hub;
pub mod origin;

pub use event::{EventKind, EventMessage};
pub use hub::{Broadcaster, Subscription, SUBSCRIBER_QUEUE_CAPACITY};
pub use origin::origin_allowed;
