// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules. All writes go through the single background
//! connection owned by [`crate::Database`].

pub mod analytics;
pub mod messages;
pub mod sessions;
