// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP and WebSocket surface for the Wagate gateway.
//!
//! Thin handlers over the session registry and store: session lifecycle REST
//! endpoints behind a bearer token, an unauthenticated health probe, and the
//! per-session WebSocket subscription endpoint that feeds dashboards.

pub mod auth;
pub mod handlers;
pub mod server;
pub mod ws;

pub use auth::AuthConfig;
pub use server::{router, start_server, GatewayState, ServerConfig};
