// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Origin allow-list check for subscriber transports.

/// Whether a handshake origin is acceptable.
///
/// An empty origin (non-browser client) is always allowed; `*` in the list
/// allows everything; otherwise the match is case-insensitive.
pub fn origin_allowed(origin: &str, allowed: &[String]) -> bool {
    if origin.is_empty() {
        return true;
    }
    allowed
        .iter()
        .any(|entry| entry == "*" || entry.eq_ignore_ascii_case(origin))
}
