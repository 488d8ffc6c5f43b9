// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp JID parsing and normalization.
//!
//! JIDs take the form `user@server` or `user@server:device`. Session rows
//! store the full form so a reconnect can find the exact device, but strings
//! written by older builds (or by hand) may be bare phone numbers. Parsing is
//! therefore tolerant: a missing server falls back to the default user server.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::WagateError;

/// Server for regular user accounts.
pub const DEFAULT_USER_SERVER: &str = "s.whatsapp.net";
/// Server for hidden-user (LID) aliases of an account.
pub const HIDDEN_USER_SERVER: &str = "lid";
/// Server for group chats.
pub const GROUP_SERVER: &str = "g.us";

/// A WhatsApp identifier.
///
/// `device` is 0 for the non-AD (addressing) form. The string form of an AD
/// JID carries the device after a colon: `6281234@s.whatsapp.net:12`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Jid {
    pub user: String,
    pub server: String,
    pub device: u16,
}

impl Jid {
    /// Creates a non-AD JID.
    pub fn new(user: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            server: server.into(),
            device: 0,
        }
    }

    /// Creates an AD JID with an explicit device id.
    pub fn with_device(user: impl Into<String>, server: impl Into<String>, device: u16) -> Self {
        Self {
            user: user.into(),
            server: server.into(),
            device,
        }
    }

    /// True when both user and server are empty.
    pub fn is_empty(&self) -> bool {
        self.user.is_empty() && self.server.is_empty()
    }

    /// Returns the non-AD form (device stripped).
    pub fn to_non_ad(&self) -> Jid {
        Jid::new(self.user.clone(), self.server.clone())
    }

    /// Returns the hidden-user (LID server) alias of this JID.
    pub fn lid_alias(&self) -> Jid {
        Jid::new(self.user.clone(), HIDDEN_USER_SERVER)
    }

    /// Parses `user@server` or `user@server:device`.
    ///
    /// A string without `@` parses as a bare user with an empty server; use
    /// [`Jid::normalize`] for stored values where the default server should
    /// be assumed.
    pub fn parse(raw: &str) -> Result<Jid, WagateError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(WagateError::Internal("empty JID string".into()));
        }

        let (user, rest) = match raw.split_once('@') {
            Some((user, rest)) => (user, rest),
            None => (raw, ""),
        };

        let (server, device) = match rest.split_once(':') {
            Some((server, device_str)) => {
                let device = device_str.parse::<u16>().map_err(|e| {
                    WagateError::Internal(format!("invalid device id in JID {raw:?}: {e}"))
                })?;
                (server, device)
            }
            None => (rest, 0),
        };

        Ok(Jid {
            user: user.to_string(),
            server: server.to_string(),
            device,
        })
    }

    /// Turns whatever is stored in the session row into a usable JID.
    ///
    /// Bare phone numbers get the default user server appended. The user part
    /// must resolve non-empty; callers treat an error as a device-store miss,
    /// not a failure.
    pub fn normalize(raw: &str) -> Result<Jid, WagateError> {
        let cleaned = raw.trim();
        if cleaned.is_empty() {
            return Err(WagateError::Internal("empty JID string".into()));
        }

        let mut jid = if cleaned.contains('@') {
            Jid::parse(cleaned)?
        } else {
            Jid::parse(&format!("{cleaned}@{DEFAULT_USER_SERVER}"))?
        };

        if jid.server.is_empty() {
            jid.server = DEFAULT_USER_SERVER.to_string();
        }
        if jid.user.is_empty() {
            return Err(WagateError::Internal(format!(
                "failed to parse user part from JID: {raw}"
            )));
        }
        Ok(jid)
    }
}

impl fmt::Display for Jid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.device > 0 {
            write!(f, "{}@{}:{}", self.user, self.server, self.device)
        } else {
            write!(f, "{}@{}", self.user, self.server)
        }
    }
}

impl FromStr for Jid {
    type Err = WagateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Jid::parse(s)
    }
}

impl Serialize for Jid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Jid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Jid::parse(&raw).map_err(D::Error::custom)
    }
}
