// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model and loader.
//!
//! Layered with Figment: compiled defaults, `/etc/wagate/wagate.toml`, the
//! XDG config dir, `./wagate.toml`, then `WAGATE_`-prefixed environment
//! variables. An explicit `--config` path replaces the file hierarchy.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WagateConfig {
    /// HTTP/WebSocket server settings.
    #[serde(default)]
    pub server: ServerSection,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageSection,

    /// Logging settings.
    #[serde(default)]
    pub log: LogSection,
}

/// Server bind, auth, and origin settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token for the REST and WebSocket surface. `None` runs open.
    #[serde(default)]
    pub bearer_token: Option<String>,

    /// Origins accepted on WebSocket handshakes.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// Owner id stamped onto sessions created through the REST surface.
    #[serde(default = "default_owner_id")]
    pub owner_id: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            bearer_token: None,
            allowed_origins: default_allowed_origins(),
            owner_id: default_owner_id(),
        }
    }
}

/// Storage backend settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageSection {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogSection {
    /// Logging filter (trace, debug, info, warn, error, or an EnvFilter expression).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_allowed_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_owner_id() -> String {
    "default".to_string()
}

fn default_database_path() -> String {
    "wagate.db".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Loads configuration from the standard hierarchy, or from `path` alone
/// when given. Environment variables override either way.
pub fn load(path: Option<&Path>) -> Result<WagateConfig, figment::Error> {
    let figment = match path {
        Some(path) => Figment::new()
            .merge(Serialized::defaults(WagateConfig::default()))
            .merge(Toml::file(path)),
        None => Figment::new()
            .merge(Serialized::defaults(WagateConfig::default()))
            .merge(Toml::file("/etc/wagate/wagate.toml"))
            .merge(Toml::file(
                dirs::config_dir()
                    .map(|dir| dir.join("wagate/wagate.toml"))
                    .unwrap_or_default(),
            ))
            .merge(Toml::file("wagate.toml")),
    };
    figment.merge(env_provider()).extract()
}

/// Loads configuration from a TOML string (tests and diagnostics).
pub fn load_from_str(toml_content: &str) -> Result<WagateConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WagateConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Environment provider using explicit `map()` for section-to-dot mapping.
///
/// `Env::map` rather than `Env::split("_")`: key names contain underscores,
/// so `WAGATE_SERVER_BEARER_TOKEN` must become `server.bearer_token`, not
/// `server.bearer.token`.
fn env_provider() -> Env {
    Env::prefixed("WAGATE_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("server_", "server.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("log_", "log.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = WagateConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert!(config.server.bearer_token.is_none());
        assert_eq!(config.server.allowed_origins, vec!["*".to_string()]);
        assert_eq!(config.storage.database_path, "wagate.db");
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn toml_overrides_defaults() {
        let config = load_from_str(
            r#"
            [server]
            port = 9000
            bearer_token = "secret"
            allowed_origins = ["https://dashboard.example"]

            [storage]
            database_path = "/var/lib/wagate/wagate.db"
        "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bearer_token.as_deref(), Some("secret"));
        assert_eq!(
            config.server.allowed_origins,
            vec!["https://dashboard.example".to_string()]
        );
        assert_eq!(config.storage.database_path, "/var/lib/wagate/wagate.db");
        // Untouched sections keep their defaults.
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = load_from_str(
            r#"
            [server]
            prot = 9000
        "#,
        );
        assert!(result.is_err());
    }
}
