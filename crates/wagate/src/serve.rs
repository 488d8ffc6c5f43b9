// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daemon wiring: storage, broadcaster, registry, recovery, gateway, and
//! signal-driven graceful shutdown.

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use wagate_broadcast::Broadcaster;
use wagate_core::{DeviceStore, SessionStore, WagateError};
use wagate_gateway::{AuthConfig, GatewayState, ServerConfig};
use wagate_session::SessionRegistry;
use wagate_storage::{Database, SqliteDeviceStore, SqliteSessionStore};
use wagate_webhook::WebhookDispatcher;

use crate::backend;
use crate::config::WagateConfig;

/// Runs the daemon until SIGINT/SIGTERM.
pub async fn run(config: WagateConfig) -> Result<(), WagateError> {
    init_tracing(&config.log.level);

    info!(version = env!("CARGO_PKG_VERSION"), "starting wagate");
    if config.server.bearer_token.is_none() {
        warn!("no bearer token configured; the API surface is unauthenticated");
    }

    let db = Database::open(&config.storage.database_path).await?;
    info!(path = %config.storage.database_path, "database ready");

    let store: Arc<dyn SessionStore> = Arc::new(SqliteSessionStore::new(db.clone()));
    let devices: Arc<dyn DeviceStore> = Arc::new(SqliteDeviceStore::new(db.clone()));
    let broadcaster = Arc::new(Broadcaster::new());
    let dispatcher = Arc::new(WebhookDispatcher::new());

    let registry = SessionRegistry::new(
        Arc::clone(&store),
        devices,
        backend::factory(),
        Arc::clone(&broadcaster),
        dispatcher,
    );

    // Reconnect previously paired sessions in the background.
    {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move {
            registry.reconnect_stored_sessions().await;
        });
    }

    let shutdown = install_signal_handler();

    let state = GatewayState {
        registry: Arc::clone(&registry),
        store,
        broadcaster,
        auth: AuthConfig {
            bearer_token: config.server.bearer_token.clone(),
        },
        allowed_origins: Arc::new(config.server.allowed_origins.clone()),
        owner_id: config.server.owner_id.clone(),
        started_at: Instant::now(),
    };
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };

    wagate_gateway::start_server(&server_config, state, shutdown.clone()).await?;

    // Server returned: the shutdown signal fired. Tear clients down without
    // touching persisted status so recovery can reconnect them next boot.
    info!("gateway stopped, disconnecting live clients");
    registry.shutdown().await;
    db.close().await?;
    info!("shutdown complete");
    Ok(())
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Installs handlers for SIGTERM and SIGINT (Ctrl+C).
///
/// Returns a [`CancellationToken`] cancelled when either signal is received.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(e) => {
                    warn!(error = %e, "failed to install SIGTERM handler");
                    let _ = ctrl_c.await;
                    token_clone.cancel();
                    return;
                }
            };

            tokio::select! {
                _ = ctrl_c => {
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
                _ = sigterm.recv() => {
                    info!("received SIGTERM, initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
    });

    token
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn signal_handler_returns_uncancelled_token() {
        let token = install_signal_handler();
        assert!(!token.is_cancelled());
        // Cancel manually to clean up the background task.
        token.cancel();
    }
}
