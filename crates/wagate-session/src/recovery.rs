// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Boot-time reconnection of previously paired sessions.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::registry::SessionRegistry;

impl SessionRegistry {
    /// Reconnects every session that has a stored JID.
    ///
    /// The persisted status is deliberately ignored: an unclean shutdown can
    /// leave it stale, and a paired device is worth reconnecting regardless.
    /// Each connect runs in its own task; failures are logged per session
    /// and never block the others or the boot sequence.
    pub async fn reconnect_stored_sessions(self: &Arc<Self>) {
        let sessions = match self.store.sessions_with_stored_jid().await {
            Ok(sessions) => sessions,
            Err(e) => {
                error!(error = %e, "failed to enumerate sessions for reconnect");
                return;
            }
        };

        if sessions.is_empty() {
            info!("no sessions with a stored identity to reconnect");
            return;
        }

        info!(count = sessions.len(), "reconnecting previously paired sessions");

        for session in sessions {
            let registry = Arc::clone(self);
            tokio::spawn(async move {
                info!(
                    session_id = %session.id,
                    name = %session.name,
                    status = %session.status,
                    jid = %session.phone_number,
                    "reconnecting session"
                );
                if let Err(e) = registry.connect(&session.id).await {
                    warn!(session_id = %session.id, error = %e, "failed to reconnect session");
                }
            });
        }
    }
}
