// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The process-wide registry of live WhatsApp clients.
//!
//! Invariant: at most one live client per session id. Connect and disconnect
//! on the same session are totally ordered by the registry lock; the lock is
//! never held across awaited I/O, so device and session lookups happen before
//! the insert critical section and teardown happens after removal.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

use wagate_broadcast::{Broadcaster, EventMessage};
use wagate_core::{
    ConnectOutcome, DeviceRecord, DeviceStore, Jid, QrEvent, SessionRecord, SessionStatus,
    SessionStore, WaClient, WaClientFactory, WaEvent, WagateError,
};
use wagate_webhook::WebhookDispatcher;

/// Upper bound on how long shutdown waits for any single client to hang up.
const SHUTDOWN_DISCONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Owner of the live-client set and home of the per-session runtime.
pub struct SessionRegistry {
    clients: RwLock<HashMap<String, Arc<dyn WaClient>>>,
    pub(crate) store: Arc<dyn SessionStore>,
    pub(crate) devices: Arc<dyn DeviceStore>,
    factory: Arc<dyn WaClientFactory>,
    pub(crate) broadcaster: Arc<Broadcaster>,
    pub(crate) dispatcher: Arc<WebhookDispatcher>,
}

impl SessionRegistry {
    pub fn new(
        store: Arc<dyn SessionStore>,
        devices: Arc<dyn DeviceStore>,
        factory: Arc<dyn WaClientFactory>,
        broadcaster: Arc<Broadcaster>,
        dispatcher: Arc<WebhookDispatcher>,
    ) -> Arc<Self> {
        Arc::new(Self {
            clients: RwLock::new(HashMap::new()),
            store,
            devices,
            factory,
            broadcaster,
            dispatcher,
        })
    }

    /// Non-blocking lookup of a session's live client.
    pub async fn get(&self, session_id: &str) -> Option<Arc<dyn WaClient>> {
        self.clients.read().await.get(session_id).cloned()
    }

    /// Number of live clients, for health reporting.
    pub async fn live_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Drives a session towards its connected state.
    ///
    /// Returns [`ConnectOutcome::Qr`] when the session still needs pairing;
    /// QR codes stream to subscribers as `qr_update` events. A session that
    /// already has a live client just reports the handle's current state.
    pub async fn connect(self: &Arc<Self>, session_id: &str) -> Result<ConnectOutcome, WagateError> {
        if let Some(existing) = self.get(session_id).await {
            return Ok(observed_outcome(existing.as_ref()));
        }

        let session = self
            .store
            .get_session(session_id)
            .await?
            .ok_or_else(|| WagateError::NotFound(session_id.to_string()))?;

        let device = self.resolve_device(&session).await;
        let needs_pairing = !device.has_identity();

        let (client, events) = self.factory.create(device).await?;

        {
            let mut clients = self.clients.write().await;
            if let Some(existing) = clients.get(session_id) {
                // A concurrent connect won the race; defer to its client.
                return Ok(observed_outcome(existing.as_ref()));
            }
            clients.insert(session_id.to_string(), Arc::clone(&client));
        }

        self.spawn_event_pump(session_id.to_string(), events);

        if needs_pairing {
            let qr_events = match client.qr_channel().await {
                Ok(rx) => rx,
                Err(e) => {
                    self.remove(session_id).await;
                    return Err(e);
                }
            };
            if let Err(e) = client.connect().await {
                self.remove(session_id).await;
                return Err(e);
            }
            self.spawn_qr_pump(session_id.to_string(), qr_events);
            Ok(ConnectOutcome::Qr)
        } else {
            if let Err(e) = client.connect().await {
                self.remove(session_id).await;
                return Err(e);
            }
            Ok(ConnectOutcome::Connected)
        }
    }

    /// Tears down a session's live client.
    ///
    /// `update_status` selects whether the persisted status is set to
    /// `disconnected`; process shutdown passes `false` so the stored JID and
    /// status survive for boot-time recovery.
    pub async fn disconnect(&self, session_id: &str, update_status: bool) {
        let client = self.remove(session_id).await;
        if let Some(client) = client {
            client.disconnect().await;
            debug!(session_id = %session_id, "client disconnected");
            if update_status {
                if let Err(e) = self
                    .store
                    .update_session_status(session_id, SessionStatus::Disconnected, None, None)
                    .await
                {
                    warn!(session_id = %session_id, error = %e, "failed to persist disconnect");
                }
            }
        }
    }

    /// Best-effort teardown of every live client without status writes.
    pub async fn shutdown(&self) {
        let ids: Vec<String> = self.clients.read().await.keys().cloned().collect();
        info!(count = ids.len(), "shutting down live clients");
        for id in ids {
            if tokio::time::timeout(SHUTDOWN_DISCONNECT_TIMEOUT, self.disconnect(&id, false))
                .await
                .is_err()
            {
                warn!(session_id = %id, "client did not disconnect before timeout");
            }
        }
    }

    pub(crate) async fn remove(&self, session_id: &str) -> Option<Arc<dyn WaClient>> {
        self.clients.write().await.remove(session_id)
    }

    /// Binds the session to a device record.
    ///
    /// A stored JID is looked up directly; on a miss every device is scanned
    /// for a `(user, server)` match and the healed full JID is persisted back
    /// onto the session row. Anything unresolvable falls back to a fresh
    /// device, which forces a new QR scan rather than failing the connect.
    async fn resolve_device(&self, session: &SessionRecord) -> DeviceRecord {
        if session.phone_number.is_empty() {
            return self.devices.new_device();
        }

        let jid = match Jid::normalize(&session.phone_number) {
            Ok(jid) => jid,
            Err(e) => {
                warn!(
                    session_id = %session.id,
                    stored = %session.phone_number,
                    error = %e,
                    "stored JID unusable, creating fresh device"
                );
                return self.devices.new_device();
            }
        };

        match self.devices.get_device(&jid).await {
            Ok(Some(device)) => return device,
            Ok(None) => {}
            Err(e) => {
                warn!(session_id = %session.id, jid = %jid, error = %e, "device lookup failed");
            }
        }

        match self.devices.get_all_devices().await {
            Ok(devices) => {
                for device in devices {
                    let Some(device_jid) = device.jid.clone() else {
                        continue;
                    };
                    if device_jid.user == jid.user && device_jid.server == jid.server {
                        let full = device_jid.to_string();
                        if full != session.phone_number {
                            if let Err(e) = self
                                .store
                                .update_session_status(
                                    &session.id,
                                    session.status,
                                    Some(&full),
                                    None,
                                )
                                .await
                            {
                                warn!(
                                    session_id = %session.id,
                                    error = %e,
                                    "failed to persist healed JID"
                                );
                            }
                        }
                        return device;
                    }
                }
            }
            Err(e) => {
                warn!(session_id = %session.id, error = %e, "device enumeration failed");
            }
        }

        self.devices.new_device()
    }

    fn spawn_event_pump(self: &Arc<Self>, session_id: String, mut events: mpsc::Receiver<WaEvent>) {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                registry.handle_event(&session_id, event).await;
            }
            debug!(session_id = %session_id, "event stream closed");
        });
    }

    fn spawn_qr_pump(self: &Arc<Self>, session_id: String, mut qr_events: mpsc::Receiver<QrEvent>) {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(event) = qr_events.recv().await {
                match event {
                    QrEvent::Code(code) => {
                        registry
                            .broadcaster
                            .publish(&session_id, &EventMessage::qr_update(&code))
                            .await;
                        if let Err(e) = registry
                            .store
                            .update_session_status(&session_id, SessionStatus::Qr, None, None)
                            .await
                        {
                            warn!(session_id = %session_id, error = %e, "failed to persist qr status");
                        }
                    }
                    QrEvent::Timeout => {
                        debug!(session_id = %session_id, "qr pairing window expired");
                    }
                    // Pairing success arrives as a client event.
                    QrEvent::Success => {}
                }
            }
        });
    }
}

fn observed_outcome(client: &dyn WaClient) -> ConnectOutcome {
    if client.is_connected() {
        ConnectOutcome::Connected
    } else {
        ConnectOutcome::Qr
    }
}
