// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-session event handler.
//!
//! One handler dispatches on event kind. Lifecycle events update the session
//! row and notify subscribers; each inbound message runs its whole pipeline
//! in a dedicated task so the event pump stays responsive. Log and analytics
//! writes are fire-and-forget: a failure in one branch never aborts the rest.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use wagate_broadcast::EventMessage;
use wagate_core::{
    AnalyticsRecord, ChatPresence, DeviceInfo, Direction, IncomingMessage, Jid, MessageLogRecord,
    SessionStatus, WaEvent,
};
use wagate_webhook::{GroupInfo, WebhookPayload};

use crate::media;
use crate::mention;
use crate::registry::SessionRegistry;

impl SessionRegistry {
    /// Entry point for every event pumped off a live client.
    pub(crate) async fn handle_event(self: &Arc<Self>, session_id: &str, event: WaEvent) {
        match event {
            WaEvent::PairSuccess {
                jid,
                platform,
                business_name,
            } => self.on_pair_success(session_id, jid, platform, business_name).await,
            WaEvent::Connected => self.on_connected(session_id).await,
            WaEvent::LoggedOut => self.on_logged_out(session_id).await,
            WaEvent::Message(incoming) => self.on_message(session_id, *incoming),
        }
    }

    /// First successful pairing: persist the full JID and device descriptor.
    async fn on_pair_success(
        &self,
        session_id: &str,
        jid: Jid,
        platform: String,
        business_name: String,
    ) {
        let phone_number = jid.to_string();
        let device_info = DeviceInfo {
            platform: non_empty(platform),
            device_manufacturer: None,
            // The pairing event reports the business name in place of a model
            // for business accounts.
            device_model: non_empty(business_name),
        };
        info!(session_id = %session_id, jid = %phone_number, "pairing succeeded");

        if let Err(e) = self
            .store
            .update_session_status(
                session_id,
                SessionStatus::Connected,
                Some(&phone_number),
                Some(&device_info),
            )
            .await
        {
            error!(session_id = %session_id, error = %e, "failed to persist pairing");
        }

        self.broadcaster
            .publish(
                session_id,
                &EventMessage::status_update(
                    SessionStatus::Connected,
                    Some(&phone_number),
                    Some(&device_info),
                ),
            )
            .await;
    }

    /// Connected fires on reconnects too, where no `PairSuccess` is emitted;
    /// the JID is read from the client and falls back to the persisted value.
    async fn on_connected(&self, session_id: &str) {
        let mut phone_number = self
            .get(session_id)
            .await
            .and_then(|client| client.device_jid())
            .map(|jid| jid.to_string())
            .unwrap_or_default();

        if phone_number.is_empty() {
            if let Ok(Some(session)) = self.store.get_session(session_id).await {
                phone_number = session.phone_number;
            }
        }

        info!(session_id = %session_id, jid = %phone_number, "client connected");

        if let Err(e) = self
            .store
            .update_session_status(
                session_id,
                SessionStatus::Connected,
                Some(&phone_number),
                None,
            )
            .await
        {
            error!(session_id = %session_id, error = %e, "failed to persist connected status");
        }

        self.broadcaster
            .publish(
                session_id,
                &EventMessage::status_update(SessionStatus::Connected, Some(&phone_number), None),
            )
            .await;
    }

    /// Remote logout invalidates the device record and the live client.
    async fn on_logged_out(&self, session_id: &str) {
        info!(session_id = %session_id, "logged out");

        if let Some(client) = self.get(session_id).await {
            if let Some(jid) = client.device_jid() {
                if let Err(e) = self.devices.delete_device(&jid).await {
                    warn!(session_id = %session_id, error = %e, "failed to remove device record");
                }
            }
        }

        if let Err(e) = self
            .store
            .update_session_status(session_id, SessionStatus::Disconnected, Some(""), None)
            .await
        {
            error!(session_id = %session_id, error = %e, "failed to persist logout");
        }

        self.broadcaster
            .publish(
                session_id,
                &EventMessage::status_update(SessionStatus::Disconnected, None, None),
            )
            .await;

        if let Some(client) = self.remove(session_id).await {
            client.disconnect().await;
        }
    }

    /// Fans each inbound message out into its own task.
    fn on_message(self: &Arc<Self>, session_id: &str, incoming: IncomingMessage) {
        let registry = Arc::clone(self);
        let session_id = session_id.to_string();
        tokio::spawn(async move {
            registry.process_message(&session_id, incoming).await;
        });
    }

    /// The inbound-message pipeline.
    async fn process_message(self: &Arc<Self>, session_id: &str, incoming: IncomingMessage) {
        let info = &incoming.info;
        let message = &incoming.message;
        debug!(
            session_id = %session_id,
            message_id = %info.id,
            from = %info.sender,
            "received message"
        );

        let session = match self.store.get_session(session_id).await {
            Ok(Some(session)) => session,
            Ok(None) => {
                warn!(session_id = %session_id, "session row missing for incoming message");
                return;
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "failed to load session");
                return;
            }
        };

        let mut payload = WebhookPayload {
            session_id: session_id.to_string(),
            from: info.sender.user.clone(),
            to: String::new(),
            message: message.body_text(),
            timestamp: info.timestamp,
            is_group: info.is_group,
            group_info: None,
            push_name: info.push_name.clone(),
            message_type: message.message_type().to_string(),
            media_data: Vec::new(),
            media_name: String::new(),
            media_mime_type: String::new(),
        };

        // Status updates and protocol messages have neither text nor image.
        if payload.message.is_empty() && message.image.is_none() {
            return;
        }

        if info.is_group {
            payload.group_info = Some(GroupInfo {
                id: info.chat.user.clone(),
                name: info.push_name.clone(),
            });
        }

        self.log_incoming(&payload, &incoming);

        let mut is_mention = false;
        if info.is_group {
            if !session.is_group_response_enabled {
                debug!(
                    session_id = %session_id,
                    from = %payload.from,
                    "ignoring group message: group response disabled"
                );
                return;
            }

            let targets = self.bot_jids(session_id).await;
            if targets.is_empty() {
                warn!(session_id = %session_id, "no bot identity available for mention check");
                return;
            }
            is_mention = mention::is_mentioned(message, &payload.message, &targets);
            if !is_mention {
                debug!(
                    session_id = %session_id,
                    from = %payload.from,
                    "ignoring group message: not mentioned"
                );
                return;
            }
        }

        // Dashboard notification for messages that made it past the filters.
        let serialized = serde_json::to_string(message).unwrap_or_default();
        self.broadcaster
            .publish(session_id, &EventMessage::message_received(serialized))
            .await;

        let client = self.get(session_id).await;

        if let Some(image) = &message.image {
            match &client {
                Some(client) => {
                    media::attach_image(&mut payload, client.as_ref(), image, info.timestamp).await;
                }
                None => {
                    payload
                        .message
                        .push_str(" [Image Download Failed: client not found]");
                }
            }
        }

        if let Some(client) = &client {
            let _ = client
                .send_chat_presence(&info.chat, ChatPresence::Composing)
                .await;
        }

        let started = Instant::now();
        let result = self.dispatcher.dispatch(&session.webhook_url, &payload).await;
        let elapsed_ms = started.elapsed().as_millis() as i64;

        self.log_analytics(&payload, &incoming, is_mention, elapsed_ms, &result);

        if let Some(client) = &client {
            let _ = client
                .send_chat_presence(&info.chat, ChatPresence::Paused)
                .await;
        }

        let reply = match result {
            Ok(outcome) => outcome.reply,
            Err(e) => {
                error!(session_id = %session_id, error = %e, "webhook delivery failed");
                return;
            }
        };

        if reply.is_empty() {
            debug!(session_id = %session_id, "webhook reply empty, nothing to send");
            return;
        }

        let Some(client) = client else {
            warn!(session_id = %session_id, "no live client to deliver reply");
            return;
        };

        match client.send_text(&info.chat, &reply).await {
            Ok(message_id) => {
                debug!(session_id = %session_id, message_id = %message_id, "reply sent");
                self.log_outgoing(session_id, &incoming, reply);
            }
            Err(e) => {
                error!(session_id = %session_id, error = %e, "failed to send reply");
            }
        }
    }

    /// The bot's own JIDs: primary identity plus LID alias, when known.
    async fn bot_jids(&self, session_id: &str) -> Vec<Jid> {
        let Some(client) = self.get(session_id).await else {
            return Vec::new();
        };
        let mut targets = Vec::new();
        if let Some(jid) = client.device_jid() {
            targets.push(jid);
        }
        if let Some(lid) = client.lid_jid() {
            targets.push(lid);
        }
        targets
    }

    fn log_incoming(&self, payload: &WebhookPayload, incoming: &IncomingMessage) {
        let info = &incoming.info;
        let record = MessageLogRecord {
            session_id: payload.session_id.clone(),
            direction: Direction::Incoming,
            from_number: payload.from.clone(),
            to_number: String::new(),
            message_type: payload.message_type.clone(),
            content: payload.message.clone(),
            media_url: None,
            group_id: info.is_group.then(|| info.chat.user.clone()),
            group_name: info.is_group.then(|| info.push_name.clone()),
            is_group: info.is_group,
            quoted_message_id: incoming.message.quoted_message_id(),
            timestamp: info.timestamp.to_rfc3339(),
        };
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(e) = store.insert_message_log(&record).await {
                warn!(error = %e, "failed to log incoming message");
            }
        });
    }

    fn log_outgoing(&self, session_id: &str, incoming: &IncomingMessage, content: String) {
        let info = &incoming.info;
        let record = MessageLogRecord {
            session_id: session_id.to_string(),
            direction: Direction::Outgoing,
            from_number: String::new(),
            to_number: info.chat.user.clone(),
            message_type: "text".to_string(),
            content,
            media_url: None,
            group_id: info.is_group.then(|| info.chat.user.clone()),
            group_name: info.is_group.then(|| info.push_name.clone()),
            is_group: info.is_group,
            quoted_message_id: None,
            timestamp: Utc::now().to_rfc3339(),
        };
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(e) = store.insert_message_log(&record).await {
                warn!(error = %e, "failed to log outgoing message");
            }
        });
    }

    fn log_analytics(
        &self,
        payload: &WebhookPayload,
        incoming: &IncomingMessage,
        is_mention: bool,
        elapsed_ms: i64,
        result: &Result<wagate_webhook::DispatchOutcome, wagate_webhook::DispatchError>,
    ) {
        let record = AnalyticsRecord {
            session_id: payload.session_id.clone(),
            message_id: incoming.info.id.clone(),
            from_number: payload.from.clone(),
            message_type: payload.message_type.clone(),
            is_group: payload.is_group,
            is_mention,
            webhook_sent: true,
            webhook_success: result.is_ok(),
            webhook_response_time_ms: elapsed_ms,
            webhook_status_code: match result {
                Ok(outcome) => i64::from(outcome.status_code),
                Err(e) => e.status_code().map(i64::from).unwrap_or(0),
            },
            error_message: result.as_ref().err().map(|e| e.to_string()),
        };
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(e) = store.insert_analytics(&record).await {
                warn!(error = %e, "failed to log analytics");
            }
        });
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}
