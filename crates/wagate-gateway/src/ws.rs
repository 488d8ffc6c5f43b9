// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket subscription endpoint for dashboard clients.
//!
//! `GET /ws/{session_id}?token=…` upgrades after the origin allow-list and
//! access token pass. Each connection runs two tasks: a writer draining the
//! subscriber queue into frames, and a reader whose completion (close frame,
//! error, or hangup) unregisters the subscriber.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::debug;

use wagate_broadcast::origin_allowed;

use crate::server::GatewayState;

/// Query parameters on the WebSocket handshake.
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    #[serde(default)]
    token: Option<String>,
}

/// WebSocket upgrade handler.
pub async fn ws_handler(
    Path(session_id): Path<String>,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
    State(state): State<GatewayState>,
    ws: WebSocketUpgrade,
) -> Response {
    let origin = headers
        .get("origin")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    if !origin_allowed(origin, &state.allowed_origins) {
        debug!(origin, "websocket origin rejected");
        return StatusCode::FORBIDDEN.into_response();
    }

    if !state.auth.token_matches(query.token.as_deref()) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, state, session_id))
}

async fn handle_socket(socket: WebSocket, state: GatewayState, session_id: String) {
    let (mut sink, mut stream) = socket.split();

    let subscription = state.broadcaster.subscribe(&session_id).await;
    let subscriber_id = subscription.id;
    let mut frames = subscription.receiver;
    debug!(session_id = %session_id, subscriber = subscriber_id, "websocket subscribed");

    // Writer: queue -> frames; a closed queue ends with a close frame.
    let writer = tokio::spawn(async move {
        while let Some(frame) = frames.recv().await {
            if sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
        let _ = sink.send(Message::Close(None)).await;
    });

    // Reader: drain until the peer goes away. Inbound content is ignored;
    // the socket is broadcast-only.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => {}
        }
    }

    state.broadcaster.unsubscribe(&session_id, subscriber_id).await;
    // Unregistering dropped the queue's sender, so the writer drains and exits.
    let _ = writer.await;
    debug!(session_id = %session_id, subscriber = subscriber_id, "websocket closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ws_query_token_is_optional() {
        let query: WsQuery = serde_json::from_str("{}").unwrap();
        assert!(query.token.is_none());

        let query: WsQuery = serde_json::from_str(r#"{"token": "abc"}"#).unwrap();
        assert_eq!(query.token.as_deref(), Some("abc"));
    }
}
