// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! REST handlers for session lifecycle.
//!
//! Handlers validate input and delegate to the registry and store; everything
//! stateful lives behind those two.

use axum::{
    extract::{Path, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::error;

use wagate_core::{DeviceInfo, SessionRecord, SessionStatus, WagateError};

use crate::server::GatewayState;

/// Request body for POST /v1/sessions.
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub name: String,
    #[serde(default)]
    pub webhook_url: String,
    #[serde(default)]
    pub is_group_response_enabled: bool,
}

/// Session representation returned to clients; omits the owner id.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: String,
    pub name: String,
    pub webhook_url: String,
    pub status: SessionStatus,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub phone_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_info: Option<DeviceInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_connected: Option<String>,
    pub is_group_response_enabled: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<SessionRecord> for SessionView {
    fn from(record: SessionRecord) -> Self {
        Self {
            session_id: record.id,
            name: record.name,
            webhook_url: record.webhook_url,
            status: record.status,
            phone_number: record.phone_number,
            device_info: record.device_info,
            last_connected: record.last_connected,
            is_group_response_enabled: record.is_group_response_enabled,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionView>,
}

#[derive(Debug, Serialize)]
pub struct ConnectResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub live_sessions: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

fn internal_error(context: &str, e: &WagateError) -> Response {
    error!(error = %e, "{context}");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, context)
}

/// Webhook URLs must be empty (dispatch disabled) or absolute http(s).
fn webhook_url_valid(url: &str) -> bool {
    if url.is_empty() {
        return true;
    }
    match url.parse::<Uri>() {
        Ok(uri) => matches!(uri.scheme_str(), Some("http") | Some("https")),
        Err(_) => false,
    }
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Response {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        live_sessions: state.registry.live_count().await,
    })
    .into_response()
}

/// POST /v1/sessions
pub async fn create_session(
    State(state): State<GatewayState>,
    Json(body): Json<CreateSessionRequest>,
) -> Response {
    let name = body.name.trim();
    if name.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "session name is required");
    }
    if !webhook_url_valid(&body.webhook_url) {
        return error_response(
            StatusCode::BAD_REQUEST,
            "webhook_url must be an absolute http(s) URL",
        );
    }

    let now = Utc::now().to_rfc3339();
    let record = SessionRecord {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: state.owner_id.clone(),
        name: name.to_string(),
        webhook_url: body.webhook_url,
        status: SessionStatus::Disconnected,
        phone_number: String::new(),
        device_info: None,
        last_connected: None,
        is_group_response_enabled: body.is_group_response_enabled,
        created_at: now.clone(),
        updated_at: now,
    };

    match state.store.create_session(&record).await {
        Ok(()) => (StatusCode::CREATED, Json(SessionView::from(record))).into_response(),
        Err(e) if e.to_string().contains("UNIQUE constraint failed") => {
            error_response(StatusCode::CONFLICT, "a session with this name already exists")
        }
        Err(e) => internal_error("failed to create session", &e),
    }
}

/// GET /v1/sessions
pub async fn list_sessions(State(state): State<GatewayState>) -> Response {
    match state.store.list_sessions(&state.owner_id).await {
        Ok(records) => Json(SessionListResponse {
            sessions: records.into_iter().map(SessionView::from).collect(),
        })
        .into_response(),
        Err(e) => internal_error("failed to list sessions", &e),
    }
}

/// GET /v1/sessions/{id}
pub async fn get_session(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Response {
    match state.store.get_session(&id).await {
        Ok(Some(record)) => Json(SessionView::from(record)).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "session not found"),
        Err(e) => internal_error("failed to load session", &e),
    }
}

/// POST /v1/sessions/{id}/connect
pub async fn connect_session(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Response {
    match state.registry.connect(&id).await {
        Ok(outcome) => Json(ConnectResponse {
            status: outcome.to_string(),
        })
        .into_response(),
        Err(WagateError::NotFound(_)) => {
            error_response(StatusCode::NOT_FOUND, "session not found")
        }
        Err(e) => {
            error!(session_id = %id, error = %e, "connect failed");
            error_response(StatusCode::BAD_GATEWAY, "failed to connect session")
        }
    }
}

/// POST /v1/sessions/{id}/disconnect
pub async fn disconnect_session(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Response {
    state.registry.disconnect(&id, true).await;
    Json(ConnectResponse {
        status: SessionStatus::Disconnected.to_string(),
    })
    .into_response()
}

/// DELETE /v1/sessions/{id}
pub async fn delete_session(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Response {
    // Tear the live client down first; the row delete cascades the rest.
    state.registry.disconnect(&id, false).await;
    match state.store.delete_session(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => internal_error("failed to delete session", &e),
    }
}
