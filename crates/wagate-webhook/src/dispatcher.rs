// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP delivery of webhook payloads.
//!
//! Provides [`WebhookDispatcher`] which handles encoding selection (JSON vs
//! multipart), per-attempt timeouts, and bounded retry with linear backoff.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use thiserror::Error;
use tracing::{debug, warn};

use crate::extract;
use crate::payload::WebhookPayload;

/// Maximum delivery attempts per payload.
const MAX_ATTEMPTS: u32 = 3;

/// Per-attempt timeout for multipart uploads.
const MEDIA_TIMEOUT: Duration = Duration::from_secs(60);

/// Per-attempt timeout for JSON bodies.
const JSON_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of a successful dispatch.
#[derive(Debug, Clone, Default)]
pub struct DispatchOutcome {
    /// Reply text extracted from the response body; empty when the endpoint
    /// had nothing to say, or when no URL was configured.
    pub reply: String,
    /// HTTP status of the successful response; 0 when no call was made.
    pub status_code: u16,
}

/// Final delivery failure, carrying the last observed attempt.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to encode webhook payload: {source}")]
    Encode {
        #[source]
        source: serde_json::Error,
    },

    #[error("webhook returned status {status} after {attempts} attempts")]
    Status { status: u16, attempts: u32 },

    #[error("webhook request failed after {attempts} attempts: {source}")]
    Transport {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },
}

impl DispatchError {
    /// The last observed HTTP status, when the failure saw a response at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            DispatchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// HTTP client for webhook delivery.
#[derive(Debug, Clone, Default)]
pub struct WebhookDispatcher {
    client: reqwest::Client,
}

impl WebhookDispatcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Delivers `payload` to `url` and returns the extracted reply.
    ///
    /// An empty URL short-circuits: no HTTP attempt, no reply, no error.
    /// Non-2xx responses and transport errors are retried up to
    /// [`MAX_ATTEMPTS`] times with sleeps of 1 s and 2 s between attempts.
    pub async fn dispatch(
        &self,
        url: &str,
        payload: &WebhookPayload,
    ) -> Result<DispatchOutcome, DispatchError> {
        if url.is_empty() {
            return Ok(DispatchOutcome::default());
        }

        let has_media = payload.has_media();
        let timeout = if has_media { MEDIA_TIMEOUT } else { JSON_TIMEOUT };

        // JSON bodies are encoded once and reused; multipart bodies are
        // rebuilt per attempt because the form consumes its parts.
        let json_body = if has_media {
            None
        } else {
            Some(serde_json::to_vec(payload).map_err(|source| DispatchError::Encode { source })?)
        };

        let mut last_error = DispatchError::Status {
            status: 0,
            attempts: 0,
        };

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_secs(u64::from(attempt))).await;
            }

            let request = match &json_body {
                Some(body) => self
                    .client
                    .post(url)
                    .header(CONTENT_TYPE, "application/json")
                    .body(body.clone()),
                None => self.client.post(url).multipart(build_form(payload)),
            };

            match request.timeout(timeout).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let body = response.text().await.unwrap_or_default();
                        debug!(status = status.as_u16(), attempt, "webhook delivered");
                        return Ok(DispatchOutcome {
                            reply: extract::extract_reply(&body),
                            status_code: status.as_u16(),
                        });
                    }
                    warn!(
                        status = status.as_u16(),
                        attempt,
                        "webhook returned non-success status"
                    );
                    last_error = DispatchError::Status {
                        status: status.as_u16(),
                        attempts: attempt + 1,
                    };
                }
                Err(source) => {
                    warn!(error = %source, attempt, "webhook request failed");
                    last_error = DispatchError::Transport {
                        attempts: attempt + 1,
                        source,
                    };
                }
            }
        }

        Err(last_error)
    }
}

/// Builds the multipart form for a media payload.
///
/// Field set mirrors the JSON body, plus a `file` part carrying the media
/// bytes with their original mime type and a derived filename.
fn build_form(payload: &WebhookPayload) -> Form {
    let mut form = Form::new()
        .text("session_id", payload.session_id.clone())
        .text("from", payload.from.clone())
        .text("to", payload.to.clone())
        .text("message", payload.message.clone())
        .text("timestamp", payload.timestamp.to_rfc3339())
        .text("is_group", payload.is_group.to_string())
        .text("push_name", payload.push_name.clone())
        .text("message_type", payload.message_type.clone());

    if let Some(group) = &payload.group_info {
        form = form.text(
            "group_info",
            serde_json::to_string(group).unwrap_or_default(),
        );
    }

    let part = Part::bytes(payload.media_data.clone()).file_name(payload.media_name.clone());
    let part = match part.mime_str(&payload.media_mime_type) {
        Ok(part) => part,
        Err(_) => Part::bytes(payload.media_data.clone()).file_name(payload.media_name.clone()),
    };
    form.part("file", part)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Instant;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn text_payload(message: &str) -> WebhookPayload {
        WebhookPayload {
            session_id: "sess-1".into(),
            from: "6281".into(),
            to: String::new(),
            message: message.into(),
            timestamp: Utc::now(),
            is_group: false,
            group_info: None,
            push_name: "Alice".into(),
            message_type: "text".into(),
            media_data: Vec::new(),
            media_name: String::new(),
            media_mime_type: String::new(),
        }
    }

    fn image_payload() -> WebhookPayload {
        let mut payload = text_payload("look");
        payload.message_type = "image".into();
        payload.media_data = vec![0xFF, 0xD8, 0xFF, 0xE0];
        payload.media_name = "image_1700000000.jpg".into();
        payload.media_mime_type = "image/jpeg".into();
        payload
    }

    #[tokio::test]
    async fn empty_url_short_circuits() {
        let dispatcher = WebhookDispatcher::new();
        let outcome = dispatcher.dispatch("", &text_payload("hi")).await.unwrap();
        assert_eq!(outcome.reply, "");
        assert_eq!(outcome.status_code, 0);
    }

    #[tokio::test]
    async fn json_delivery_extracts_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .and(header("content-type", "application/json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([{"output": "Hi there"}])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let dispatcher = WebhookDispatcher::new();
        let outcome = dispatcher
            .dispatch(&server.uri(), &text_payload("hello"))
            .await
            .unwrap();
        assert_eq!(outcome.reply, "Hi there");
        assert_eq!(outcome.status_code, 200);
    }

    #[tokio::test]
    async fn json_body_carries_wire_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let dispatcher = WebhookDispatcher::new();
        dispatcher
            .dispatch(&server.uri(), &text_payload("hello"))
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["session_id"], "sess-1");
        assert_eq!(body["message"], "hello");
        assert_eq!(body["to"], "");
        assert_eq!(body["message_type"], "text");
    }

    #[tokio::test]
    async fn media_payload_is_sent_as_multipart() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("\"ok\""))
            .expect(1)
            .mount(&server)
            .await;

        let dispatcher = WebhookDispatcher::new();
        let outcome = dispatcher
            .dispatch(&server.uri(), &image_payload())
            .await
            .unwrap();
        assert_eq!(outcome.reply, "ok");

        let requests = server.received_requests().await.unwrap();
        let content_type = requests[0]
            .headers
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap();
        assert!(content_type.starts_with("multipart/form-data"));

        let body = String::from_utf8_lossy(&requests[0].body);
        assert!(body.contains("name=\"message\""));
        assert!(body.contains("look"));
        assert!(body.contains("name=\"message_type\""));
        assert!(body.contains("name=\"file\""));
        assert!(body.contains("filename=\"image_1700000000.jpg\""));
        assert!(body.contains("image/jpeg"));
    }

    #[tokio::test]
    async fn persistent_failure_makes_exactly_three_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let dispatcher = WebhookDispatcher::new();
        let started = Instant::now();
        let err = dispatcher
            .dispatch(&server.uri(), &text_payload("hello"))
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), Some(500));
        assert!(err.to_string().contains("500"));
        // Backoff sleeps of 1 s + 2 s between the three attempts.
        assert!(started.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test]
    async fn recovers_when_a_retry_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"text": "late"})),
            )
            .mount(&server)
            .await;

        let dispatcher = WebhookDispatcher::new();
        let outcome = dispatcher
            .dispatch(&server.uri(), &text_payload("hello"))
            .await
            .unwrap();
        assert_eq!(outcome.reply, "late");
    }

    #[tokio::test]
    async fn transport_error_has_no_status_code() {
        // Nothing listens on this port.
        let dispatcher = WebhookDispatcher::new();
        let err = dispatcher
            .dispatch("http://127.0.0.1:9/", &text_payload("hello"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), None);
        assert!(matches!(err, DispatchError::Transport { attempts: 3, .. }));
    }
}
