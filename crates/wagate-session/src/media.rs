// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Media materialization for the inbound pipeline.
//!
//! Only images are downloaded in this version. A failed or timed-out
//! download degrades the payload to text with a diagnostic suffix; the
//! message still reaches the webhook.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use wagate_core::wa::ImageContent;
use wagate_core::WaClient;
use wagate_webhook::WebhookPayload;

/// Deadline for a single media download.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Downloads the image and attaches bytes, mime type, and filename to the
/// payload. On failure the payload continues as text.
pub(crate) async fn attach_image(
    payload: &mut WebhookPayload,
    client: &dyn WaClient,
    image: &ImageContent,
    timestamp: DateTime<Utc>,
) {
    match tokio::time::timeout(DOWNLOAD_TIMEOUT, client.download(&image.media)).await {
        Ok(Ok(data)) => {
            debug!(
                bytes = data.len(),
                mime = %image.mimetype,
                "image downloaded"
            );
            payload.media_name = format!(
                "image_{}.{}",
                timestamp.timestamp(),
                extension_for_mime(&image.mimetype)
            );
            payload.media_mime_type = image.mimetype.clone();
            payload.media_data = data;
        }
        Ok(Err(e)) => {
            warn!(error = %e, "image download failed");
            payload
                .message
                .push_str(&format!(" [Image Download Failed: {e}]"));
        }
        Err(_) => {
            warn!("image download timed out");
            payload
                .message
                .push_str(" [Image Download Failed: timed out]");
        }
    }
}

/// File extension for the payload filename, derived from the mime type.
pub(crate) fn extension_for_mime(mime: &str) -> &'static str {
    if mime.contains("png") {
        "png"
    } else if mime.contains("webp") {
        "webp"
    } else {
        "jpg"
    }
}
