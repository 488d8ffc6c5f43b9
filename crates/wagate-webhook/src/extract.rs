// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply extraction from heterogeneous webhook response bodies.
//!
//! AI/automation backends answer in wildly different shapes: a bare string,
//! `{"output": "..."}`, n8n-style `[{"output": "..."}]`, nested `data`/`json`
//! wrappers, or plain text that is not JSON at all. The walk below settles on
//! the first non-empty string it can find.

use serde_json::Value;

/// Keys probed, in order, on JSON objects.
const REPLY_KEYS: [&str; 6] = ["output", "text", "message", "response", "body", "content"];

/// Extracts the reply text from a raw response body.
///
/// A body that fails to parse as JSON is returned verbatim.
pub fn extract_reply(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => extract_text(&value),
        Err(_) => body.to_string(),
    }
}

fn extract_text(value: &Value) -> String {
    match value {
        Value::Array(items) => items.first().map(extract_text).unwrap_or_default(),
        Value::Object(map) => {
            for key in REPLY_KEYS {
                if let Some(Value::String(s)) = map.get(key) {
                    if !s.is_empty() {
                        return s.clone();
                    }
                }
            }
            if let Some(nested) = map.get("data") {
                return extract_text(nested);
            }
            if let Some(nested) = map.get("json") {
                return extract_text(nested);
            }
            String::new()
        }
        Value::String(s) => s.clone(),
        _ => String::new(),
    }
}
