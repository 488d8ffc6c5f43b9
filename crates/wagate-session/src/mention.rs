// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The mention detector for group messages.
//!
//! Pure functions over the message and the bot's own JIDs; no I/O. Mention
//! lists may carry either the primary JID or its hidden-user (LID) alias, so
//! the token set covers both server forms.

use wagate_core::jid::HIDDEN_USER_SERVER;
use wagate_core::{Jid, WaMessage};

/// Builds the search tokens for a set of target JIDs.
///
/// Per target: bare user, full string, non-AD string, and (unless already on
/// the LID server) the LID-alias user and full string.
pub fn search_tokens(targets: &[Jid]) -> Vec<String> {
    let mut tokens = Vec::new();
    for jid in targets {
        if jid.user.is_empty() && jid.server.is_empty() {
            continue;
        }
        tokens.push(jid.user.clone());
        tokens.push(jid.to_string());
        tokens.push(jid.to_non_ad().to_string());

        if jid.server != HIDDEN_USER_SERVER && !jid.user.is_empty() {
            let lid = jid.lid_alias();
            tokens.push(lid.user.clone());
            tokens.push(lid.to_string());
        }
    }
    tokens.retain(|token| !token.is_empty());
    tokens
}

/// Whether a group message addresses any of the target JIDs.
///
/// Explicit mention lists win; the plain text is scanned for `@<token>` as a
/// fallback for clients that do not populate context info.
pub fn is_mentioned(message: &WaMessage, raw_text: &str, targets: &[Jid]) -> bool {
    let tokens = search_tokens(targets);
    if tokens.is_empty() {
        return false;
    }

    for context in message.context_infos() {
        for mentioned in &context.mentioned_jids {
            if tokens.iter().any(|token| mentioned.contains(token.as_str())) {
                return true;
            }
        }
    }

    let text = raw_text.to_lowercase();
    tokens
        .iter()
        .any(|token| text.contains(&format!("@{}", token.to_lowercase())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wagate_core::jid::DEFAULT_USER_SERVER;
    use wagate_core::wa::{ContextInfo, ExtendedTextContent};

    fn primary() -> Jid {
        Jid::with_device("6281234", DEFAULT_USER_SERVER, 12)
    }

    fn message_with_mentions(mentions: &[&str]) -> WaMessage {
        WaMessage {
            extended_text: Some(ExtendedTextContent {
                text: "hello".into(),
                context_info: Some(ContextInfo {
                    mentioned_jids: mentions.iter().map(|m| m.to_string()).collect(),
                    quoted_message_id: None,
                }),
            }),
            ..WaMessage::default()
        }
    }

    #[test]
    fn token_set_covers_all_forms() {
        let tokens = search_tokens(&[primary()]);
        assert!(tokens.contains(&"6281234".to_string()));
        assert!(tokens.contains(&"6281234@s.whatsapp.net:12".to_string()));
        assert!(tokens.contains(&"6281234@s.whatsapp.net".to_string()));
        assert!(tokens.contains(&"6281234@lid".to_string()));
    }

    #[test]
    fn lid_target_does_not_duplicate_alias() {
        let lid = Jid::new("990011", HIDDEN_USER_SERVER);
        let tokens = search_tokens(&[lid]);
        assert!(tokens.contains(&"990011@lid".to_string()));
        // No alias-of-alias entries beyond the direct forms.
        assert_eq!(
            tokens
                .iter()
                .filter(|t| t.as_str() == "990011@lid")
                .count(),
            2 // full string and non-AD string coincide for a bare LID
        );
    }

    #[test]
    fn explicit_mention_of_primary_jid() {
        let msg = message_with_mentions(&["6281234@s.whatsapp.net"]);
        assert!(is_mentioned(&msg, "hello", &[primary()]));
    }

    #[test]
    fn explicit_mention_via_lid_alias() {
        let msg = message_with_mentions(&["6281234@lid"]);
        assert!(is_mentioned(&msg, "hello everyone", &[primary()]));
    }

    #[test]
    fn text_fallback_matches_at_number() {
        let msg = WaMessage {
            conversation: Some("hey @6281234 are you there".into()),
            ..WaMessage::default()
        };
        assert!(is_mentioned(
            &msg,
            "hey @6281234 are you there",
            &[primary()]
        ));
    }

    #[test]
    fn text_fallback_is_case_insensitive_on_server() {
        let msg = WaMessage::default();
        assert!(is_mentioned(
            &msg,
            "ping @6281234@S.WHATSAPP.NET please",
            &[primary()]
        ));
    }

    #[test]
    fn unrelated_message_is_not_a_mention() {
        let msg = message_with_mentions(&["7999@s.whatsapp.net"]);
        assert!(!is_mentioned(&msg, "hello everyone", &[primary()]));
    }

    #[test]
    fn no_targets_means_no_mention() {
        let msg = message_with_mentions(&["6281234@s.whatsapp.net"]);
        assert!(!is_mentioned(&msg, "@6281234", &[]));
    }

    #[test]
    fn empty_jid_targets_are_skipped() {
        let empty = Jid::default();
        let msg = WaMessage::default();
        assert!(!is_mentioned(&msg, "anything @ all", &[empty]));
    }
}
