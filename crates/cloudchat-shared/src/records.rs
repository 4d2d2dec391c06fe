//! Records stored in the realtime database.
//!
//! Field names follow the JSON layout the web client wrote, so data written by
//! either client reads back the same way:
//!
//! ```text
//! users/<uid>          Profile
//! chats/<key>/<msgId>  ChatMessage
//! messages/<msgId>     LobbyMessage
//! ```

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::UserId;

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// Directory entry written once at sign-up.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub uid: UserId,
    pub name: String,
    /// Optional at sign-up; stored as an empty string when not given.
    #[serde(default)]
    pub phone: String,
    pub email: String,
}

// ---------------------------------------------------------------------------
// Direct message
// ---------------------------------------------------------------------------

/// A message in a two-party conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub text: String,
    pub sender: UserId,
    #[serde(default)]
    pub sender_email: String,
    pub receiver: UserId,
    /// RFC 3339 on the wire.
    pub timestamp: DateTime<Utc>,
    /// Set once by the receiver's client, never cleared. Absent means unseen.
    #[serde(default)]
    pub seen: bool,
}

impl ChatMessage {
    /// Whether `viewer` still has to acknowledge this message from `counterpart`.
    pub fn is_unseen_by(&self, viewer: &UserId, counterpart: &UserId) -> bool {
        !self.seen && self.sender == *counterpart && self.receiver == *viewer
    }
}

// ---------------------------------------------------------------------------
// Lobby message
// ---------------------------------------------------------------------------

/// A message in the global lobby room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LobbyMessage {
    pub text: String,
    /// Author's email address.
    pub sender: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Identities that have received the message, the author included.
    #[serde(default, rename = "readBy")]
    pub read_by: BTreeMap<UserId, bool>,
}

impl LobbyMessage {
    pub fn is_read_by(&self, id: &UserId) -> bool {
        self.read_by.get(id).copied().unwrap_or(false)
    }

    /// `Read` once anyone besides the author is listed in `readBy`, whatever
    /// flag value was stored for them.
    pub fn receipt(&self) -> ReceiptStatus {
        if self.read_by.len() > 1 {
            ReceiptStatus::Read
        } else {
            ReceiptStatus::Sent
        }
    }
}

/// Delivery state shown under a lobby message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiptStatus {
    /// Only the author has it.
    Sent,
    /// At least one other identity has read it.
    Read,
}

impl fmt::Display for ReceiptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReceiptStatus::Sent => f.write_str("✓ Sent"),
            ReceiptStatus::Read => f.write_str("✓✓ Read"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }

    #[test]
    fn chat_message_uses_web_field_names() {
        let msg = ChatMessage {
            text: "hi".into(),
            sender: uid("u1"),
            sender_email: "u1@example.com".into(),
            receiver: uid("u2"),
            timestamp: DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            seen: false,
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["senderEmail"], "u1@example.com");
        assert_eq!(value["receiver"], "u2");
        assert_eq!(value["seen"], false);
    }

    #[test]
    fn chat_message_without_seen_flag_is_unseen() {
        let value = serde_json::json!({
            "text": "hi",
            "sender": "u1",
            "receiver": "u2",
            "timestamp": "2024-05-01T10:00:00.000Z",
        });
        let msg: ChatMessage = serde_json::from_value(value).unwrap();
        assert!(!msg.seen);
        assert!(msg.is_unseen_by(&uid("u2"), &uid("u1")));
        assert!(!msg.is_unseen_by(&uid("u1"), &uid("u2")));
    }

    #[test]
    fn lobby_receipt_flips_once_someone_else_reads() {
        let mut msg = LobbyMessage {
            text: "hello all".into(),
            sender: "a@example.com".into(),
            timestamp: 1_714_557_600_000,
            read_by: BTreeMap::from([(uid("a"), true)]),
        };
        assert_eq!(msg.receipt(), ReceiptStatus::Sent);
        assert!(msg.is_read_by(&uid("a")));
        assert!(!msg.is_read_by(&uid("b")));

        msg.read_by.insert(uid("b"), true);
        assert_eq!(msg.receipt(), ReceiptStatus::Read);
        assert_eq!(msg.receipt().to_string(), "✓✓ Read");
    }

    #[test]
    fn lobby_message_reads_read_by_map() {
        let value = serde_json::json!({
            "text": "yo",
            "sender": "a@example.com",
            "timestamp": 1,
            "readBy": { "a": true, "b": true },
        });
        let msg: LobbyMessage = serde_json::from_value(value).unwrap();
        assert_eq!(msg.read_by.len(), 2);
        assert_eq!(msg.receipt(), ReceiptStatus::Read);
    }

    #[test]
    fn lobby_receipt_counts_listed_readers_not_flag_values() {
        let value = serde_json::json!({
            "text": "yo",
            "sender": "a@example.com",
            "timestamp": 1,
            "readBy": { "a": true, "b": false },
        });
        let msg: LobbyMessage = serde_json::from_value(value).unwrap();
        assert!(!msg.is_read_by(&uid("b")));
        assert_eq!(msg.receipt(), ReceiptStatus::Read);
    }
}
