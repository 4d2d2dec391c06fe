//! Views derived from database snapshots.
//!
//! Every function here is pure and recomputes its view from the whole value
//! it is handed; nothing is maintained between snapshots. Entries that do not
//! parse are skipped, and a missing node reads as an empty collection.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use cloudchat_shared::{ChatMessage, ConversationKey, LobbyMessage, MessageId, Profile, UserId};
use cloudchat_store::{DbPath, Result};

fn entries(value: Option<&Value>) -> impl Iterator<Item = (&String, &Value)> {
    value.and_then(Value::as_object).into_iter().flatten()
}

fn parse_entry<T: for<'de> Deserialize<'de>>(key: &str, value: &Value) -> Option<T> {
    match T::deserialize(value) {
        Ok(record) => Some(record),
        Err(e) => {
            debug!(key, error = %e, "Skipping malformed entry");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Directory
// ---------------------------------------------------------------------------

/// Fields of a profile as stored; the uid comes from the entry's key.
#[derive(Deserialize)]
struct StoredProfile {
    name: String,
    #[serde(default)]
    phone: String,
    email: String,
}

/// Every profile in the `users` node except the viewer's own, in key order.
pub fn directory(users: Option<&Value>, me: &UserId) -> Vec<Profile> {
    entries(users)
        .filter_map(|(key, value)| {
            let uid = UserId::new(key.as_str()).ok()?;
            if uid == *me {
                return None;
            }
            let stored: StoredProfile = parse_entry(key, value)?;
            Some(Profile {
                uid,
                name: stored.name,
                phone: stored.phone,
                email: stored.email,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Conversations
// ---------------------------------------------------------------------------

/// Counterparts of `me` among the stored conversation keys.
pub fn conversation_members<'a, I>(keys: I, me: &UserId) -> BTreeSet<UserId>
where
    I: IntoIterator<Item = &'a str>,
{
    keys.into_iter()
        .filter_map(|raw| counterpart_in(raw, me))
        .collect()
}

/// The other id of a stored key when `me` is one of its two ids.
fn counterpart_in(raw: &str, me: &UserId) -> Option<UserId> {
    match ConversationKey::participants_of(raw) {
        Ok((first, second)) if first == *me => Some(second),
        Ok((first, second)) if second == *me => Some(first),
        Ok(_) => None,
        Err(e) => {
            debug!(key = raw, error = %e, "Skipping unparseable conversation key");
            None
        }
    }
}

/// Per counterpart, how many of their messages to `me` are not yet seen.
/// Counterparts with nothing unseen are absent.
pub fn unseen_counts(chats: Option<&Value>, me: &UserId) -> BTreeMap<UserId, usize> {
    let mut counts = BTreeMap::new();

    for (raw_key, conversation) in entries(chats) {
        let Some(counterpart) = counterpart_in(raw_key, me) else {
            continue;
        };

        let unseen = entries(Some(conversation))
            .filter_map(|(id, value)| parse_entry::<ChatMessage>(id, value))
            .filter(|msg| msg.is_unseen_by(me, &counterpart))
            .count();

        if unseen > 0 {
            *counts.entry(counterpart).or_insert(0) += unseen;
        }
    }

    counts
}

/// Messages of one conversation, oldest first. Equal timestamps fall back
/// to id order, which is creation order.
pub fn conversation_messages(conversation: Option<&Value>) -> Vec<(MessageId, ChatMessage)> {
    let mut messages: Vec<(MessageId, ChatMessage)> = entries(conversation)
        .filter_map(|(id, value)| {
            parse_entry::<ChatMessage>(id, value).map(|msg| (MessageId(id.clone()), msg))
        })
        .collect();
    messages.sort_by(|(a_id, a), (b_id, b)| {
        a.timestamp.cmp(&b.timestamp).then_with(|| a_id.cmp(b_id))
    });
    messages
}

/// `seen = true` writes for every message `counterpart` sent to `viewer` that
/// is still unseen. `conversation` is the thread's database path.
pub fn seen_patches(
    messages: &[(MessageId, ChatMessage)],
    conversation: &DbPath,
    viewer: &UserId,
    counterpart: &UserId,
) -> Result<Vec<(DbPath, Value)>> {
    messages
        .iter()
        .filter(|(_, msg)| msg.is_unseen_by(viewer, counterpart))
        .map(|(id, _)| -> Result<(DbPath, Value)> {
            Ok((conversation.child(id.as_str())?.child("seen")?, Value::Bool(true)))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Lobby
// ---------------------------------------------------------------------------

/// Lobby messages in id (creation) order.
pub fn lobby_messages(lobby: Option<&Value>) -> Vec<(MessageId, LobbyMessage)> {
    let mut messages: Vec<(MessageId, LobbyMessage)> = entries(lobby)
        .filter_map(|(id, value)| {
            parse_entry::<LobbyMessage>(id, value).map(|msg| (MessageId(id.clone()), msg))
        })
        .collect();
    messages.sort_by(|(a, _), (b, _)| a.cmp(b));
    messages
}

/// `readBy/<viewer> = true` writes for every lobby message the viewer has not
/// yet marked as read.
pub fn read_receipt_patches(
    messages: &[(MessageId, LobbyMessage)],
    lobby: &DbPath,
    viewer: &UserId,
) -> Result<Vec<(DbPath, Value)>> {
    messages
        .iter()
        .filter(|(_, msg)| !msg.is_read_by(viewer))
        .map(|(id, _)| -> Result<(DbPath, Value)> {
            Ok((
                lobby.child(id.as_str())?.child("readBy")?.child(viewer.as_str())?,
                Value::Bool(true),
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn uid(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }

    fn msg(sender: &str, receiver: &str, seen: bool, ts: &str) -> Value {
        json!({
            "text": "hi",
            "sender": sender,
            "senderEmail": format!("{sender}@example.com"),
            "receiver": receiver,
            "timestamp": ts,
            "seen": seen,
        })
    }

    #[test]
    fn directory_excludes_viewer() {
        let users = json!({
            "a": { "name": "A", "phone": "1", "email": "a@example.com", "uid": "a" },
            "b": { "name": "B", "email": "b@example.com", "uid": "b" },
            "c": { "garbage": true },
        });
        let dir = directory(Some(&users), &uid("a"));
        assert_eq!(dir.len(), 1);
        assert_eq!(dir[0].uid, uid("b"));
        assert_eq!(dir[0].phone, "");
        assert!(directory(None, &uid("a")).is_empty());
    }

    #[test]
    fn membership_from_keys() {
        let keys = ["a_b", "a_c"];
        let members = conversation_members(keys, &uid("a"));
        assert_eq!(members, BTreeSet::from([uid("b"), uid("c")]));
        assert!(conversation_members(keys, &uid("d")).is_empty());
    }

    #[test]
    fn membership_skips_malformed_keys() {
        let members = conversation_members(["a_b", "garbage", "a_a", "a", "a_c_d"], &uid("a"));
        assert_eq!(members, BTreeSet::from([uid("b")]));
    }

    #[test]
    fn keys_stored_in_reverse_order_still_count() {
        assert_eq!(
            conversation_members(["b_a"], &uid("a")),
            BTreeSet::from([uid("b")])
        );

        let chats = json!({
            "b_a": { "m1": msg("b", "a", false, "2024-05-01T10:00:00Z") },
        });
        let counts = unseen_counts(Some(&chats), &uid("a"));
        assert_eq!(counts, BTreeMap::from([(uid("b"), 1)]));
    }

    #[test]
    fn unseen_counts_only_counterpart_unseen_messages() {
        // Y views; X is the counterpart.
        let chats = json!({
            "X_Y": {
                "m1": msg("X", "Y", false, "2024-05-01T10:00:00Z"),
                "m2": msg("X", "Y", true, "2024-05-01T10:01:00Z"),
                "m3": msg("Y", "X", false, "2024-05-01T10:02:00Z"),
            },
        });
        let counts = unseen_counts(Some(&chats), &uid("Y"));
        assert_eq!(counts.get(&uid("X")), Some(&1));
        assert_eq!(counts.len(), 1);

        // From X's side only Y's unseen message counts.
        let counts = unseen_counts(Some(&chats), &uid("X"));
        assert_eq!(counts.get(&uid("Y")), Some(&1));
    }

    #[test]
    fn unseen_counts_absent_when_all_seen() {
        let chats = json!({
            "a_b": { "m1": msg("b", "a", true, "2024-05-01T10:00:00Z") },
            "b_c": { "m2": msg("c", "b", false, "2024-05-01T10:00:00Z") },
        });
        assert!(unseen_counts(Some(&chats), &uid("a")).is_empty());
        assert!(unseen_counts(None, &uid("a")).is_empty());
    }

    #[test]
    fn messages_sorted_by_timestamp() {
        let conv = json!({
            "-B": msg("a", "b", false, "2024-05-01T10:05:00Z"),
            "-A": msg("b", "a", false, "2024-05-01T10:00:00Z"),
            "-C": msg("a", "b", false, "2024-05-01T10:05:00Z"),
            "-D": { "text": 5 },
        });
        let ids: Vec<_> = conversation_messages(Some(&conv))
            .into_iter()
            .map(|(id, _)| id.0)
            .collect();
        assert_eq!(ids, ["-A", "-B", "-C"]);
    }

    #[test]
    fn seen_patches_cover_counterpart_unseen_only() {
        let conv = json!({
            "m1": msg("b", "a", false, "2024-05-01T10:00:00Z"),
            "m2": msg("b", "a", false, "2024-05-01T10:01:00Z"),
            "m3": msg("b", "a", true, "2024-05-01T10:02:00Z"),
            "m4": msg("a", "b", false, "2024-05-01T10:03:00Z"),
        });
        let messages = conversation_messages(Some(&conv));
        let base = DbPath::parse("chats/a_b").unwrap();
        let patches = seen_patches(&messages, &base, &uid("a"), &uid("b")).unwrap();
        let paths: Vec<_> = patches.iter().map(|(p, _)| p.encode()).collect();
        assert_eq!(paths, ["chats/a_b/m1/seen", "chats/a_b/m2/seen"]);
        assert!(patches.iter().all(|(_, v)| *v == Value::Bool(true)));
    }

    #[test]
    fn lobby_patches_skip_already_read() {
        let lobby = json!({
            "-1": { "text": "x", "sender": "a@example.com", "timestamp": 1, "readBy": { "a": true } },
            "-2": { "text": "y", "sender": "b@example.com", "timestamp": 2, "readBy": { "b": true, "a": true } },
        });
        let messages = lobby_messages(Some(&lobby));
        assert_eq!(messages.len(), 2);
        let base = DbPath::parse("messages").unwrap();
        let patches = read_receipt_patches(&messages, &base, &uid("b")).unwrap();
        let paths: Vec<_> = patches.iter().map(|(p, _)| p.encode()).collect();
        assert_eq!(paths, ["messages/-1/readBy/b"]);
    }
}
