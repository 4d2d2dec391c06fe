use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{CONVERSATION_SEPARATOR, FORBIDDEN_KEY_CHARS, PATH_SEPARATOR};
use crate::error::KeyError;

/// Opaque identity id issued by the auth backend at sign-up.
///
/// Ids are usable as a single database path segment and never contain the
/// conversation separator, so a [`ConversationKey`] always splits back into
/// exactly the two ids it was built from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Result<Self, KeyError> {
        let id = id.into();
        if id.is_empty() {
            return Err(KeyError::Empty);
        }
        if id.contains(CONVERSATION_SEPARATOR) {
            return Err(KeyError::ContainsSeparator(id));
        }
        if let Some(ch) = id
            .chars()
            .find(|c| *c == PATH_SEPARATOR || FORBIDDEN_KEY_CHARS.contains(c) || c.is_control())
        {
            return Err(KeyError::ForbiddenChar { id, ch });
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, for log lines.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl FromStr for UserId {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Backend-generated key of a message (a push id).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Order-independent identifier of a two-party conversation.
///
/// Rendered as `<smaller id>_<larger id>`; the same pair yields the same key
/// whichever side builds it. "Smaller" is byte order of the UTF-8 ids. The web
/// client compares UTF-16 code units instead, which disagrees only for ids
/// mixing characters above U+FFFF with characters in U+E000..=U+FFFF.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConversationKey {
    low: UserId,
    high: UserId,
}

impl ConversationKey {
    /// Build the key for `a` and `b`. Talking to oneself has no key.
    pub fn new(a: &UserId, b: &UserId) -> Result<Self, KeyError> {
        match a.cmp(b) {
            Ordering::Less => Ok(Self {
                low: a.clone(),
                high: b.clone(),
            }),
            Ordering::Greater => Ok(Self {
                low: b.clone(),
                high: a.clone(),
            }),
            Ordering::Equal => Err(KeyError::SelfConversation(a.clone())),
        }
    }

    /// Parse a key in the canonical form this type renders.
    pub fn parse(key: &str) -> Result<Self, KeyError> {
        let (first, second) = Self::participants_of(key)?;
        if first > second {
            return Err(KeyError::MalformedKey(key.to_string()));
        }
        Ok(Self {
            low: first,
            high: second,
        })
    }

    /// The two ids of a key read back from storage, in stored order.
    ///
    /// Other clients may order the ids differently (the web client compares
    /// UTF-16 code units, this type compares bytes), so stored keys are only
    /// required to name two distinct valid ids.
    pub fn participants_of(key: &str) -> Result<(UserId, UserId), KeyError> {
        let malformed = || KeyError::MalformedKey(key.to_string());
        let (first, second) = key.split_once(CONVERSATION_SEPARATOR).ok_or_else(malformed)?;
        let first = UserId::new(first).map_err(|_| malformed())?;
        let second = UserId::new(second).map_err(|_| malformed())?;
        if first == second {
            return Err(malformed());
        }
        Ok((first, second))
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.low, CONVERSATION_SEPARATOR, self.high)
    }
}

impl FromStr for ConversationKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }

    #[test]
    fn key_is_symmetric() {
        let (a, b) = (uid("alice"), uid("bob"));
        let ab = ConversationKey::new(&a, &b).unwrap();
        let ba = ConversationKey::new(&b, &a).unwrap();
        assert_eq!(ab, ba);
        assert_eq!(ab.to_string(), "alice_bob");
        assert_eq!(ba.to_string(), "alice_bob");
    }

    #[test]
    fn key_orders_by_native_string_order() {
        let k = ConversationKey::new(&uid("u2"), &uid("u1")).unwrap();
        assert_eq!(k.to_string(), "u1_u2");

        // uppercase sorts before lowercase
        let k = ConversationKey::new(&uid("a"), &uid("Z")).unwrap();
        assert_eq!(k.to_string(), "Z_a");
    }

    #[test]
    fn keys_for_distinct_pairs_differ() {
        let (a, b, c) = (uid("a"), uid("b"), uid("c"));
        let ab = ConversationKey::new(&a, &b).unwrap();
        let ac = ConversationKey::new(&a, &c).unwrap();
        let bc = ConversationKey::new(&b, &c).unwrap();
        assert_ne!(ab, ac);
        assert_ne!(ab, bc);
        assert_ne!(ac.to_string(), bc.to_string());
    }

    #[test]
    fn self_conversation_is_rejected() {
        let a = uid("a");
        assert_eq!(
            ConversationKey::new(&a, &a),
            Err(KeyError::SelfConversation(a.clone()))
        );
    }

    #[test]
    fn user_id_rejects_separator_and_path_chars() {
        assert_eq!(UserId::new(""), Err(KeyError::Empty));
        assert!(matches!(
            UserId::new("a_b"),
            Err(KeyError::ContainsSeparator(_))
        ));
        assert!(matches!(
            UserId::new("a/b"),
            Err(KeyError::ForbiddenChar { ch: '/', .. })
        ));
        assert!(matches!(
            UserId::new("a.b"),
            Err(KeyError::ForbiddenChar { ch: '.', .. })
        ));
    }

    #[test]
    fn parse_recovers_participants() {
        let k = ConversationKey::parse("a_b").unwrap();
        assert_eq!(k, ConversationKey::new(&uid("b"), &uid("a")).unwrap());
        assert_eq!(k.to_string(), "a_b");
    }

    #[test]
    fn stored_keys_may_list_ids_in_either_order() {
        assert_eq!(
            ConversationKey::participants_of("b_a").unwrap(),
            (uid("b"), uid("a"))
        );
        assert!(ConversationKey::participants_of("a_a").is_err());
        assert!(ConversationKey::participants_of("ab").is_err());
        assert!(ConversationKey::participants_of("a_b_c").is_err());
    }

    #[test]
    fn byte_order_differs_from_utf16_order_for_mixed_planes() {
        // U+FF61 is one UTF-16 unit 0xFF61; U+1F600 starts with 0xD83D.
        let bmp = uid("\u{FF61}");
        let astral = uid("\u{1F600}");
        let key = ConversationKey::new(&bmp, &astral).unwrap();
        assert_eq!(key.to_string(), "\u{FF61}_\u{1F600}");
    }

    #[test]
    fn parse_rejects_non_canonical_keys() {
        assert!(ConversationKey::parse("b_a").is_err());
        assert!(ConversationKey::parse("a_a").is_err());
        assert!(ConversationKey::parse("ab").is_err());
        assert!(ConversationKey::parse("_b").is_err());
        assert!(ConversationKey::parse("a_b_c").is_err());
    }

    #[test]
    fn user_id_deserializes_with_validation() {
        let ok: UserId = serde_json::from_str("\"u1\"").unwrap();
        assert_eq!(ok.as_str(), "u1");
        assert!(serde_json::from_str::<UserId>("\"u_1\"").is_err());
    }

    #[test]
    fn short_truncates_on_char_boundary() {
        assert_eq!(uid("0123456789abcdef").short(), "01234567");
        assert_eq!(uid("abc").short(), "abc");
    }
}
