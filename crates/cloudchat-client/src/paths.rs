//! Where each record lives in the database tree.

use cloudchat_shared::constants::{CHATS_PATH, LOBBY_PATH, USERS_PATH};
use cloudchat_shared::{ConversationKey, UserId};
use cloudchat_store::{DbPath, Result};

pub fn users() -> Result<DbPath> {
    DbPath::parse(USERS_PATH)
}

pub fn profile(uid: &UserId) -> Result<DbPath> {
    users()?.child(uid.as_str())
}

pub fn chats() -> Result<DbPath> {
    DbPath::parse(CHATS_PATH)
}

pub fn conversation(key: &ConversationKey) -> Result<DbPath> {
    chats()?.child(key.to_string())
}

pub fn lobby() -> Result<DbPath> {
    DbPath::parse(LOBBY_PATH)
}
