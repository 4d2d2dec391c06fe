use thiserror::Error;

use crate::types::UserId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("Identifier is empty")]
    Empty,

    #[error("Identifier {0:?} contains the conversation separator")]
    ContainsSeparator(String),

    #[error("Identifier {id:?} contains forbidden character {ch:?}")]
    ForbiddenChar { id: String, ch: char },

    #[error("A conversation needs two distinct participants, got {0} twice")]
    SelfConversation(UserId),

    #[error("Malformed conversation key: {0:?}")]
    MalformedKey(String),
}
