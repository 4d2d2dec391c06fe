// Types shared by every CloudChat crate: identifiers, records, push ids.

pub mod constants;
pub mod error;
pub mod push_id;
pub mod records;
pub mod types;

pub use error::KeyError;
pub use push_id::PushIdGenerator;
pub use records::{ChatMessage, LobbyMessage, Profile, ReceiptStatus};
pub use types::{ConversationKey, MessageId, UserId};
