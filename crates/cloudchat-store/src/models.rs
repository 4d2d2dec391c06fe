//! Rows persisted by the local backend that are not part of the JSON tree.

use chrono::{DateTime, Utc};

use cloudchat_shared::UserId;

/// A registered email/password account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub uid: UserId,
    /// Lower-cased email address.
    pub email: String,
    /// Argon2id hash in PHC string form (algorithm, params and salt inline).
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}
