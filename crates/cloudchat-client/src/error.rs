use thiserror::Error;

use cloudchat_shared::KeyError;
use cloudchat_store::StoreError;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Not signed in")]
    NotSignedIn,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Key error: {0}")]
    Key(#[from] KeyError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// Whether the backend refused the credentials or the sign-up data.
    pub fn is_auth(&self) -> bool {
        matches!(self, ClientError::Store(StoreError::Auth(_)))
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
