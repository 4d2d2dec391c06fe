use thiserror::Error;

use cloudchat_shared::KeyError;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A query expected exactly one row but found none.
    #[error("Record not found")]
    NotFound,

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// A stored or supplied JSON value could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A database path was empty, malformed or used a forbidden character.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// An identifier failed validation.
    #[error("Key error: {0}")]
    Key(#[from] KeyError),

    /// Password hashing or hash parsing failed.
    #[error("Password hash error: {0}")]
    PasswordHash(String),

    /// Chrono parsing error.
    #[error("Timestamp parse error: {0}")]
    ChronoParse(#[from] chrono::ParseError),

    /// Sign-up or sign-in was refused.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The backend cannot serve requests (poisoned lock, closed connection).
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Refusals from the authentication service, worded for end users.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("The email address is badly formatted.")]
    InvalidEmail,

    #[error("Password should be at least {0} characters.")]
    WeakPassword(usize),

    #[error("The email address is already in use by another account.")]
    EmailAlreadyInUse,

    #[error("Invalid email or password.")]
    InvalidCredential,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
