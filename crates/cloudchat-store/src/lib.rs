//! # cloudchat-store
//!
//! The backend boundary of CloudChat and a local implementation of it.
//!
//! [`backend`] defines what the client needs from a hosted realtime database
//! and its authentication service: path-addressed JSON reads and writes,
//! generated child keys, multi-path patches, live snapshot subscriptions and
//! email/password sign-in. [`LocalBackend`] provides the same contract
//! in-process, persisting the JSON tree and the account table in SQLite, so
//! the client runs (and is tested) without a network service.

pub mod accounts;
pub mod backend;
pub mod database;
pub mod local;
pub mod migrations;
pub mod models;
pub mod nodes;
pub mod path;
pub mod tree;

mod error;
mod hub;

pub use backend::{AuthProvider, AuthUser, RealtimeDb, Snapshot, Subscription};
pub use database::Database;
pub use error::{AuthError, Result, StoreError};
pub use local::{LocalAuth, LocalBackend};
pub use models::*;
pub use path::DbPath;
