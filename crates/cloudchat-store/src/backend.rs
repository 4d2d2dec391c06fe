//! The contract CloudChat needs from its hosted backend.
//!
//! Two services sit behind it: an authentication service
//! ([`AuthProvider`]) and a realtime JSON-tree database ([`RealtimeDb`]).
//! The client takes both by injection; [`crate::LocalBackend`] implements
//! them in-process and any hosted service adapter can implement them too.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, watch};

use cloudchat_shared::{MessageId, UserId};

use crate::error::Result;
use crate::path::DbPath;

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

/// The signed-in identity as the auth service reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub uid: UserId,
    pub email: String,
}

/// Email/password authentication with change notifications.
pub trait AuthProvider: Send + Sync {
    /// Register a new identity. On success the new identity is signed in.
    fn create_user(&self, email: &str, password: &str) -> Result<AuthUser>;

    fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser>;

    fn sign_out(&self);

    fn current_user(&self) -> Option<AuthUser>;

    /// Observe the current identity; the receiver sees every change.
    fn watch(&self) -> watch::Receiver<Option<AuthUser>>;
}

// ---------------------------------------------------------------------------
// Realtime database
// ---------------------------------------------------------------------------

/// Full value of a path at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub path: DbPath,
    /// `None` when nothing is stored at the path.
    pub value: Option<Value>,
}

impl Snapshot {
    /// Child entries when the value is an object, in key order. A missing or
    /// scalar value has no children.
    pub fn children(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.value
            .as_ref()
            .and_then(Value::as_object)
            .into_iter()
            .flat_map(|map| map.iter().map(|(k, v)| (k.as_str(), v)))
    }
}

/// Live feed of snapshots for one path.
///
/// The current value arrives first, then a fresh snapshot after every write
/// that can change it. Dropping the subscription unregisters it and discards
/// anything still queued.
#[derive(Debug)]
pub struct Subscription {
    path: DbPath,
    rx: mpsc::UnboundedReceiver<Snapshot>,
}

impl Subscription {
    pub fn new(path: DbPath, rx: mpsc::UnboundedReceiver<Snapshot>) -> Self {
        Self { path, rx }
    }

    pub fn path(&self) -> &DbPath {
        &self.path
    }

    /// Wait for the next snapshot. `None` once the backend has gone away.
    pub async fn recv(&mut self) -> Option<Snapshot> {
        self.rx.recv().await
    }

    /// The next queued snapshot, if one is ready.
    pub fn try_recv(&mut self) -> Option<Snapshot> {
        self.rx.try_recv().ok()
    }

    /// Drain everything queued and keep only the newest snapshot. Snapshots
    /// are full values, so older ones carry nothing the newest lacks.
    pub fn latest(&mut self) -> Option<Snapshot> {
        let mut newest = None;
        while let Some(snapshot) = self.try_recv() {
            newest = Some(snapshot);
        }
        newest
    }
}

/// Path-addressed JSON storage with push subscriptions.
pub trait RealtimeDb: Send + Sync {
    fn get(&self, path: &DbPath) -> Result<Snapshot>;

    /// Replace the value at `path`. `Value::Null` deletes.
    fn set(&self, path: &DbPath, value: Value) -> Result<()>;

    /// Store `value` under a new, chronologically ordered child key of `path`.
    fn push(&self, path: &DbPath, value: Value) -> Result<MessageId>;

    /// Apply several writes atomically: all land or none do.
    fn update(&self, patches: Vec<(DbPath, Value)>) -> Result<()>;

    fn subscribe(&self, path: &DbPath) -> Result<Subscription>;
}
