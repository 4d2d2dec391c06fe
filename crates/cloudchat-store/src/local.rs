//! In-process implementation of the backend contract.
//!
//! [`LocalBackend`] keeps the JSON tree and the account table in SQLite and
//! pushes snapshots to subscribers synchronously after each committed write.
//! Clones share the same database and subscriber list. Each [`LocalAuth`]
//! is an independent sign-in session over the shared account table, so one
//! process can host several clients.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use cloudchat_shared::{MessageId, PushIdGenerator};

use crate::accounts::{check_password_strength, new_account, normalize_email, verify_password};
use crate::backend::{AuthProvider, AuthUser, RealtimeDb, Snapshot, Subscription};
use crate::database::Database;
use crate::error::{AuthError, Result, StoreError};
use crate::hub::SubscriberHub;
use crate::path::DbPath;

struct Inner {
    db: Database,
    hub: SubscriberHub,
}

/// Realtime database and account store backed by SQLite.
#[derive(Clone)]
pub struct LocalBackend {
    inner: Arc<Mutex<Inner>>,
    ids: Arc<PushIdGenerator>,
}

impl LocalBackend {
    pub fn new(db: Database) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                db,
                hub: SubscriberHub::default(),
            })),
            ids: Arc::new(PushIdGenerator::new()),
        }
    }

    /// Backend stored in the platform data directory.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(Database::new()?))
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        Ok(Self::new(Database::open_at(path)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    /// A new, signed-out authentication session.
    pub fn auth(&self) -> LocalAuth {
        let (current, _) = watch::channel(None);
        LocalAuth {
            backend: self.clone(),
            current,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("Lock poisoned: {e}")))
    }

    /// Apply writes atomically, then notify every affected subscriber.
    fn commit(&self, writes: Vec<(DbPath, Value)>) -> Result<()> {
        let mut guard = self.lock()?;
        let inner = &mut *guard;

        inner.db.write_nodes(&writes)?;

        let pruned = inner.hub.prune();
        if pruned > 0 {
            debug!(pruned, remaining = inner.hub.len(), "Dropped closed subscriptions");
        }

        let written: Vec<DbPath> = writes.into_iter().map(|(path, _)| path).collect();
        for path in inner.hub.affected_paths(&written) {
            let snapshot = Snapshot {
                value: inner.db.read_node(&path)?,
                path,
            };
            let delivered = inner.hub.deliver(&snapshot);
            debug!(path = %snapshot.path, delivered, "Snapshot pushed");
        }

        Ok(())
    }
}

impl RealtimeDb for LocalBackend {
    fn get(&self, path: &DbPath) -> Result<Snapshot> {
        let guard = self.lock()?;
        Ok(Snapshot {
            path: path.clone(),
            value: guard.db.read_node(path)?,
        })
    }

    fn set(&self, path: &DbPath, value: Value) -> Result<()> {
        self.commit(vec![(path.clone(), value)])
    }

    fn push(&self, path: &DbPath, value: Value) -> Result<MessageId> {
        let id = self.ids.next_id();
        self.commit(vec![(path.child(id.as_str())?, value)])?;
        Ok(id)
    }

    fn update(&self, patches: Vec<(DbPath, Value)>) -> Result<()> {
        if patches.is_empty() {
            return Ok(());
        }
        self.commit(patches)
    }

    fn subscribe(&self, path: &DbPath) -> Result<Subscription> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut guard = self.lock()?;

        let initial = Snapshot {
            path: path.clone(),
            value: guard.db.read_node(path)?,
        };
        // The receiver is alive in this scope, so the send cannot fail.
        let _ = tx.send(initial);
        guard.hub.register(path.clone(), tx);

        debug!(path = %path, "Subscribed");
        Ok(Subscription::new(path.clone(), rx))
    }
}

// ---------------------------------------------------------------------------
// Authentication session
// ---------------------------------------------------------------------------

/// One client's sign-in state over the shared account table.
pub struct LocalAuth {
    backend: LocalBackend,
    current: watch::Sender<Option<AuthUser>>,
}

impl LocalAuth {
    fn set_current(&self, user: Option<AuthUser>) {
        self.current.send_replace(user);
    }
}

impl AuthProvider for LocalAuth {
    fn create_user(&self, email: &str, password: &str) -> Result<AuthUser> {
        let email = normalize_email(email)?;
        check_password_strength(password)?;

        let account = new_account(email, password)?;
        self.backend.lock()?.db.insert_account(&account)?;

        info!(uid = %account.uid.short(), email = %account.email, "Account created");

        let user = AuthUser {
            uid: account.uid,
            email: account.email,
        };
        self.set_current(Some(user.clone()));
        Ok(user)
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        let email = normalize_email(email)?;

        let lookup = self.backend.lock()?.db.get_account_by_email(&email);
        let account = match lookup {
            Ok(account) => account,
            Err(StoreError::NotFound) => {
                warn!(email = %email, "Sign-in for unknown email");
                return Err(AuthError::InvalidCredential.into());
            }
            Err(e) => return Err(e),
        };

        if !verify_password(&account, password) {
            warn!(email = %email, "Sign-in with wrong password");
            return Err(AuthError::InvalidCredential.into());
        }

        info!(uid = %account.uid.short(), "Signed in");
        let user = AuthUser {
            uid: account.uid,
            email: account.email,
        };
        self.set_current(Some(user.clone()));
        Ok(user)
    }

    fn sign_out(&self) {
        if let Some(user) = self.current.send_replace(None) {
            info!(uid = %user.uid.short(), "Signed out");
        }
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.current.borrow().clone()
    }

    fn watch(&self) -> watch::Receiver<Option<AuthUser>> {
        self.current.subscribe()
    }
}
