//! The chat client: session, live subscriptions and the views built on them.
//!
//! [`ChatClient`] owns one authentication session and a handle to the
//! realtime database. Signing in subscribes to the `users` and `chats`
//! nodes; selecting a counterpart subscribes to that conversation; joining
//! the lobby subscribes to `messages`. Snapshots queue up on those
//! subscriptions until [`ChatClient::pump`] (or [`ChatClient::next_events`])
//! drains them, recomputes every affected view from scratch and reports
//! which views changed.
//!
//! Opening a conversation marks the counterpart's messages as seen and being
//! in the lobby marks its messages as read. Those writes happen while
//! pumping; a failure is logged and dropped, and the next snapshot retries.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use cloudchat_shared::{
    ChatMessage, ConversationKey, LobbyMessage, MessageId, Profile, UserId,
};
use cloudchat_store::{AuthProvider, AuthUser, RealtimeDb, Snapshot, Subscription};

use crate::derive;
use crate::error::{ClientError, Result};
use crate::events::ClientEvent;
use crate::paths;
use crate::session::Session;

/// Everything the user fills in on the sign-up form.
#[derive(Debug, Clone, Default)]
pub struct SignUpForm {
    pub name: String,
    pub phone: Option<String>,
    pub email: String,
    pub password: String,
}

/// Derived state, rebuilt from the latest snapshots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Views {
    /// Every other user, in id order.
    pub directory: Vec<Profile>,
    /// Counterparts the signed-in user has a conversation with.
    pub conversations: BTreeSet<UserId>,
    /// Unseen message count per counterpart; zero counts are absent.
    pub unseen: BTreeMap<UserId, usize>,
    /// Messages of the selected conversation, oldest first.
    pub active: Vec<(MessageId, ChatMessage)>,
    /// Lobby messages in creation order. Empty unless the lobby is joined.
    pub lobby: Vec<(MessageId, LobbyMessage)>,
}

impl Views {
    /// Look a user up by uid or by email (case-insensitive).
    pub fn find(&self, needle: &str) -> Option<&Profile> {
        self.directory
            .iter()
            .find(|p| p.uid.as_str() == needle || p.email.eq_ignore_ascii_case(needle))
    }

    pub fn unseen_from(&self, counterpart: &UserId) -> usize {
        self.unseen.get(counterpart).copied().unwrap_or(0)
    }
}

#[derive(Default)]
struct Subscriptions {
    users: Option<Subscription>,
    chats: Option<Subscription>,
    active: Option<Subscription>,
    lobby: Option<Subscription>,
}

/// Which feed woke [`ChatClient::next_events`].
enum Wake {
    Auth,
    Users(Snapshot),
    Chats(Snapshot),
    Active(Snapshot),
    Lobby(Snapshot),
}

pub struct ChatClient<A, R> {
    auth: A,
    db: R,
    auth_rx: watch::Receiver<Option<AuthUser>>,
    session: Session,
    views: Views,
    subs: Subscriptions,
    pending: Vec<ClientEvent>,
}

impl<A: AuthProvider, R: RealtimeDb> ChatClient<A, R> {
    /// Build a client over injected backend handles. If the auth session is
    /// already signed in, the client starts signed in too.
    pub fn new(auth: A, db: R) -> Self {
        let auth_rx = auth.watch();
        let current = auth.current_user();
        let mut client = Self {
            auth,
            db,
            auth_rx,
            session: Session::default(),
            views: Views::default(),
            subs: Subscriptions::default(),
            pending: Vec::new(),
        };
        client.sync_auth(current);
        client
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn views(&self) -> &Views {
        &self.views
    }

    pub fn auth(&self) -> &A {
        &self.auth
    }

    pub fn db(&self) -> &R {
        &self.db
    }

    pub fn in_lobby(&self) -> bool {
        self.subs.lobby.is_some()
    }

    fn me(&self) -> Result<&AuthUser> {
        self.session.user().ok_or(ClientError::NotSignedIn)
    }

    // -----------------------------------------------------------------------
    // Authentication
    // -----------------------------------------------------------------------

    /// Create an account and its directory profile, then sign out again so
    /// the user logs in explicitly.
    pub fn sign_up(&mut self, form: &SignUpForm) -> Result<AuthUser> {
        let name = form.name.trim();
        if name.is_empty() {
            return Err(ClientError::InvalidInput("Name is required".into()));
        }

        if self.session.is_authenticated() {
            self.sign_out();
        }

        let user = self.auth.create_user(&form.email, &form.password)?;
        let profile = Profile {
            uid: user.uid.clone(),
            name: name.to_string(),
            phone: form.phone.as_deref().unwrap_or("").trim().to_string(),
            email: user.email.clone(),
        };
        let written = self.write_profile(&profile);

        self.auth.sign_out();
        self.ack_auth();

        written?;
        info!(uid = %user.uid.short(), "Account registered");
        Ok(user)
    }

    fn write_profile(&self, profile: &Profile) -> Result<()> {
        let value = serde_json::to_value(profile)?;
        self.db.set(&paths::profile(&profile.uid)?, value)?;
        Ok(())
    }

    pub fn sign_in(&mut self, email: &str, password: &str) -> Result<AuthUser> {
        let user = self.auth.sign_in(email, password)?;
        self.ack_auth();

        if let Err(e) = self.enter(user.clone()) {
            self.auth.sign_out();
            self.ack_auth();
            return Err(e);
        }
        Ok(user)
    }

    /// Sign out and drop every subscription and view.
    pub fn sign_out(&mut self) {
        self.auth.sign_out();
        self.ack_auth();
        self.leave();
    }

    /// Mark the current auth value as handled.
    fn ack_auth(&mut self) {
        let _ = self.auth_rx.borrow_and_update();
    }

    fn enter(&mut self, user: AuthUser) -> Result<()> {
        let users = self.db.subscribe(&paths::users()?)?;
        let chats = self.db.subscribe(&paths::chats()?)?;

        self.subs = Subscriptions {
            users: Some(users),
            chats: Some(chats),
            ..Subscriptions::default()
        };
        self.views = Views::default();
        self.session.sign_in(user.clone());

        info!(uid = %user.uid.short(), "Session started");
        self.pending.push(ClientEvent::SignedIn(user));
        Ok(())
    }

    fn leave(&mut self) {
        self.subs = Subscriptions::default();
        self.views = Views::default();
        if self.session.is_authenticated() {
            self.session.sign_out();
            info!("Session ended");
            self.pending.push(ClientEvent::SignedOut);
        }
    }

    /// Follow an auth change the client did not make itself.
    fn sync_auth(&mut self, current: Option<AuthUser>) {
        let signed_in_as = self.session.user().map(|u| u.uid.clone());
        match current {
            None if signed_in_as.is_some() => self.leave(),
            None => {}
            Some(user) if signed_in_as.as_ref() == Some(&user.uid) => {}
            Some(user) => {
                if let Err(e) = self.enter(user) {
                    warn!(error = %e, "Failed to start session after auth change");
                }
            }
        }
    }

    fn poll_auth(&mut self) {
        if self.auth_rx.has_changed().unwrap_or(false) {
            let current = self.auth_rx.borrow_and_update().clone();
            self.sync_auth(current);
        }
    }

    // -----------------------------------------------------------------------
    // Direct conversations
    // -----------------------------------------------------------------------

    /// Open the conversation with `counterpart`. The counterpart does not
    /// have to be in the directory yet.
    pub fn select(&mut self, counterpart: UserId) -> Result<()> {
        let me = self.me()?.uid.clone();
        let key = ConversationKey::new(&me, &counterpart)?;
        let sub = self.db.subscribe(&paths::conversation(&key)?)?;

        self.session.select(counterpart.clone())?;
        self.subs.active = Some(sub);
        self.views.active.clear();

        debug!(key = %key, "Conversation selected");
        self.pending
            .push(ClientEvent::MessagesChanged { counterpart });
        Ok(())
    }

    /// Send `text` to the selected counterpart. Blank text, or no open
    /// conversation, sends nothing.
    pub fn send(&mut self, text: &str) -> Result<Option<MessageId>> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        let me = self.me()?;
        let (Some(counterpart), Some(key)) = (self.session.selected(), self.session.active_key())
        else {
            return Ok(None);
        };

        let message = ChatMessage {
            text: text.to_string(),
            sender: me.uid.clone(),
            sender_email: me.email.clone(),
            receiver: counterpart.clone(),
            timestamp: Utc::now(),
            seen: false,
        };

        let id = self
            .db
            .push(&paths::conversation(&key)?, serde_json::to_value(&message)?)?;
        debug!(key = %key, id = %id, "Message sent");
        Ok(Some(id))
    }

    /// Mark every unseen message from the selected counterpart as seen.
    /// Returns how many were marked.
    pub fn mark_active_seen(&self) -> Result<usize> {
        let me = self.me()?;
        let (Some(counterpart), Some(key)) = (self.session.selected(), self.session.active_key())
        else {
            return Ok(0);
        };

        let patches = derive::seen_patches(
            &self.views.active,
            &paths::conversation(&key)?,
            &me.uid,
            counterpart,
        )?;
        let marked = patches.len();
        if marked > 0 {
            self.db.update(patches)?;
            debug!(key = %key, marked, "Marked messages seen");
        }
        Ok(marked)
    }

    // -----------------------------------------------------------------------
    // Lobby
    // -----------------------------------------------------------------------

    pub fn join_lobby(&mut self) -> Result<()> {
        self.me()?;
        if self.subs.lobby.is_none() {
            self.subs.lobby = Some(self.db.subscribe(&paths::lobby()?)?);
            debug!("Joined lobby");
        }
        Ok(())
    }

    pub fn leave_lobby(&mut self) {
        if self.subs.lobby.take().is_some() {
            debug!("Left lobby");
        }
        if !self.views.lobby.is_empty() {
            self.views.lobby.clear();
            self.pending.push(ClientEvent::LobbyChanged);
        }
    }

    /// Post to the lobby. Blank text, or no session, posts nothing.
    pub fn post_lobby(&mut self, text: &str) -> Result<Option<MessageId>> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        let Some(me) = self.session.user() else {
            return Ok(None);
        };

        let message = LobbyMessage {
            text: text.to_string(),
            sender: me.email.clone(),
            timestamp: Utc::now().timestamp_millis(),
            read_by: BTreeMap::from([(me.uid.clone(), true)]),
        };

        let id = self
            .db
            .push(&paths::lobby()?, serde_json::to_value(&message)?)?;
        debug!(id = %id, "Lobby message posted");
        Ok(Some(id))
    }

    /// Add the signed-in user to `readBy` of every lobby message.
    pub fn mark_lobby_read(&self) -> Result<usize> {
        let me = self.me()?;
        let patches = derive::read_receipt_patches(&self.views.lobby, &paths::lobby()?, &me.uid)?;
        let marked = patches.len();
        if marked > 0 {
            self.db.update(patches)?;
            debug!(marked, "Marked lobby messages read");
        }
        Ok(marked)
    }

    // -----------------------------------------------------------------------
    // Snapshot processing
    // -----------------------------------------------------------------------

    /// Apply everything queued without waiting and return what changed.
    ///
    /// Writes made while applying (seen flags, read receipts) produce new
    /// snapshots, so this keeps draining until every feed is quiet.
    pub fn pump(&mut self) -> Vec<ClientEvent> {
        self.poll_auth();

        loop {
            let mut progressed = false;

            if let Some(snapshot) = self.subs.users.as_mut().and_then(Subscription::latest) {
                self.apply_users(snapshot);
                progressed = true;
            }
            if let Some(snapshot) = self.subs.chats.as_mut().and_then(Subscription::latest) {
                self.apply_chats(snapshot);
                progressed = true;
            }
            if let Some(snapshot) = self.subs.active.as_mut().and_then(Subscription::latest) {
                self.apply_active(snapshot);
                progressed = true;
            }
            if let Some(snapshot) = self.subs.lobby.as_mut().and_then(Subscription::latest) {
                self.apply_lobby(snapshot);
                progressed = true;
            }

            if !progressed {
                break;
            }
        }

        std::mem::take(&mut self.pending)
    }

    /// Wait until some view changes and return the changes.
    ///
    /// Cancel-safe: dropping the future loses no snapshot.
    pub async fn next_events(&mut self) -> Vec<ClientEvent> {
        loop {
            let events = self.pump();
            if !events.is_empty() {
                return events;
            }

            let wake = tokio::select! {
                Ok(()) = self.auth_rx.changed() => Wake::Auth,
                Some(s) = recv_opt(&mut self.subs.users) => Wake::Users(s),
                Some(s) = recv_opt(&mut self.subs.chats) => Wake::Chats(s),
                Some(s) = recv_opt(&mut self.subs.active) => Wake::Active(s),
                Some(s) = recv_opt(&mut self.subs.lobby) => Wake::Lobby(s),
                else => {
                    warn!("All feeds closed");
                    return Vec::new();
                }
            };

            match wake {
                Wake::Auth => {
                    let current = self.auth_rx.borrow_and_update().clone();
                    self.sync_auth(current);
                }
                Wake::Users(s) => self.apply_users(s),
                Wake::Chats(s) => self.apply_chats(s),
                Wake::Active(s) => self.apply_active(s),
                Wake::Lobby(s) => self.apply_lobby(s),
            }
        }
    }

    fn my_uid(&self) -> Option<UserId> {
        self.session.user().map(|u| u.uid.clone())
    }

    fn apply_users(&mut self, snapshot: Snapshot) {
        let Some(me) = self.my_uid() else { return };

        let directory = derive::directory(snapshot.value.as_ref(), &me);
        if directory != self.views.directory {
            debug!(users = directory.len(), "Directory updated");
            self.views.directory = directory;
            self.pending.push(ClientEvent::DirectoryChanged);
        }
    }

    fn apply_chats(&mut self, snapshot: Snapshot) {
        let Some(me) = self.my_uid() else { return };

        let conversations =
            derive::conversation_members(snapshot.children().map(|(key, _)| key), &me);
        if conversations != self.views.conversations {
            self.views.conversations = conversations;
            self.pending.push(ClientEvent::ConversationsChanged);
        }

        let unseen = derive::unseen_counts(snapshot.value.as_ref(), &me);
        if unseen != self.views.unseen {
            self.views.unseen = unseen;
            self.pending.push(ClientEvent::UnseenChanged);
        }
    }

    fn apply_active(&mut self, snapshot: Snapshot) {
        let Some(counterpart) = self.session.selected().cloned() else {
            return;
        };

        let messages = derive::conversation_messages(snapshot.value.as_ref());
        if messages != self.views.active {
            self.views.active = messages;
            self.pending
                .push(ClientEvent::MessagesChanged { counterpart });
        }

        if let Err(e) = self.mark_active_seen() {
            warn!(error = %e, "Failed to mark messages seen");
        }
    }

    fn apply_lobby(&mut self, snapshot: Snapshot) {
        let messages = derive::lobby_messages(snapshot.value.as_ref());
        if messages != self.views.lobby {
            self.views.lobby = messages;
            self.pending.push(ClientEvent::LobbyChanged);
        }

        if let Err(e) = self.mark_lobby_read() {
            warn!(error = %e, "Failed to mark lobby messages read");
        }
    }
}

async fn recv_opt(sub: &mut Option<Subscription>) -> Option<Snapshot> {
    match sub {
        Some(sub) => sub.recv().await,
        None => std::future::pending().await,
    }
}
