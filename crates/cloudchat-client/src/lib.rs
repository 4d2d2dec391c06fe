//! # cloudchat-client
//!
//! Client-side logic of CloudChat: the session state machine, the views
//! derived from live database snapshots (directory, conversations, unseen
//! counts, the open conversation, the lobby) and the writes a user triggers.
//! The backend is injected as an [`AuthProvider`] and a [`RealtimeDb`].
//!
//! [`AuthProvider`]: cloudchat_store::AuthProvider
//! [`RealtimeDb`]: cloudchat_store::RealtimeDb

pub mod client;
pub mod config;
pub mod derive;
pub mod error;
pub mod events;
pub mod paths;
pub mod present;
pub mod session;

pub use client::{ChatClient, SignUpForm, Views};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use events::ClientEvent;
pub use session::Session;
