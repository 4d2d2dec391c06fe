//! Who is signed in and which conversation is open.
//!
//! ```text
//! Unauthenticated --sign in--> Authenticated { selected: None }
//! Authenticated   --select-->  Authenticated { selected: Some(counterpart) }
//! Authenticated   --sign out / auth lost--> Unauthenticated
//! ```

use cloudchat_shared::{ConversationKey, KeyError, UserId};
use cloudchat_store::AuthUser;

use crate::error::{ClientError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    #[default]
    Unauthenticated,
    Authenticated {
        user: AuthUser,
        selected: Option<UserId>,
    },
}

impl Session {
    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            Session::Authenticated { user, .. } => Some(user),
            Session::Unauthenticated => None,
        }
    }

    pub fn selected(&self) -> Option<&UserId> {
        match self {
            Session::Authenticated { selected, .. } => selected.as_ref(),
            Session::Unauthenticated => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated { .. })
    }

    /// Key of the open conversation, if any.
    pub fn active_key(&self) -> Option<ConversationKey> {
        let user = self.user()?;
        let selected = self.selected()?;
        ConversationKey::new(&user.uid, selected).ok()
    }

    pub(crate) fn sign_in(&mut self, user: AuthUser) {
        *self = Session::Authenticated {
            user,
            selected: None,
        };
    }

    pub(crate) fn select(&mut self, counterpart: UserId) -> Result<()> {
        match self {
            Session::Unauthenticated => Err(ClientError::NotSignedIn),
            Session::Authenticated { user, .. } if user.uid == counterpart => {
                Err(KeyError::SelfConversation(counterpart).into())
            }
            Session::Authenticated { selected, .. } => {
                *selected = Some(counterpart);
                Ok(())
            }
        }
    }

    pub(crate) fn sign_out(&mut self) {
        *self = Session::Unauthenticated;
    }
}
