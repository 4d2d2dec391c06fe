use cloudchat_shared::UserId;
use cloudchat_store::AuthUser;

/// A change a front end should react to. Emitted only when the underlying
/// view actually changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    SignedIn(AuthUser),
    SignedOut,
    DirectoryChanged,
    ConversationsChanged,
    UnseenChanged,
    MessagesChanged { counterpart: UserId },
    LobbyChanged,
}
