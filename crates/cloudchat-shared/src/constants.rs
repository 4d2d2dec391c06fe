/// Application name
pub const APP_NAME: &str = "CloudChat";

/// One-line pitch shown on the landing screen
pub const TAGLINE: &str =
    "The simplest, fastest way to stay connected with your friends and teams in real-time.";

/// Joins the two participant ids of a conversation key
pub const CONVERSATION_SEPARATOR: char = '_';

/// Separates segments of a database path
pub const PATH_SEPARATOR: char = '/';

/// Characters the realtime database refuses inside a key
pub const FORBIDDEN_KEY_CHARS: &[char] = &['.', '#', '$', '[', ']'];

/// Database node holding one profile per identity
pub const USERS_PATH: &str = "users";

/// Database node holding one child per conversation key
pub const CHATS_PATH: &str = "chats";

/// Database node holding the global lobby room
pub const LOBBY_PATH: &str = "messages";

/// Minimum password length accepted at sign-up
pub const MIN_PASSWORD_LEN: usize = 6;

/// Alphabet for push ids, in ASCII order so ids sort chronologically
pub const PUSH_CHARS: &[u8; 64] =
    b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

/// Length of a push id: 8 timestamp chars followed by 12 random chars
pub const PUSH_ID_LEN: usize = 20;
