//! Command-line parsing and dispatch.

use thiserror::Error;
use tracing::debug;

use cloudchat_client::{ClientConfig, ClientError, SignUpForm};
use cloudchat_shared::UserId;

use crate::render;
use crate::Client;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SignUp(SignUpArgs),
    Login { email: String, password: String },
    Logout,
    Users,
    Chats,
    Open(String),
    Lobby,
    Post(String),
    Send(String),
    Help,
    Quit,
    Nothing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpArgs {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("Usage: {0}")]
    Usage(&'static str),
}

const SIGNUP_USAGE: &str = "signup <email> <password> <name> [phone]";
const LOGIN_USAGE: &str = "login <email> <password>";
const OPEN_USAGE: &str = "open <email|uid>";
const POST_USAGE: &str = "post <text>";

impl Command {
    /// Parse one input line. Anything that is not a command is a message.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Command::Nothing);
        }

        let (word, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (trimmed, ""),
        };
        let args: Vec<&str> = rest.split_whitespace().collect();

        let command = match word {
            "signup" => match args.as_slice() {
                [email, password, name] | [email, password, name, _] => {
                    Command::SignUp(SignUpArgs {
                        email: email.to_string(),
                        password: password.to_string(),
                        name: name.to_string(),
                        phone: args.get(3).map(|p| p.to_string()),
                    })
                }
                _ => return Err(CommandError::Usage(SIGNUP_USAGE)),
            },
            "login" => match args.as_slice() {
                [email, password] => Command::Login {
                    email: email.to_string(),
                    password: password.to_string(),
                },
                _ => return Err(CommandError::Usage(LOGIN_USAGE)),
            },
            "logout" => Command::Logout,
            "users" => Command::Users,
            "chats" => Command::Chats,
            "open" => match args.as_slice() {
                [who] => Command::Open(who.to_string()),
                _ => return Err(CommandError::Usage(OPEN_USAGE)),
            },
            "lobby" => Command::Lobby,
            "post" if rest.is_empty() => return Err(CommandError::Usage(POST_USAGE)),
            "post" => Command::Post(rest.to_string()),
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ => Command::Send(line.to_string()),
        };
        Ok(command)
    }
}

/// Run one command against the client. Quit is handled by the caller.
pub fn execute(client: &mut Client, command: Command, config: &ClientConfig) -> Result<(), ClientError> {
    debug!(?command, "Executing command");

    match command {
        Command::SignUp(args) => {
            let form = SignUpForm {
                name: args.name,
                phone: args.phone,
                email: args.email,
                password: args.password,
            };
            client.sign_up(&form)?;
            println!("Account created successfully! Please login.");
        }
        Command::Login { email, password } => {
            client.sign_in(&email, &password)?;
            if config.auto_lobby {
                client.join_lobby()?;
            }
        }
        Command::Logout => {
            client.sign_out();
            println!("Logged out.");
        }
        Command::Users => render::directory(client),
        Command::Chats => render::conversations(client),
        Command::Open(needle) => {
            let counterpart = resolve(client, &needle)?;
            client.select(counterpart)?;
        }
        Command::Lobby => {
            client.join_lobby()?;
            render::lobby(client);
        }
        Command::Post(text) => {
            if !client.session().is_authenticated() {
                return Err(ClientError::NotSignedIn);
            }
            client.post_lobby(&text)?;
        }
        Command::Send(text) => {
            if client.send(&text)?.is_none() {
                println!("Select a user first with `open <email>`.");
            }
        }
        Command::Help => render::help(),
        Command::Quit | Command::Nothing => {}
    }
    Ok(())
}

/// A directory entry by email or uid. An unknown uid is accepted as is, since
/// the directory may not have caught up yet.
fn resolve(client: &Client, needle: &str) -> Result<UserId, ClientError> {
    if let Some(profile) = client.views().find(needle) {
        return Ok(profile.uid.clone());
    }
    if needle.contains('@') {
        return Err(ClientError::InvalidInput(format!("No user with email {needle}")));
    }
    Ok(UserId::new(needle)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("  ").unwrap(), Command::Nothing);
        assert_eq!(Command::parse("logout").unwrap(), Command::Logout);
        assert_eq!(Command::parse("quit").unwrap(), Command::Quit);
        assert_eq!(
            Command::parse("login a@example.com secret1").unwrap(),
            Command::Login {
                email: "a@example.com".into(),
                password: "secret1".into(),
            }
        );
        assert_eq!(
            Command::parse("open b@example.com").unwrap(),
            Command::Open("b@example.com".into())
        );
    }

    #[test]
    fn test_parse_signup_with_optional_phone() {
        let Command::SignUp(args) = Command::parse("signup a@example.com secret1 Ann").unwrap() else {
            panic!("expected signup");
        };
        assert_eq!(args.name, "Ann");
        assert_eq!(args.phone, None);

        let Command::SignUp(args) =
            Command::parse("signup a@example.com secret1 Ann 555-0100").unwrap()
        else {
            panic!("expected signup");
        };
        assert_eq!(args.phone.as_deref(), Some("555-0100"));
    }

    #[test]
    fn test_parse_usage_errors() {
        assert_eq!(
            Command::parse("signup a@example.com"),
            Err(CommandError::Usage(SIGNUP_USAGE))
        );
        assert_eq!(Command::parse("login a@example.com"), Err(CommandError::Usage(LOGIN_USAGE)));
        assert_eq!(Command::parse("open"), Err(CommandError::Usage(OPEN_USAGE)));
        assert_eq!(Command::parse("post   "), Err(CommandError::Usage(POST_USAGE)));
    }

    #[test]
    fn test_other_text_is_a_message() {
        assert_eq!(
            Command::parse("hello there").unwrap(),
            Command::Send("hello there".into())
        );
        assert_eq!(
            Command::parse("post hello  all").unwrap(),
            Command::Post("hello  all".into())
        );
    }

    #[test]
    fn test_resolve_accepts_unknown_uid_but_not_unknown_email() {
        let backend = cloudchat_store::LocalBackend::open_in_memory().unwrap();
        let client = Client::new(backend.auth(), backend.clone());
        assert_eq!(resolve(&client, "someone").unwrap().as_str(), "someone");
        assert!(matches!(
            resolve(&client, "b@example.com"),
            Err(ClientError::InvalidInput(_))
        ));
    }
}
