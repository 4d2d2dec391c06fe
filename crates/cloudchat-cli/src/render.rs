//! Terminal output.

use std::io::Write;

use cloudchat_client::present::{avatar_initial, format_clock, format_clock_millis, unseen_badge};
use cloudchat_client::{ClientError, ClientEvent};
use cloudchat_shared::constants::{APP_NAME, TAGLINE};
use cloudchat_shared::UserId;

use crate::Client;

pub fn banner() {
    println!("=== {APP_NAME} ===");
    println!("{TAGLINE}");
    println!("Type `help` for commands.");
}

pub fn help() {
    println!("Commands:");
    println!("  signup <email> <password> <name> [phone]");
    println!("  login <email> <password>");
    println!("  logout");
    println!("  users                 everyone you can message");
    println!("  chats                 people you have talked to");
    println!("  open <email|uid>      open a conversation");
    println!("  <text>                send to the open conversation");
    println!("  lobby                 join the lobby and show it");
    println!("  post <text>           post to the lobby");
    println!("  help | quit");
}

pub fn prompt(client: &Client) {
    let label = match (client.session().user(), client.session().selected()) {
        (None, _) => "guest".to_string(),
        (Some(me), None) => me.email.clone(),
        (Some(me), Some(other)) => format!("{} -> {}", me.email, display_name(client, other)),
    };
    print!("[{label}]> ");
    let _ = std::io::stdout().flush();
}

pub fn error(err: &ClientError) {
    if err.is_auth() {
        println!("Authentication failed: {err}");
    } else {
        println!("Error: {err}");
    }
}

/// Print whatever the events say changed.
pub fn events(client: &Client, events: &[ClientEvent]) {
    if events.is_empty() {
        return;
    }
    println!();

    for event in events {
        match event {
            ClientEvent::SignedIn(user) => println!("Logged in as {}.", user.email),
            ClientEvent::SignedOut => println!("Session ended."),
            ClientEvent::DirectoryChanged => directory(client),
            ClientEvent::ConversationsChanged => {}
            ClientEvent::UnseenChanged => unseen(client),
            ClientEvent::MessagesChanged { counterpart } => {
                if client.session().selected() == Some(counterpart) {
                    conversation(client, counterpart);
                }
            }
            ClientEvent::LobbyChanged => {
                if client.in_lobby() {
                    lobby(client);
                }
            }
        }
    }
}

fn display_name(client: &Client, uid: &UserId) -> String {
    client
        .views()
        .directory
        .iter()
        .find(|p| p.uid == *uid)
        .map(|p| p.email.clone())
        .unwrap_or_else(|| uid.to_string())
}

pub fn directory(client: &Client) {
    let views = client.views();
    if views.directory.is_empty() {
        println!("No other users yet.");
        return;
    }
    println!("Users:");
    for profile in &views.directory {
        let badge = unseen_badge(views.unseen_from(&profile.uid))
            .map(|b| format!(" ({b})"))
            .unwrap_or_default();
        println!(
            "  [{}] {} <{}>{badge}",
            avatar_initial(&profile.email),
            profile.name,
            profile.email
        );
    }
}

pub fn conversations(client: &Client) {
    let views = client.views();
    if views.conversations.is_empty() {
        println!("No conversations yet.");
        return;
    }
    println!("Chats:");
    for uid in &views.conversations {
        let badge = unseen_badge(views.unseen_from(uid))
            .map(|b| format!(" ({b})"))
            .unwrap_or_default();
        println!("  {}{badge}", display_name(client, uid));
    }
}

fn unseen(client: &Client) {
    let views = client.views();
    for (uid, count) in &views.unseen {
        if client.session().selected() != Some(uid) {
            println!("{count} new from {}", display_name(client, uid));
        }
    }
}

fn conversation(client: &Client, counterpart: &UserId) {
    let Some(me) = client.session().user() else {
        return;
    };
    println!("--- {} ---", display_name(client, counterpart));
    for (_, msg) in &client.views().active {
        let who = if msg.sender == me.uid { "you" } else { msg.sender_email.as_str() };
        let seen = if msg.sender == me.uid && msg.seen { " ✓✓" } else { "" };
        println!("[{}] {who}: {}{seen}", format_clock(msg.timestamp), msg.text);
    }
}

pub fn lobby(client: &Client) {
    let Some(me) = client.session().user() else {
        return;
    };
    println!("--- Lobby ---");
    for (_, msg) in &client.views().lobby {
        let time = format_clock_millis(msg.timestamp);
        if msg.sender == me.email {
            println!("[{time}] you: {}  {}", msg.text, msg.receipt());
        } else {
            println!("[{time}] {}: {}", msg.sender, msg.text);
        }
    }
}
