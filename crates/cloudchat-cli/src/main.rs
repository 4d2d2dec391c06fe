//! # cloudchat
//!
//! Interactive terminal front end for CloudChat.
//!
//! Reads commands from stdin and prints view changes as snapshots arrive.
//! The database and accounts live in a local SQLite file (see
//! [`ClientConfig`] for the environment variables that move it or keep it in
//! memory).

mod render;
mod repl;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use cloudchat_client::{ChatClient, ClientConfig};
use cloudchat_store::{LocalAuth, LocalBackend};

use crate::repl::Command;

pub(crate) type Client = ChatClient<LocalAuth, LocalBackend>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("cloudchat=info,cloudchat_client=debug,cloudchat_store=info,warn")
    });

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    info!("Starting CloudChat v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration and open the backend
    // -----------------------------------------------------------------------
    let config = ClientConfig::from_env();
    info!(?config, "Loaded configuration");

    let backend = config.open_backend()?;
    let mut client: Client = ChatClient::new(backend.auth(), backend.clone());

    // -----------------------------------------------------------------------
    // 3. Command loop
    // -----------------------------------------------------------------------
    render::banner();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        render::prompt(&client);

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };

                match Command::parse(&line) {
                    Ok(Command::Quit) => break,
                    Ok(command) => {
                        if let Err(e) = repl::execute(&mut client, command, &config) {
                            render::error(&e);
                        }
                    }
                    Err(e) => println!("{e}"),
                }

                let events = client.pump();
                render::events(&client, &events);
            }
            events = client.next_events() => {
                render::events(&client, &events);
            }
        }
    }

    client.sign_out();
    info!("CloudChat stopped");
    Ok(())
}
