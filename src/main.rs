mod auth;
mod common;
mod config;
mod error;
mod network;
mod session;
mod storage;

use std::io::{self, Write};
use std::time::Duration;

use chrono::Local;
use clap::Parser;
use dotenvy::dotenv;
use tokio::sync::mpsc;

use auth::UserDirectory;
use common::{AuthenticatedIdentity, NetworkCommand};
use config::SessionConfig;
use error::ChatError;
use network::MqttClient;
use session::{ChatSession, SessionEnd, render};
use storage::MessageStore;

#[derive(Parser)]
#[command(name = "tmessage", version, about = "CLI based group messaging")]
struct Cli {
    /// User name to log in or register with
    #[arg(long)]
    user: String,
    /// MQTT broker endpoint
    #[arg(long, default_value = config::DEFAULT_BROKER)]
    server: String,
    /// MQTT broker port
    #[arg(long, default_value_t = config::DEFAULT_PORT)]
    port: u16,
    /// Disables storing of messages
    #[arg(long = "dont-store")]
    dont_store: bool,
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        // Short human-readable cause only; details go to the log.
        log::error!("Session failed: {err}");
        eprintln!("\n{err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), ChatError> {
    let users = UserDirectory::open(auth::DEFAULT_USERS_FILE);
    let identity = login_or_register(&users, &cli.user)?;
    render::info("User authorized");

    let session_config = SessionConfig {
        server: cli.server,
        port: cli.port,
        store_enabled: !cli.dont_store,
    };

    // Session -> network commands, network -> session events.
    let (cmd_tx, cmd_rx) = mpsc::channel(100);
    let (event_tx, event_rx) = mpsc::channel(100);

    let client = MqttClient::new(&session_config, event_tx, cmd_rx);
    let network_task = tokio::spawn(async move {
        if let Err(err) = client.run().await {
            log::error!("Network client terminated: {err}");
        }
    });

    let store = session_config
        .store_enabled
        .then(|| MessageStore::new(storage::MESSAGES_DIR, Local::now()));

    let session = ChatSession::new(identity, cmd_tx.clone(), event_rx, store);
    let end = session.run().await;

    // Single cleanup path for every exit cause. Disconnect is best-effort:
    // the network task may already be gone.
    let _ = cmd_tx.send(NetworkCommand::Shutdown).await;
    let _ = tokio::time::timeout(Duration::from_secs(2), network_task).await;

    match end {
        SessionEnd::Interrupted | SessionEnd::InputClosed => render::info("\nGoodbye!"),
        SessionEnd::ConnectionFailed(reason) => {
            log::debug!("Connection failed: {reason}");
            render::info("\nCan't connect, please check your network connection");
        }
        SessionEnd::ConnectionLost(reason) => {
            render::info(&format!("\nConnection lost: {reason}"));
        }
    }
    Ok(())
}

/// Password-prompt loop for known users, registration flow for new ones.
/// Auth failures re-prompt; only I/O errors propagate.
fn login_or_register(
    users: &UserDirectory,
    user_id: &str,
) -> Result<AuthenticatedIdentity, ChatError> {
    if users.exists(user_id) {
        render::info(&format!("User {user_id} found"));
        loop {
            let password = prompt("Enter password: ")?;
            match users.authenticate(user_id, &password) {
                Ok(identity) => return Ok(identity),
                Err(ChatError::InvalidCredentials) => {
                    render::notice("Invalid credentials, please try again...");
                }
                Err(err) => return Err(err),
            }
        }
    }

    render::info(&format!("Welcome {user_id} to tmessage!\nPlease register..."));
    let display_name = prompt("Enter your name used for display: ")?;
    loop {
        let password = prompt("Enter password: ")?;
        let confirm = prompt("Re-enter password: ")?;
        match users.register(user_id, &display_name, &password, &confirm) {
            Ok(identity) => return Ok(identity),
            Err(ChatError::PasswordMismatch) => {
                render::notice("Passwords do not match, please try again...");
            }
            Err(err) => return Err(err),
        }
    }
}

fn prompt(label: &str) -> Result<String, ChatError> {
    print!("{label}");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}
