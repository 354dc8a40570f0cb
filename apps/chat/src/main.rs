//! Parley terminal chat client entry point.

mod config;
mod name_check;
mod session;

use std::io::{BufRead, Write};

use parley_connection::{ConnectionError, ConnectionEvent, ConnectionManager, EventKind, listener};
use parley_protocol::constants::chat_ws_url;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use crate::config::ChatConfig;
use crate::name_check::{NameCheckError, NameChecker};
use crate::session::{CONNECTING_NOTICE, ChatSession, Effect};

/// Capacity of the channel between connection listeners and the main loop.
const EVENT_QUEUE: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout is the chat log.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting Parley");

    let mut config = match ChatConfig::load() {
        Ok(c) => {
            tracing::info!(host = %c.host, "configuration loaded");
            c
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to load config, using defaults");
            ChatConfig::default()
        }
    };

    let mut input = spawn_stdin_reader();
    let checker = NameChecker::new(&config.host);
    let Some(username) = pick_name(&checker, &config.username, &mut input).await? else {
        return Ok(());
    };

    // Remember the accepted name for the next start.
    if config.username != username {
        config.username = username.clone();
        if let Err(e) = config.save() {
            tracing::warn!(error = %e, "failed to save config");
        }
    }

    run_chat(&config, username, &mut input).await;
    Ok(())
}

/// Reads stdin lines on a dedicated thread. The blocking read cannot be
/// cancelled, so the thread stays detached until the process exits.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Prompts until the server accepts a name. Returns `None` on end of input.
async fn pick_name(
    checker: &NameChecker,
    preset: &str,
    input: &mut mpsc::UnboundedReceiver<String>,
) -> anyhow::Result<Option<String>> {
    let mut candidate = Some(preset.trim().to_string()).filter(|n| !n.is_empty());

    loop {
        let name = match candidate.take() {
            Some(name) => name,
            None => {
                print!("Pick a username: ");
                std::io::stdout().flush()?;
                match input.recv().await {
                    Some(line) => line.trim().to_string(),
                    None => return Ok(None),
                }
            }
        };

        match checker.is_available(&name).await {
            Ok(true) => return Ok(Some(name)),
            Ok(false) => println!("Name not available"),
            Err(NameCheckError::Empty) => println!("Please enter a name"),
            Err(e) => {
                tracing::warn!(error = %e, "name check failed");
                println!("{e}");
            }
        }
    }
}

async fn run_chat(
    config: &ChatConfig,
    username: String,
    input: &mut mpsc::UnboundedReceiver<String>,
) {
    let mgr = ConnectionManager::new(chat_ws_url(&config.host), config.connection_config());

    // Listeners run on the transport task; hand events over to this loop.
    let (tx, mut events) = mpsc::channel(EVENT_QUEUE);
    let forward = listener(move |event: &ConnectionEvent| {
        if let Err(e) = tx.try_send(event.clone()) {
            tracing::warn!(kind = %event.kind(), "failed to forward connection event: {e}");
        }
    });
    for kind in EventKind::ALL {
        mgr.add_event_listener(kind, forward.clone());
    }

    let mut session = ChatSession::new(username);
    tracing::info!(username = session.username(), url = mgr.url(), "joining chat");
    println!("{CONNECTING_NOTICE}");
    mgr.start_connecting();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            Some(event) = events.recv() => {
                for effect in session.handle_event(&event) {
                    apply(&mgr, effect);
                }
                if matches!(event, ConnectionEvent::Close(_)) && !mgr.is_connecting_enabled() {
                    println!("Gave up reconnecting to {}", config.host);
                    break;
                }
            }
            line = input.recv() => match line {
                Some(line) => {
                    if let Some(effect) = session.handle_input(&line) {
                        apply(&mgr, effect);
                    }
                }
                None => break,
            },
        }
    }

    for kind in EventKind::ALL {
        mgr.remove_event_listener(kind, &forward);
    }
    mgr.stop_connecting();
    tracing::info!(
        received = session.history().len(),
        connected = session.is_connected(),
        "left chat"
    );
}

fn apply(mgr: &ConnectionManager, effect: Effect) {
    match effect {
        Effect::Print(line) => println!("{line}"),
        Effect::Send(frame) => {
            if let Err(e) = mgr.send_json(&frame) {
                tracing::warn!(error = %e, "frame not sent");
                if matches!(e, ConnectionError::NoConnection) {
                    println!("{CONNECTING_NOTICE}");
                }
            }
        }
    }
}
