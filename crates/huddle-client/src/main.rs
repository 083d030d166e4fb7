//! huddle-tail - follow conversations from the terminal
//!
//! Run with:
//! ```bash
//! HUDDLE_BACKEND_URL=... HUDDLE_API_KEY=... HUDDLE_ACCESS_TOKEN=... \
//! HUDDLE_USER_ID=<uuid> [HUDDLE_CONVERSATION_ID=<uuid>] \
//! cargo run -p huddle-client --bin huddle-tail
//! ```
//!
//! Signs in, loads the conversation list, optionally selects one
//! conversation, and logs every client event until interrupted.

use std::env;
use std::sync::Arc;

use anyhow::Context;
use huddle_backend::{RestBackend, StorageUploader};
use huddle_cache::{ConnectorConfig, FeedHub, RealtimeConnector};
use huddle_client::{ChatClient, ClientEvent, CurrentUser};
use huddle_common::{try_init_tracing, ClientConfig};
use huddle_core::{ConversationId, UserId};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Initialize tracing
    if let Err(e) = try_init_tracing() {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run().await {
        error!(error = %e, "huddle-tail failed");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = ClientConfig::from_env().context("loading configuration")?;
    info!(env = ?config.app.env, backend = %config.backend.url, "Configuration loaded");

    let user_id: UserId = env::var("HUDDLE_USER_ID")
        .context("HUDDLE_USER_ID is required")?
        .parse()
        .context("HUDDLE_USER_ID is not a UUID")?;
    let conversation_id: Option<ConversationId> = env::var("HUDDLE_CONVERSATION_ID")
        .ok()
        .map(|raw| raw.parse())
        .transpose()
        .context("HUDDLE_CONVERSATION_ID is not a UUID")?;

    let backend = RestBackend::new(&config.backend)?;
    let uploader = StorageUploader::new(&config.backend)?;

    let hub = FeedHub::new_shared();
    let mut connector_config = ConnectorConfig::new(config.backend.realtime_url.clone())
        .reconnect_delay(config.timing.realtime_reconnect_delay());
    if let Some(key) = &config.backend.api_key {
        connector_config = connector_config.api_key(key.clone());
    }
    let connector = RealtimeConnector::start(connector_config, hub.clone());

    let client = ChatClient::new(
        ChatClient::builder()
            .backend(Arc::new(backend))
            .uploader(Arc::new(uploader))
            .feed(hub)
            .config(config)
            .build()?,
    );
    let mut events = client.subscribe_events();

    client.sign_in(CurrentUser::new(user_id))?;
    client.refresh(true).await?;
    info!(
        conversations = client.conversations().len(),
        unread = client.unread_total(),
        "Signed in"
    );

    if let Some(conversation_id) = conversation_id {
        client.select_conversation(conversation_id).await?;
        for message in client.visible_messages() {
            info!(
                author = %message.author.label(),
                at = %message.created_at,
                "{}",
                message.preview(120)
            );
        }
    }

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => log_event(&client, &event),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Event log fell behind"),
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    client.sign_out();
    if let Err(e) = connector.shutdown().await {
        warn!(error = %e, "Realtime connector already stopped");
    }
    Ok(())
}

fn log_event(client: &ChatClient, event: &ClientEvent) {
    match event {
        ClientEvent::MessagesChanged { conversation_id } => {
            if let Some(message) = client.visible_messages().last() {
                info!(
                    conversation_id = %conversation_id,
                    author = %message.author.label(),
                    "{}",
                    message.preview(120)
                );
            }
        }
        ClientEvent::UnreadTotalChanged { total } => info!(total, "Unread total"),
        ClientEvent::Notice(notice) => warn!(code = %notice.code, "{}", notice.message),
        other => match serde_json::to_string(other) {
            Ok(json) => info!(event = %json, "Client event"),
            Err(e) => warn!(error = %e, "Unserializable event"),
        },
    }
}
