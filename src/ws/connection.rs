//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single bridge connection: dispatches
//! incoming commands, forwards outbound messages for the channels the
//! bridge serves and keeps the shared channel directory in step.
//!
//! Chat messages go to the interpreter on their own task, since a `follow`
//! may wait out a full fetch backoff. Their replies come back to the loop
//! through an mpsc channel, so a slow command never holds up other replies
//! or outbound events.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};

use super::messages::{ChannelSelection, WsCommand, WsMessage, WsMessageType};
use super::subscription::SubscriptionManager;
use crate::app_state::AppState;
use crate::domain::RelayEvent;
use crate::error::RelayError;

/// Interpreter replies that may queue up before the loop writes them.
const REPLY_BUFFER: usize = 64;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the bridge and dispatches them.
/// - Writes interpreter replies as their tasks finish.
/// - Forwards matching events from the [`broadcast::Receiver`] to the bridge.
/// - Closes the socket when the relay shuts down.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<RelayEvent>,
    state: AppState,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();
    let mut shutdown = state.shutdown.clone();
    let (reply_tx, mut reply_rx) = mpsc::channel::<String>(REPLY_BUFFER);

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = handle_text_message(&text, &mut subs, &state, &reply_tx).await;
                        if let Some(resp_json) = response
                            && ws_tx.send(Message::text(resp_json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(error = %e, "ws read failed");
                        break;
                    }
                    _ => {}
                }
            }
            Some(reply) = reply_rx.recv() => {
                if ws_tx.send(Message::text(reply)).await.is_err() {
                    break;
                }
            }
            event = event_rx.recv() => {
                match event {
                    Ok(relay_event) => {
                        if subs.matches(relay_event.channel_id()) {
                            let msg = WsMessage::new(
                                uuid::Uuid::new_v4().to_string(),
                                WsMessageType::Event,
                                serde_json::to_value(&relay_event).unwrap_or_default(),
                            );
                            let json = serde_json::to_string(&msg).unwrap_or_default();
                            if ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "bridge lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            () = shutdown.wait() => {
                let _ = ws_tx.send(Message::Close(None)).await;
                break;
            }
        }
    }

    let (channels, wildcard) = subs.clear();
    for channel in channels {
        state.directory.detach(channel).await;
    }
    if wildcard {
        state.directory.detach_all().await;
    }
    tracing::debug!("ws connection closed");
}

fn error_message(id: String, err: &RelayError) -> Option<String> {
    let msg = WsMessage::new(
        id,
        WsMessageType::Error,
        serde_json::json!({
            "code": err.error_code(),
            "message": err.to_string(),
        }),
    );
    serde_json::to_string(&msg).ok()
}

/// Handles a text message from the bridge, returning an optional JSON response.
///
/// `message` commands answer later through `replies`.
async fn handle_text_message(
    text: &str,
    subs: &mut SubscriptionManager,
    state: &AppState,
    replies: &mpsc::Sender<String>,
) -> Option<String> {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return error_message(
            String::new(),
            &RelayError::InvalidCommand("malformed JSON".to_string()),
        );
    };
    if msg.msg_type != WsMessageType::Command {
        return error_message(
            msg.id,
            &RelayError::InvalidCommand("expected a command".to_string()),
        );
    }
    let command = match serde_json::from_value::<WsCommand>(msg.payload) {
        Ok(command) => command,
        Err(e) => {
            return error_message(msg.id, &RelayError::InvalidCommand(e.to_string()));
        }
    };

    let payload = match command {
        WsCommand::Subscribe { channel_ids } => {
            let selection = ChannelSelection::from_selectors(&channel_ids);
            let (added, wildcard_added) = subs.subscribe(&selection.ids, selection.wildcard);
            for channel in &added {
                state.directory.attach(*channel).await;
            }
            if wildcard_added {
                state.directory.attach_all().await;
            }
            tracing::info!(channels = ?selection.ids, wildcard = selection.wildcard, "bridge subscribed");
            serde_json::json!({
                "subscribed": selection.ids,
                "rejected": selection.rejected,
                "count": subs.count(),
                "wildcard": subs.is_subscribed_all(),
            })
        }
        WsCommand::Unsubscribe { channel_ids } => {
            let selection = ChannelSelection::from_selectors(&channel_ids);
            let (removed, wildcard_removed) = subs.unsubscribe(&selection.ids, selection.wildcard);
            for channel in &removed {
                state.directory.detach(*channel).await;
            }
            if wildcard_removed {
                state.directory.detach_all().await;
            }
            serde_json::json!({
                "unsubscribed": removed,
                "remaining_count": subs.count(),
                "wildcard": subs.is_subscribed_all(),
            })
        }
        WsCommand::Message {
            author,
            channel_id,
            content,
        } => {
            if author.trim().is_empty() {
                return error_message(
                    msg.id,
                    &RelayError::InvalidCommand("author must not be empty".to_string()),
                );
            }
            let interpreter = Arc::clone(&state.interpreter);
            let replies = replies.clone();
            let id = msg.id;
            tokio::spawn(async move {
                let reply = interpreter.handle(&author, channel_id, &content).await;
                let response = WsMessage::new(
                    id,
                    WsMessageType::Response,
                    serde_json::json!({
                        "channel_id": channel_id,
                        "reply": reply,
                    }),
                );
                if let Ok(json) = serde_json::to_string(&response)
                    && replies.send(json).await.is_err()
                {
                    tracing::debug!(%channel_id, "bridge left before the reply was ready");
                }
            });
            return None;
        }
    };

    let response = WsMessage::new(msg.id, WsMessageType::Response, payload);
    serde_json::to_string(&response).ok()
}
