use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::app_state::AppState;
use crate::booking::LedgerEvent;
use crate::db::Actor;

/// Streams the ledger events of the caller's appointments as JSON text frames.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    actor: Actor,
) -> impl IntoResponse {
    // Subscribe before the upgrade so nothing committed after the handshake is missed.
    let rx = state.bookings.subscribe();
    ws.on_upgrade(move |socket| handle_socket(socket, actor, rx))
}

async fn handle_socket(socket: WebSocket, actor: Actor, mut rx: broadcast::Receiver<LedgerEvent>) {
    let (mut sender, mut receiver) = socket.split();
    tracing::debug!(user_id = %actor.user_id, "Ledger subscription opened");

    let mut send_task = tokio::spawn(async move {
        loop {
            let frame = match rx.recv().await {
                Ok(event) if event.visible_to(&actor) => {
                    match serde_json::to_string(&event) {
                        Ok(text) => text,
                        Err(err) => {
                            tracing::warn!(error = %err, "Failed to serialize ledger event");
                            continue;
                        }
                    }
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(user_id = %actor.user_id, skipped, "Ledger subscriber lagged");
                    json!({ "kind": "lagged", "skipped": skipped }).to_string()
                }
                Err(RecvError::Closed) => break,
            };
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    // Client frames are ignored; the loop only watches for the close.
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if matches!(msg, Message::Close(_)) {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    tracing::debug!(user_id = %actor.user_id, "Ledger subscription closed");
}
