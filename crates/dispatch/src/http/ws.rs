// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification WebSocket: one long-lived connection per user, fed by the
//! [`crate::notify::NotificationBus`].

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tracing::debug;

use crate::state::AppState;

/// `GET /ws/{user_id}` — upgrade and attach a notification session.
pub async fn ws_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state, user_id))
}

/// Per-connection bridge: forwards envelopes from the bus to the socket and
/// drains (but otherwise ignores) inbound client frames until either side
/// closes or the process starts shutting down.
async fn handle_ws(socket: WebSocket, state: Arc<AppState>, user_id: i64) {
    let mut rx = state.notifications.attach(user_id).await;
    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => break,

            envelope = rx.recv() => {
                match envelope {
                    Some(envelope) => {
                        let Ok(text) = serde_json::to_string(&envelope) else { continue };
                        if ws_tx.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }

            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }

    debug!(user_id, "notification session closed");
    state.notifications.detach(user_id).await;
}
