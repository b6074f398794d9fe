//! WebSocket connection lifecycle.
//!
//! Each connection gets an opaque id, a bounded outbound queue drained by
//! a dedicated writer task, and a reader loop that parses inbound frames
//! and hands them to the dispatcher. Handler faults and malformed events
//! are answered with a `BadRequest` reply when the frame carried an ack.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

use pubquiz_common::game::GameError;
use pubquiz_common::protocol::{self, ErrorReply, ServerFrame};

use crate::dispatcher;
use crate::rooms::OUTBOUND_BUFFER;
use crate::server::SharedState;

pub async fn ws_handler(
    State(state): State<SharedState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: SharedState) {
    let conn_id = Uuid::new_v4();
    tracing::debug!(%conn_id, "connection open");

    let (tx, mut rx) = mpsc::channel::<ServerFrame>(OUTBOUND_BUFFER);
    state.router.register(conn_id, tx).await;

    let (mut sink, mut stream) = socket.split();

    // Writer task: drains the queue and writes to the socket, so no
    // handler ever blocks on a slow receiver.
    let write_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            match serde_json::to_string(&frame) {
                Ok(text) => {
                    if sink.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("failed to serialize frame: {}", e);
                }
            }
        }
    });

    while let Some(msg) = stream.next().await {
        match msg {
            Ok(Message::Text(text)) => handle_frame(conn_id, &text, &state).await,
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(%conn_id, "read error: {}", e);
                break;
            }
        }
    }

    tracing::debug!(%conn_id, "connection closed");
    dispatcher::handle_disconnect(conn_id, &state).await;
    write_task.abort();
}

async fn handle_frame(conn_id: Uuid, text: &str, state: &SharedState) {
    let raw: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(%conn_id, "unparseable frame: {}", e);
            return;
        }
    };
    let ack = protocol::extract_ack(&raw);
    let event = match protocol::parse_event(raw) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(%conn_id, "rejected event: {}", e);
            reply_bad_request(conn_id, ack, state).await;
            return;
        }
    };
    if let Err(e) = dispatcher::handle_event(conn_id, event, ack.clone(), state).await {
        tracing::error!(%conn_id, "handler fault: {}", e);
        reply_bad_request(conn_id, ack, state).await;
    }
}

async fn reply_bad_request(conn_id: Uuid, ack: Option<Value>, state: &SharedState) {
    let Some(ack) = ack else { return };
    if let Ok(frame) = ServerFrame::reply(ack, &ErrorReply::from(&GameError::BadRequest)) {
        state.router.emit(conn_id, frame).await;
    }
}
