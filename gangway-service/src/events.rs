//! WebSocket push endpoint
//!
//! Fans the process-wide broadcast out to every connected client. Inbound
//! messages are logged and otherwise ignored; the event channel is
//! push-only.

use crate::state::SharedState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use tokio::sync::broadcast::error::RecvError;

pub async fn upgrade(ws: WebSocketUpgrade, State(state): State<SharedState>) -> Response {
    ws.on_upgrade(move |socket| serve(socket, state))
}

async fn serve(mut socket: WebSocket, state: SharedState) {
    let mut events = state.events.subscribe();
    tracing::debug!("event client connected");

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(frame) => {
                    if socket.send(Message::Text(frame.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event client lagging, frames dropped");
                }
                Err(RecvError::Closed) => break,
            },
            inbound = socket.recv() => match inbound {
                Some(Ok(message)) => {
                    tracing::debug!(?message, "ignoring inbound event-channel message");
                }
                Some(Err(_)) | None => break,
            },
        }
    }

    tracing::debug!("event client disconnected");
}
