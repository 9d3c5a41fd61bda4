//! Real-time complaint feed.
//!
//! Every connection joins the `complaints` topic and receives each
//! broadcast as a JSON text frame. Client frames other than close are
//! ignored.

use crate::infrastructure::{BroadcastMessage, COMPLAINTS_TOPIC};
use crate::interface::app_state::AppState;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    let receiver = state.broadcaster.subscribe(COMPLAINTS_TOPIC).await;
    ws.on_upgrade(move |socket| handle_socket(socket, receiver))
}

async fn handle_socket(socket: WebSocket, mut feed: broadcast::Receiver<BroadcastMessage>) {
    let (mut sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        loop {
            let message = match feed.recv().await {
                Ok(message) => message,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Observer fell behind, dropping events");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            let json = match serde_json::to_string(&message) {
                Ok(json) => json,
                Err(e) => {
                    warn!(error = %e, "Failed to encode broadcast frame");
                    continue;
                }
            };
            if let Err(e) = sender.send(Message::Text(json.into())).await {
                debug!("Send error, closing connection: {}", e);
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    debug!("Receive error: {}", e);
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    debug!("Observer disconnected");
}
