//! WebSocket connection handler

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        ConnectInfo, State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use super::state::AppState;

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, remote, state))
}

/// Handle an individual WebSocket connection
async fn handle_socket(socket: WebSocket, remote: SocketAddr, state: Arc<AppState>) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = state.hub.channel();

    let client_id = match state.hub.connect(tx) {
        Ok(id) => id,
        Err(e) => {
            warn!("Rejecting connection from {}: {}", remote, e);
            let _ = ws_tx.send(Message::Close(None)).await;
            return;
        }
    };
    info!("[WS] New client {} connected from {}", client_id, remote);

    // Writer: drains the hub queue; ends when the hub drops the sender
    let mut send_task = tokio::spawn(async move {
        while let Some(json) = rx.recv().await {
            if ws_tx.send(Message::Text(json)).await.is_err() {
                return;
            }
        }
        let _ = ws_tx.send(Message::Close(None)).await;
    });

    loop {
        tokio::select! {
            // Pruned by the hub or the socket write failed
            _ = &mut send_task => break,

            result = ws_rx.next() => {
                match result {
                    Some(Ok(Message::Text(text))) => {
                        if let Err(e) = state.hub.on_client_message(&text) {
                            warn!("[WS] Error processing message from {}: {}", client_id, e);
                        }
                    }
                    Some(Ok(Message::Close(_))) => break,
                    // Pings are answered by the transport; binary frames are ignored
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!("WebSocket {} error: {}", client_id, e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    state.hub.disconnect(client_id);
    send_task.abort();
    info!("[WS] Client {} disconnected: {}", client_id, remote);
}
