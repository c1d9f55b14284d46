//! WebSocket handler for real-time climate updates

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use zigbee_climate::ClimateState;

use crate::AppState;

/// WebSocket events sent to clients
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsEvent {
    Connected { entities: usize },
    ClimateUpdated { state: Box<ClimateState> },
}

/// Handle a WebSocket connection
pub async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    let connected = WsEvent::Connected {
        entities: state.hub.len(),
    };
    let Ok(connected_msg) = serde_json::to_string(&connected) else {
        return;
    };
    if sender.send(Message::Text(connected_msg)).await.is_err() {
        return;
    }

    // Forward entity state flushes
    let mut event_rx = state.hub.subscribe();
    let send_task = tokio::spawn(async move {
        loop {
            match event_rx.recv().await {
                Ok(climate) => {
                    let ws_event = WsEvent::ClimateUpdated {
                        state: Box::new(climate),
                    };
                    let json = match serde_json::to_string(&ws_event) {
                        Ok(json) => json,
                        Err(e) => {
                            tracing::warn!("Failed to serialize climate state: {}", e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {
                    // Skip missed messages
                    continue;
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                    break;
                }
            }
        }
    });

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Close(_)) | Err(_) => break,
            _ => {}
        }
    }

    send_task.abort();
}
