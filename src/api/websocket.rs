//! WebSocket handler for real-time health streaming

use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{SinkExt, stream::StreamExt};
use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};

use crate::actors::messages::{ConnectionNotification, SnapshotEvent};
use crate::api::state::ApiState;

/// WebSocket upgrade handler
///
/// GET /api/v1/stream
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<ApiState>) -> Response {
    ws.on_upgrade(|socket| handle_websocket(socket, state))
}

fn notification_message(notification: &ConnectionNotification) -> Value {
    serde_json::json!({
        "type": "connection",
        "event": notification.event,
        "timestamp": notification.timestamp.to_rfc3339(),
        "detail": notification.detail,
    })
}

fn snapshot_message(event: &SnapshotEvent) -> Value {
    serde_json::json!({
        "type": "snapshot",
        "timestamp": event.timestamp.to_rfc3339(),
        "snapshot": event.snapshot,
    })
}

/// Handle WebSocket connection
async fn handle_websocket(socket: WebSocket, state: ApiState) {
    info!("WebSocket client connected");

    let (mut sender, mut receiver) = socket.split();

    let mut notification_rx = state.monitor.subscribe();
    let mut snapshot_rx = state.snapshot_tx.subscribe();

    let mut send_task = tokio::spawn(async move {
        loop {
            let json = tokio::select! {
                result = notification_rx.recv() => match result {
                    Ok(notification) => notification_message(&notification),
                    Err(RecvError::Lagged(skipped)) => {
                        debug!("WebSocket client lagged, skipped {skipped} notifications");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                },
                result = snapshot_rx.recv() => match result {
                    Ok(event) => snapshot_message(&event),
                    Err(RecvError::Lagged(skipped)) => {
                        debug!("WebSocket client lagged, skipped {skipped} snapshots");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                },
            };

            if let Ok(text) = serde_json::to_string(&json)
                && sender.send(Message::Text(text)).await.is_err()
            {
                debug!("WebSocket send failed, client disconnected");
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => {
            recv_task.abort();
        }
        _ = (&mut recv_task) => {
            send_task.abort();
        }
    }

    info!("WebSocket client disconnected");
}
