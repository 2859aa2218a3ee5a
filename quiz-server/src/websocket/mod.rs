use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tracing::{info, warn};
use warp::ws::{Message, WebSocket};

use crate::session_manager::SessionManager;
use quiz_types::ClientMessage;

pub mod connection;
pub mod handlers;


pub use connection::ConnectionManager;
use handlers::MessageHandler;

/// Drives one WebSocket for its whole lifetime.
///
/// The outgoing half is a spawned pump that serializes whatever lands on
/// the connection's channel. The incoming half runs here: frames that
/// aren't valid client messages are logged and dropped rather than
/// closing the socket.
pub async fn handle_connection(
    websocket: WebSocket,
    connection_manager: Arc<ConnectionManager>,
    session_manager: Arc<SessionManager>,
) {
    let (mut ws_sender, mut ws_receiver) = websocket.split();
    let (connection_id, mut outgoing) = connection_manager.register().await;
    info!("WebSocket connected: {}", connection_id);

    let pump = tokio::spawn(async move {
        while let Some(message) = outgoing.recv().await {
            let json = match serde_json::to_string(&message) {
                Ok(json) => json,
                Err(e) => {
                    warn!("Dropping unserializable message: {}", e);
                    continue;
                }
            };
            if ws_sender.send(Message::text(json)).await.is_err() {
                break;
            }
        }
    });

    let handler = MessageHandler::new(
        connection_id,
        connection_manager.clone(),
        session_manager,
    );

    while let Some(frame) = ws_receiver.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                warn!("WebSocket error for {}: {}", connection_id, e);
                break;
            }
        };
        if frame.is_close() {
            break;
        }
        // Binary and control frames carry no client messages
        let Ok(text) = frame.to_str() else {
            continue;
        };

        match serde_json::from_str::<ClientMessage>(text) {
            Ok(message) => {
                if let Err(e) = handler.handle_message(message).await {
                    warn!("Could not reply to {}: {}", connection_id, e);
                    break;
                }
            }
            Err(e) => {
                warn!("Ignoring malformed frame from {}: {}", connection_id, e);
            }
        }
    }

    info!("WebSocket disconnected: {}", connection_id);
    handler.handle_disconnect().await;
    connection_manager.unregister(connection_id).await;
    pump.abort();
}
