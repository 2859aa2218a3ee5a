use std::sync::Arc;
use tracing::info;

use crate::session_manager::SessionManager;
use crate::websocket::connection::{ConnectionId, ConnectionManager, DeliveryError};
use quiz_types::{ClientMessage, ServerMessage, SessionError};

#[derive(Clone)]
pub struct MessageHandler {
    connection_id: ConnectionId,
    connection_manager: Arc<ConnectionManager>,
    session_manager: Arc<SessionManager>,
}

impl MessageHandler {
    pub fn new(
        connection_id: ConnectionId,
        connection_manager: Arc<ConnectionManager>,
        session_manager: Arc<SessionManager>,
    ) -> Self {
        Self {
            connection_id,
            connection_manager,
            session_manager,
        }
    }

    /// Dispatches one client message. The only error that escapes is a
    /// failed delivery back to the socket; session-level errors are turned
    /// into an Error message for the player instead.
    pub async fn handle_message(&self, message: ClientMessage) -> Result<(), DeliveryError> {
        self.connection_manager.touch(self.connection_id).await;

        let result = match message {
            ClientMessage::StartSession => {
                info!("Connection {} starting a session", self.connection_id);
                self.session_manager.start_session(self.connection_id).await
            }
            ClientMessage::SubmitAnswer { option } => {
                self.session_manager
                    .submit_answer(self.connection_id, option)
                    .await
            }
            ClientMessage::UsePowerUp { kind } => {
                self.session_manager
                    .use_power_up(self.connection_id, kind)
                    .await
            }
            ClientMessage::Restart => {
                info!("Connection {} restarting", self.connection_id);
                self.session_manager.restart(self.connection_id).await
            }
            ClientMessage::ReturnToMenu => {
                self.session_manager
                    .return_to_menu(self.connection_id)
                    .await;
                Ok(())
            }
            ClientMessage::SpeakQuestion { rate } => {
                self.session_manager
                    .speak_question(self.connection_id, rate)
                    .await;
                Ok(())
            }
            // Heartbeat just refreshes activity (already done above)
            ClientMessage::Heartbeat => Ok(()),
        };

        match result {
            Ok(()) => Ok(()),
            Err(session_error) => self.send_session_error(session_error).await,
        }
    }

    pub async fn handle_disconnect(&self) {
        info!("Handling disconnect for connection {}", self.connection_id);
        self.session_manager
            .handle_disconnect(self.connection_id)
            .await;
    }

    async fn send_session_error(&self, error: SessionError) -> Result<(), DeliveryError> {
        self.connection_manager
            .send_to_connection(
                self.connection_id,
                ServerMessage::Error {
                    message: error.message().to_string(),
                },
            )
            .await
    }
}
