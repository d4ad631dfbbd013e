//! Inbound message delivery

use crate::controller::TurnController;
use memoir_memory::UserStore;
use std::sync::Arc;
use tracing::{debug, error};

/// A text message from a chat platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Sender id on the platform
    pub platform_user_id: i64,

    /// Sender display name, if the platform reports one
    pub display_name: Option<String>,

    /// Message text
    pub text: String,
}

impl InboundMessage {
    /// Create a message
    pub fn new(
        platform_user_id: i64,
        display_name: Option<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            platform_user_id,
            display_name,
            text: text.into(),
        }
    }
}

/// Resolves the sender and runs the turn
pub struct MessageHandler {
    users: Arc<dyn UserStore>,
    controller: Arc<TurnController>,
}

impl MessageHandler {
    /// Create a handler
    pub fn new(users: Arc<dyn UserStore>, controller: Arc<TurnController>) -> Self {
        Self { users, controller }
    }

    /// Answer one message. Always returns text for the sender.
    pub async fn handle(&self, message: InboundMessage) -> String {
        debug!(platform_user_id = message.platform_user_id, "Received message");

        let user = match self
            .users
            .get_or_create_user(message.platform_user_id, message.display_name.as_deref())
            .await
        {
            Ok(user) => user,
            Err(err) => {
                error!(
                    platform_user_id = message.platform_user_id,
                    error = %err,
                    "Failed to resolve user"
                );
                return self.controller.config().failure_message.clone();
            }
        };

        self.controller.process_message(user.id, &message.text).await
    }
}
