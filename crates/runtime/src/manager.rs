//! Holds the one room the operator is looking at.

use std::sync::Arc;

use rpchat_chats::RoomId;
use rpchat_config::AppConfig;
use rpchat_gateway::{GatewayClient, GatewayResult};
use tracing::info;

use crate::error::{CommandError, CommandResult};
use crate::session::ChatSession;

/// At most one open [`ChatSession`] at a time.
#[derive(Debug)]
pub struct SessionManager {
    client: GatewayClient,
    config: AppConfig,
    active: Option<Arc<ChatSession>>,
}

impl SessionManager {
    pub fn new(client: GatewayClient, config: AppConfig) -> Self {
        Self {
            client,
            config,
            active: None,
        }
    }

    pub fn client(&self) -> &GatewayClient {
        &self.client
    }

    /// Close the current session, if any, then open one for `room_id`.
    ///
    /// The previous session is closed before the new one connects, so no
    /// event from the old room can land after the switch. If opening fails
    /// no session is active.
    pub async fn switch_room(&mut self, room_id: RoomId) -> GatewayResult<Arc<ChatSession>> {
        if let Some(previous) = self.active.take() {
            info!(from = previous.room_id(), to = room_id, "switching rooms");
            previous.close();
        }

        let session = Arc::new(ChatSession::open(self.client.clone(), room_id, &self.config).await?);
        self.active = Some(Arc::clone(&session));
        Ok(session)
    }

    pub fn active(&self) -> CommandResult<Arc<ChatSession>> {
        self.active.clone().ok_or(CommandError::NoActiveSession)
    }

    pub fn active_room(&self) -> Option<RoomId> {
        self.active.as_ref().map(|session| session.room_id())
    }

    pub fn close(&mut self) {
        if let Some(session) = self.active.take() {
            session.close();
        }
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.close();
    }
}
