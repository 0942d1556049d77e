//! Room snapshot endpoints

use reqwest::Method;
use rpchat_chats::{Message, Participant, Room, RoomId};

use crate::client::GatewayClient;
use crate::error::GatewayResult;

impl GatewayClient {
    /// `GET /rooms/{id}`
    pub async fn get_room(&self, room_id: RoomId) -> GatewayResult<Room> {
        let path = format!("/rooms/{room_id}");
        let request = self.request(Method::GET, &path);
        self.execute_json("GET", &path, request).await
    }

    /// `GET /rooms/{id}/participants`
    pub async fn list_participants(&self, room_id: RoomId) -> GatewayResult<Vec<Participant>> {
        let path = format!("/rooms/{room_id}/participants");
        let request = self.request(Method::GET, &path);
        let participants: Option<Vec<Participant>> =
            self.execute_json("GET", &path, request).await?;
        Ok(participants.unwrap_or_default())
    }

    /// `GET /rooms/{id}/messages`, oldest first.
    pub async fn list_messages(&self, room_id: RoomId) -> GatewayResult<Vec<Message>> {
        let path = format!("/rooms/{room_id}/messages");
        let request = self.request(Method::GET, &path);
        let messages: Option<Vec<Message>> = self.execute_json("GET", &path, request).await?;
        Ok(messages.unwrap_or_default())
    }

    /// `DELETE /rooms/{id}/messages`: wipe the room's history.
    pub async fn clear_history(&self, room_id: RoomId) -> GatewayResult<()> {
        let path = format!("/rooms/{room_id}/messages");
        let request = self.request(Method::DELETE, &path);
        self.execute("DELETE", &path, request).await?;
        Ok(())
    }
}
