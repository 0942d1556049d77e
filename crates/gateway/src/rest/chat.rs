//! Chat submission endpoints

use reqwest::{Method, Response};
use rpchat_chats::{RegenerateResponse, RoomId, SendMessageRequest};

use crate::client::GatewayClient;
use crate::error::GatewayResult;

impl GatewayClient {
    /// `POST /rooms/{id}/chat` as the room's acting participant.
    ///
    /// The response body is ignored: the posted message and any AI replies
    /// arrive on the live channel.
    pub async fn send_message(&self, room_id: RoomId, content: &str) -> GatewayResult<()> {
        let path = format!("/rooms/{room_id}/chat");
        let body = SendMessageRequest {
            content: content.to_string(),
        };
        let request = self.request(Method::POST, &path).json(&body);
        self.execute("POST", &path, request).await?;
        Ok(())
    }

    /// `POST /rooms/{id}/regenerate`: redo the AI replies to the latest human message.
    pub async fn regenerate(&self, room_id: RoomId) -> GatewayResult<RegenerateResponse> {
        let path = format!("/rooms/{room_id}/regenerate");
        let request = self.request(Method::POST, &path);
        self.execute_json("POST", &path, request).await
    }

    /// `GET /rooms/{id}/events`: the raw server-sent event response.
    pub async fn open_event_stream(&self, room_id: RoomId) -> GatewayResult<Response> {
        let path = format!("/rooms/{room_id}/events");
        let request = self.stream_request(&path);
        self.execute("GET", &path, request).await
    }
}
