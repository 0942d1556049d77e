//! Message mutation endpoints

use reqwest::Method;
use rpchat_chats::{EditMessageRequest, MessageId};

use crate::client::GatewayClient;
use crate::error::GatewayResult;

impl GatewayClient {
    /// `PUT /messages/{id}`
    pub async fn edit_message(&self, message_id: MessageId, content: &str) -> GatewayResult<()> {
        let path = format!("/messages/{message_id}");
        let body = EditMessageRequest {
            content: content.to_string(),
        };
        let request = self.request(Method::PUT, &path).json(&body);
        self.execute("PUT", &path, request).await?;
        Ok(())
    }

    /// `DELETE /messages/{id}`
    pub async fn delete_message(&self, message_id: MessageId) -> GatewayResult<()> {
        let path = format!("/messages/{message_id}");
        let request = self.request(Method::DELETE, &path);
        self.execute("DELETE", &path, request).await?;
        Ok(())
    }
}
