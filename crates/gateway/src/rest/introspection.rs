//! Per-message audit endpoints

use reqwest::Method;
use rpchat_chats::{DecisionStep, DecisionsResponse, LlmLogsResponse, LogRecord, MessageId};

use crate::client::GatewayClient;
use crate::error::GatewayResult;

impl GatewayClient {
    /// `GET /messages/{id}/llm-logs`, in the order the backend recorded them.
    pub async fn llm_logs(&self, message_id: MessageId) -> GatewayResult<Vec<LogRecord>> {
        let path = format!("/messages/{message_id}/llm-logs");
        let request = self.request(Method::GET, &path);
        let body: LlmLogsResponse = self.execute_json("GET", &path, request).await?;
        Ok(body.into_logs())
    }

    /// `GET /messages/{id}/decisions`, unsorted.
    pub async fn decisions(&self, message_id: MessageId) -> GatewayResult<Vec<DecisionStep>> {
        let path = format!("/messages/{message_id}/decisions");
        let request = self.request(Method::GET, &path);
        let body: DecisionsResponse = self.execute_json("GET", &path, request).await?;
        Ok(body.into_decisions())
    }
}
