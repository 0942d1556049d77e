//! Response bodies returned by the backend.
//!
//! The backend serialises empty lists as `null`, so list fields are optional
//! on the wire and flattened by the accessor methods.

use serde::{Deserialize, Serialize};

use crate::entities::{DecisionStep, LogRecord};

/// Body of `POST /rooms/{id}/regenerate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegenerateResponse {
    #[serde(default)]
    pub status: String,
    /// AI replies removed before regeneration started
    #[serde(default)]
    pub deleted_count: u32,
}

/// Body of `GET /messages/{id}/llm-logs`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LlmLogsResponse {
    #[serde(default)]
    pub logs: Option<Vec<LogRecord>>,
}

impl LlmLogsResponse {
    pub fn into_logs(self) -> Vec<LogRecord> {
        self.logs.unwrap_or_default()
    }
}

/// Body of `GET /messages/{id}/decisions`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DecisionsResponse {
    #[serde(default)]
    pub decisions: Option<Vec<DecisionStep>>,
}

impl DecisionsResponse {
    pub fn into_decisions(self) -> Vec<DecisionStep> {
        self.decisions.unwrap_or_default()
    }
}

/// Error body the backend attaches to failed requests.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
}
