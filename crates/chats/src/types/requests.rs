//! Request bodies sent to the backend.

use serde::{Deserialize, Serialize};

/// Body of `POST /rooms/{id}/chat`; the backend attributes it to the acting participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

/// Body of `PUT /messages/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditMessageRequest {
    pub content: String,
}
