//! Audit artifacts the orchestration backend records per message.
//!
//! Both kinds are append-only on the server and never mutated by the client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{MessageId, RoomId};

/// Which stage of the orchestrator issued an LLM call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CallType {
    IntentAnalysis,
    FallbackSelection,
    ResponseGeneration,
    Other(String),
}

impl CallType {
    pub fn as_str(&self) -> &str {
        match self {
            CallType::IntentAnalysis => "intent_analysis",
            CallType::FallbackSelection => "fallback_selection",
            CallType::ResponseGeneration => "response_generation",
            CallType::Other(raw) => raw,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            CallType::IntentAnalysis => "Intent Analysis",
            CallType::FallbackSelection => "Fallback Selection",
            CallType::ResponseGeneration => "Response Generation",
            CallType::Other(raw) => raw,
        }
    }
}

impl From<String> for CallType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "intent_analysis" => CallType::IntentAnalysis,
            "fallback_selection" => CallType::FallbackSelection,
            "response_generation" => CallType::ResponseGeneration,
            _ => CallType::Other(raw),
        }
    }
}

impl From<CallType> for String {
    fn from(call_type: CallType) -> Self {
        call_type.as_str().to_string()
    }
}

/// A call either produced a response body or failed with an error, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    Response(String),
    Error(String),
}

impl CallOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, CallOutcome::Error(_))
    }
}

/// One backend call to a language model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "LogRecordWire")]
pub struct LogRecord {
    pub id: i64,
    pub message_id: MessageId,
    pub room_id: RoomId,
    pub call_type: CallType,
    pub model_name: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Request payload as JSON text
    pub request_body: String,
    pub outcome: CallOutcome,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub latency_ms: u64,
    pub created_at: Option<DateTime<Utc>>,
}

impl LogRecord {
    pub fn total_tokens(&self) -> u32 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }
}

#[derive(Deserialize)]
struct LogRecordWire {
    #[serde(default)]
    id: i64,
    #[serde(default)]
    message_id: MessageId,
    #[serde(default)]
    room_id: RoomId,
    call_type: CallType,
    #[serde(default)]
    model_name: String,
    #[serde(default)]
    temperature: f64,
    #[serde(default)]
    max_tokens: u32,
    #[serde(default)]
    request_body: String,
    #[serde(default)]
    response_body: String,
    #[serde(default)]
    error_message: String,
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    latency_ms: u64,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl From<LogRecordWire> for LogRecord {
    fn from(wire: LogRecordWire) -> Self {
        let outcome = if wire.error_message.is_empty() {
            CallOutcome::Response(wire.response_body)
        } else {
            CallOutcome::Error(wire.error_message)
        };

        Self {
            id: wire.id,
            message_id: wire.message_id,
            room_id: wire.room_id,
            call_type: wire.call_type,
            model_name: wire.model_name,
            temperature: wire.temperature,
            max_tokens: wire.max_tokens,
            request_body: wire.request_body,
            outcome,
            prompt_tokens: wire.prompt_tokens,
            completion_tokens: wire.completion_tokens,
            latency_ms: wire.latency_ms,
            created_at: wire.created_at,
        }
    }
}

/// Stage of the orchestrator's reply pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StepType {
    ParseMentions,
    IntentAnalysis,
    FallbackSelection,
    ApplyForceInclude,
    ApplyForceExclude,
    CharacterSelection,
    ResponseGeneration,
    Other(String),
}

impl StepType {
    pub fn as_str(&self) -> &str {
        match self {
            StepType::ParseMentions => "parse_mentions",
            StepType::IntentAnalysis => "intent_analysis",
            StepType::FallbackSelection => "fallback_selection",
            StepType::ApplyForceInclude => "apply_force_include",
            StepType::ApplyForceExclude => "apply_force_exclude",
            StepType::CharacterSelection => "character_selection",
            StepType::ResponseGeneration => "response_generation",
            StepType::Other(raw) => raw,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            StepType::ParseMentions => "Parse @ and ! commands",
            StepType::IntentAnalysis => "Intent Analysis",
            StepType::FallbackSelection => "Fallback Selection",
            StepType::ApplyForceInclude => "Force Include Characters",
            StepType::ApplyForceExclude => "Force Exclude Characters",
            StepType::CharacterSelection => "Final Character Selection",
            StepType::ResponseGeneration => "Generate Response",
            StepType::Other(raw) => raw,
        }
    }
}

impl From<String> for StepType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "parse_mentions" => StepType::ParseMentions,
            "intent_analysis" => StepType::IntentAnalysis,
            "fallback_selection" => StepType::FallbackSelection,
            "apply_force_include" => StepType::ApplyForceInclude,
            "apply_force_exclude" => StepType::ApplyForceExclude,
            "character_selection" => StepType::CharacterSelection,
            "response_generation" => StepType::ResponseGeneration,
            _ => StepType::Other(raw),
        }
    }
}

impl From<StepType> for String {
    fn from(step_type: StepType) -> Self {
        step_type.as_str().to_string()
    }
}

/// One stage of the reasoning that produced a reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionStep {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub message_id: MessageId,
    #[serde(default)]
    pub room_id: RoomId,
    /// Display order within the message's pipeline
    pub step_order: i32,
    pub step_type: StepType,
    #[serde(default)]
    pub input_data: String,
    #[serde(default)]
    pub output_data: String,
    #[serde(default)]
    pub llm_call_log_id: i64,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_error_message_means_the_call_succeeded() {
        let json = r#"{"id":1,"message_id":5,"room_id":2,"call_type":"intent_analysis",
            "model_name":"gpt-4o","temperature":0.7,"max_tokens":512,
            "request_body":"{}","response_body":"{\"ok\":true}","prompt_tokens":100,
            "completion_tokens":20,"latency_ms":830,"error_message":"",
            "created_at":"2024-05-01T10:00:00Z"}"#;

        let record: LogRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.call_type, CallType::IntentAnalysis);
        assert_eq!(record.outcome, CallOutcome::Response("{\"ok\":true}".to_string()));
        assert_eq!(record.total_tokens(), 120);
    }

    #[test]
    fn error_message_replaces_the_response() {
        let json = r#"{"call_type":"response_generation","response_body":"partial",
            "error_message":"upstream timeout"}"#;

        let record: LogRecord = serde_json::from_str(json).unwrap();

        assert!(record.outcome.is_error());
        assert_eq!(record.outcome, CallOutcome::Error("upstream timeout".to_string()));
    }

    #[test]
    fn unknown_call_and_step_types_keep_their_raw_names() {
        assert_eq!(CallType::from("summarize".to_string()).label(), "summarize");

        let step: DecisionStep = serde_json::from_str(
            r#"{"step_order":3,"step_type":"memory_lookup","reason":"n/a"}"#,
        )
        .unwrap();
        assert_eq!(step.step_type, StepType::Other("memory_lookup".to_string()));
        assert_eq!(step.step_type.label(), "memory_lookup");
    }

    #[test]
    fn step_labels_cover_the_pipeline() {
        let labels: Vec<String> = [
            "parse_mentions",
            "intent_analysis",
            "fallback_selection",
            "apply_force_include",
            "apply_force_exclude",
            "character_selection",
            "response_generation",
        ]
        .into_iter()
        .map(|raw| StepType::from(raw.to_string()).label().to_string())
        .collect();

        assert_eq!(
            labels,
            vec![
                "Parse @ and ! commands",
                "Intent Analysis",
                "Fallback Selection",
                "Force Include Characters",
                "Force Exclude Characters",
                "Final Character Selection",
                "Generate Response",
            ]
        );
    }
}
