//! On-demand views of how a reply was produced.
//!
//! Each overlay fetches fresh data when opened and fails on its own: a
//! failed fetch never touches the session or the other overlay.

use std::collections::HashSet;

use rpchat_chats::{DecisionStep, LogRecord, MessageId};
use rpchat_gateway::GatewayClient;
use tracing::warn;

pub const LOGS_FAILED: &str = "Failed to fetch logs";
pub const DECISIONS_FAILED: &str = "Failed to fetch decision process";

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayState<T> {
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> OverlayState<T> {
    pub fn loaded(&self) -> Option<&T> {
        match self {
            OverlayState::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, OverlayState::Loading)
    }
}

/// LLM calls made while handling one message. At most one entry is
/// expanded at a time.
#[derive(Debug, Clone)]
pub struct LogsOverlay {
    pub message_id: MessageId,
    pub state: OverlayState<Vec<LogRecord>>,
    expanded: Option<usize>,
}

impl LogsOverlay {
    pub fn loading(message_id: MessageId) -> Self {
        Self {
            message_id,
            state: OverlayState::Loading,
            expanded: None,
        }
    }

    pub fn records(&self) -> &[LogRecord] {
        self.state.loaded().map(Vec::as_slice).unwrap_or_default()
    }

    pub fn expanded(&self) -> Option<usize> {
        self.expanded
    }

    /// Expand the entry at `index`, or collapse it if it already is.
    pub fn toggle(&mut self, index: usize) {
        if index >= self.records().len() {
            return;
        }
        self.expanded = if self.expanded == Some(index) {
            None
        } else {
            Some(index)
        };
    }
}

/// Decision steps for one message, in pipeline order. Every step starts
/// expanded.
#[derive(Debug, Clone)]
pub struct DecisionsOverlay {
    pub message_id: MessageId,
    pub state: OverlayState<Vec<DecisionStep>>,
    expanded: HashSet<i64>,
}

impl DecisionsOverlay {
    pub fn loading(message_id: MessageId) -> Self {
        Self {
            message_id,
            state: OverlayState::Loading,
            expanded: HashSet::new(),
        }
    }

    fn loaded(message_id: MessageId, mut steps: Vec<DecisionStep>) -> Self {
        steps.sort_by_key(|step| step.step_order);
        let expanded = steps.iter().map(|step| step.id).collect();
        Self {
            message_id,
            state: OverlayState::Loaded(steps),
            expanded,
        }
    }

    pub fn steps(&self) -> &[DecisionStep] {
        self.state.loaded().map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_expanded(&self, step_id: i64) -> bool {
        self.expanded.contains(&step_id)
    }

    pub fn toggle(&mut self, step_id: i64) {
        if !self.expanded.remove(&step_id) && self.steps().iter().any(|s| s.id == step_id) {
            self.expanded.insert(step_id);
        }
    }
}

/// Fetches introspection overlays. Nothing is cached.
#[derive(Debug, Clone)]
pub struct IntrospectionLoader {
    client: GatewayClient,
}

impl IntrospectionLoader {
    pub fn new(client: GatewayClient) -> Self {
        Self { client }
    }

    pub async fn load_logs(&self, message_id: MessageId) -> LogsOverlay {
        let mut overlay = LogsOverlay::loading(message_id);
        overlay.state = match self.client.llm_logs(message_id).await {
            Ok(records) => OverlayState::Loaded(records),
            Err(error) => {
                warn!(message_id, %error, "llm log fetch failed");
                OverlayState::Failed(LOGS_FAILED.to_string())
            }
        };
        overlay
    }

    pub async fn load_decisions(&self, message_id: MessageId) -> DecisionsOverlay {
        match self.client.decisions(message_id).await {
            Ok(steps) => DecisionsOverlay::loaded(message_id, steps),
            Err(error) => {
                warn!(message_id, %error, "decision fetch failed");
                DecisionsOverlay {
                    state: OverlayState::Failed(DECISIONS_FAILED.to_string()),
                    ..DecisionsOverlay::loading(message_id)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpchat_chats::{CallOutcome, CallType, StepType};

    fn record(id: i64) -> LogRecord {
        LogRecord {
            id,
            message_id: 1,
            room_id: 1,
            call_type: CallType::IntentAnalysis,
            model_name: "test-model".to_string(),
            temperature: 0.7,
            max_tokens: 256,
            request_body: "{}".to_string(),
            outcome: CallOutcome::Response("{}".to_string()),
            prompt_tokens: 10,
            completion_tokens: 5,
            latency_ms: 120,
            created_at: None,
        }
    }

    fn step(id: i64, step_order: i32) -> DecisionStep {
        DecisionStep {
            id,
            message_id: 1,
            room_id: 1,
            step_order,
            step_type: StepType::IntentAnalysis,
            input_data: String::new(),
            output_data: String::new(),
            llm_call_log_id: 0,
            reason: String::new(),
            created_at: None,
        }
    }

    #[test]
    fn decisions_are_sorted_and_start_expanded() {
        let overlay = DecisionsOverlay::loaded(1, vec![step(30, 3), step(10, 1), step(20, 2)]);

        let order: Vec<i64> = overlay.steps().iter().map(|s| s.id).collect();
        assert_eq!(order, vec![10, 20, 30]);
        assert!([10, 20, 30].iter().all(|id| overlay.is_expanded(*id)));
    }

    #[test]
    fn sorting_keeps_arrival_order_for_equal_steps() {
        let overlay = DecisionsOverlay::loaded(1, vec![step(2, 1), step(1, 1), step(3, 0)]);

        let order: Vec<i64> = overlay.steps().iter().map(|s| s.id).collect();
        assert_eq!(order, vec![3, 2, 1]);
    }

    #[test]
    fn decision_toggle_flips_one_step() {
        let mut overlay = DecisionsOverlay::loaded(1, vec![step(10, 1), step(20, 2)]);

        overlay.toggle(10);
        assert!(!overlay.is_expanded(10));
        assert!(overlay.is_expanded(20));

        overlay.toggle(10);
        assert!(overlay.is_expanded(10));

        overlay.toggle(99);
        assert!(!overlay.is_expanded(99));
    }

    #[test]
    fn logs_expand_one_entry_at_a_time() {
        let mut overlay = LogsOverlay::loading(1);
        overlay.toggle(0);
        assert_eq!(overlay.expanded(), None);

        overlay.state = OverlayState::Loaded(Vec::new());
        assert!(overlay.records().is_empty());
        overlay.toggle(0);
        assert_eq!(overlay.expanded(), None);

        overlay.state = OverlayState::Loaded(vec![record(1), record(2)]);
        overlay.toggle(0);
        assert_eq!(overlay.expanded(), Some(0));

        overlay.toggle(1);
        assert_eq!(overlay.expanded(), Some(1));

        overlay.toggle(1);
        assert_eq!(overlay.expanded(), None);

        overlay.toggle(2);
        assert_eq!(overlay.expanded(), None);
    }
}
