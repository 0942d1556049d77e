//! Plain-text rendering of sessions and overlays.

use std::collections::HashMap;
use std::fmt::Write as _;

use rpchat_chats::utils::pretty_json;
use rpchat_chats::{CallOutcome, Message, MessageId};
use rpchat_gateway::ChannelStatus;
use rpchat_runtime::{DecisionsOverlay, LogsOverlay, OverlayState, SessionSnapshot};

pub fn message_line(message: &Message) -> String {
    let marker = if message.is_ai { "AI" } else { "you" };
    format!(
        "[#{} {}] {} {} ({marker}): {}",
        message.id,
        message.created_at.format("%H:%M"),
        message.badge(),
        message.participant_name,
        message.content
    )
}

/// Turns successive snapshots of one session into console lines, printing
/// only what changed since the previous snapshot.
#[derive(Debug, Default)]
pub struct TranscriptView {
    shown: HashMap<MessageId, String>,
    typing: Vec<String>,
    status: Option<ChannelStatus>,
}

impl TranscriptView {
    pub fn update(&mut self, snapshot: &SessionSnapshot) -> Vec<String> {
        let mut lines = Vec::new();

        if self.status.as_ref() != Some(&snapshot.status) {
            lines.push(format!("-- {} --", snapshot.status));
            self.status = Some(snapshot.status.clone());
        }

        if snapshot.messages.is_empty() && !self.shown.is_empty() {
            lines.push("-- history cleared --".to_string());
            self.shown.clear();
        }

        let mut removed: Vec<MessageId> = self
            .shown
            .keys()
            .copied()
            .filter(|id| !snapshot.messages.iter().any(|m| m.id == *id))
            .collect();
        removed.sort_unstable();
        for id in removed {
            self.shown.remove(&id);
            lines.push(format!("-- message #{id} deleted --"));
        }

        for message in &snapshot.messages {
            match self.shown.get(&message.id) {
                None => lines.push(message_line(message)),
                Some(content) if *content != message.content => {
                    lines.push(format!("{} (edited)", message_line(message)));
                }
                Some(_) => continue,
            }
            self.shown.insert(message.id, message.content.clone());
        }

        if snapshot.typing != self.typing {
            lines.extend(snapshot.typing.iter().cloned());
            self.typing = snapshot.typing.clone();
        }

        lines
    }
}

pub fn logs(overlay: &LogsOverlay) -> String {
    let mut out = String::new();
    let records = match &overlay.state {
        OverlayState::Loading => return "Loading...".to_string(),
        OverlayState::Failed(message) => return message.clone(),
        OverlayState::Loaded(records) => records,
    };

    let _ = writeln!(
        out,
        "LLM Call Logs: message #{} ({} calls)",
        overlay.message_id,
        records.len()
    );
    if records.is_empty() {
        let _ = writeln!(out, "No log records");
        return out;
    }

    for (index, record) in records.iter().enumerate() {
        let error = if record.outcome.is_error() { " [Error]" } else { "" };
        let _ = writeln!(
            out,
            "#{} {} {}{error} {}ms",
            index + 1,
            record.call_type.label(),
            record.model_name,
            record.latency_ms
        );
        if overlay.expanded() != Some(index) {
            continue;
        }

        let _ = writeln!(
            out,
            "  temperature: {}  max_tokens: {}",
            record.temperature, record.max_tokens
        );
        if record.prompt_tokens > 0 || record.completion_tokens > 0 {
            let _ = writeln!(
                out,
                "  prompt_tokens: {}  completion_tokens: {}",
                record.prompt_tokens, record.completion_tokens
            );
        }
        let _ = writeln!(out, "  Request:\n{}", indent(&pretty_json(&record.request_body)));
        match &record.outcome {
            CallOutcome::Response(body) => {
                let _ = writeln!(out, "  Response:\n{}", indent(&pretty_json(body)));
            }
            CallOutcome::Error(message) => {
                let _ = writeln!(out, "  Error:\n{}", indent(message));
            }
        }
    }
    out
}

pub fn decisions(overlay: &DecisionsOverlay) -> String {
    let mut out = String::new();
    let steps = match &overlay.state {
        OverlayState::Loading => return "Loading...".to_string(),
        OverlayState::Failed(message) => return message.clone(),
        OverlayState::Loaded(steps) => steps,
    };

    let _ = writeln!(
        out,
        "Orchestrator Decision Process: message #{} ({} steps)",
        overlay.message_id,
        steps.len()
    );
    if steps.is_empty() {
        let _ = writeln!(out, "No decision records");
        return out;
    }

    for step in steps {
        let _ = writeln!(
            out,
            "#{} {}: {}",
            step.step_order,
            step.step_type.label(),
            step.reason
        );
        if !overlay.is_expanded(step.id) {
            continue;
        }
        let _ = writeln!(out, "  Input:\n{}", indent(&pretty_json(&step.input_data)));
        let _ = writeln!(out, "  Output:\n{}", indent(&pretty_json(&step.output_data)));
    }
    out
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("    {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
