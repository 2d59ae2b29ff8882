//! Transcript: the append-only record every actor reads from.

use serde::Serialize;
use serde_json::Value;

use crate::orchestration::actor::Role;
use crate::tools::ToolOutcome;

/// Eligibility decision stated by the Evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Decision {
    Eligible,
    NotEligible,
}

impl Decision {
    /// Reads an "Eligible" / "Not Eligible" verdict out of free text.
    pub fn detect(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        if lower.contains("not eligible")
            || lower.contains("not_eligible")
            || lower.contains("ineligible")
        {
            Some(Decision::NotEligible)
        } else if lower.contains("eligible") {
            Some(Decision::Eligible)
        } else {
            None
        }
    }
}

/// One atomic contribution to the conversation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "turn", rename_all = "snake_case")]
pub enum Turn {
    Message {
        actor: String,
        role: Role,
        text: String,
    },
    ToolCallRequest {
        actor: String,
        role: Role,
        tool_name: String,
        arguments: Value,
    },
    ToolCallResult {
        tool_name: String,
        outcome: ToolOutcome,
    },
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    // Only the orchestrator writes.
    pub(super) fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The first eligibility verdict the Evaluator stated, in a message or a notify body.
    pub fn decision(&self) -> Option<Decision> {
        self.turns.iter().find_map(|turn| match turn {
            Turn::Message {
                role: Role::Evaluator,
                text,
                ..
            } => Decision::detect(text),
            Turn::ToolCallRequest {
                role: Role::Evaluator,
                arguments,
                ..
            } => arguments
                .get("body")
                .and_then(Value::as_str)
                .and_then(Decision::detect),
            _ => None,
        })
    }

    pub fn has_succeeded(&self, tool: &str) -> bool {
        self.turns.iter().any(|turn| {
            matches!(
                turn,
                Turn::ToolCallResult { tool_name, outcome } if tool_name == tool && outcome.is_success()
            )
        })
    }

    /// Plain-text rendering handed to the reasoning service.
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(render_turn)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn render_turn(turn: &Turn) -> String {
    match turn {
        Turn::Message { actor, text, .. } => format!("[{actor}]\n{text}"),
        Turn::ToolCallRequest {
            actor,
            tool_name,
            arguments,
            ..
        } => format!("[{actor} called {tool_name}]\n{arguments}"),
        Turn::ToolCallResult { tool_name, outcome } => {
            let summary = match outcome {
                ToolOutcome::Succeeded { detail, .. } => format!("succeeded: {detail}"),
                ToolOutcome::Failed { kind, reason, .. } => {
                    format!("failed ({kind:?}): {reason}")
                }
                ToolOutcome::ValidationError { message } => {
                    format!("rejected, fix the arguments: {message}")
                }
            };
            format!("[{tool_name} result]\n{summary}")
        }
    }
}
