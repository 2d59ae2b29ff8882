//! Reasoning backends: the LLM-driven one and the deterministic progress reporter.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::llm_client::prompts::{NATIVE_TOOL_INSTRUCTION, TRANSCRIPT_INSTRUCTION};
use crate::llm_client::{LlmClient, LlmError};
use crate::orchestration::actor::{Actor, Role};
use crate::orchestration::prompts::{COORDINATOR_SYSTEM, EVALUATOR_SYSTEM, SCHEDULER_SYSTEM};
use crate::orchestration::state::required_calls_for;
use crate::orchestration::transcript::Transcript;
use crate::tools::{ToolSchema, BOOK_MEETING, NOTIFY};

/// What a reasoning backend decided the actor should do next.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Message(String),
    ToolCall { tool_name: String, arguments: Value },
}

impl Reply {
    pub fn message(text: &str) -> Self {
        Reply::Message(text.to_string())
    }

    pub fn tool_call(tool_name: &str, arguments: Value) -> Self {
        Reply::ToolCall {
            tool_name: tool_name.to_string(),
            arguments,
        }
    }
}

#[derive(Debug, Error)]
pub enum ReasoningError {
    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Black-box reasoning capability: transcript and tool list in, one reply out.
#[async_trait]
pub trait Reasoner: Send + Sync {
    async fn next_turn(
        &self,
        actor: &Actor,
        transcript: &Transcript,
        tools: &[ToolSchema],
    ) -> Result<Reply, ReasoningError>;
}

/// Reasoner backed by the LLM client.
pub struct LlmReasoner {
    llm: LlmClient,
}

impl LlmReasoner {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Reasoner for LlmReasoner {
    async fn next_turn(
        &self,
        actor: &Actor,
        transcript: &Transcript,
        tools: &[ToolSchema],
    ) -> Result<Reply, ReasoningError> {
        let system = system_prompt(actor.role, !tools.is_empty());
        let definitions: Vec<Value> = tools.iter().map(ToolSchema::to_tool_definition).collect();

        let response = self
            .llm
            .call_with_tools(&transcript.render(), &system, &definitions)
            .await?;

        if let Some(tool_use) = response.tool_use() {
            return Ok(Reply::ToolCall {
                tool_name: tool_use.name,
                arguments: tool_use.input,
            });
        }

        response
            .text()
            .map(Reply::message)
            .ok_or(ReasoningError::Llm(LlmError::EmptyContent))
    }
}

fn system_prompt(role: Role, has_tools: bool) -> String {
    let base = match role {
        Role::Evaluator => EVALUATOR_SYSTEM,
        Role::Scheduler => SCHEDULER_SYSTEM,
        Role::Coordinator => COORDINATOR_SYSTEM,
    };
    let mut prompt = format!("{base}\n\n{TRANSCRIPT_INSTRUCTION}");
    if has_tools {
        prompt.push_str("\n\n");
        prompt.push_str(NATIVE_TOOL_INSTRUCTION);
    }
    prompt
}

/// Deterministic Coordinator: reports which required calls are still outstanding.
pub struct ProgressReasoner;

#[async_trait]
impl Reasoner for ProgressReasoner {
    async fn next_turn(
        &self,
        _actor: &Actor,
        transcript: &Transcript,
        _tools: &[ToolSchema],
    ) -> Result<Reply, ReasoningError> {
        let outstanding: Vec<String> = required_calls_for(transcript.decision())
            .into_iter()
            .filter(|tool| !transcript.has_succeeded(tool))
            .collect();

        if outstanding.is_empty() {
            return Ok(Reply::message("All required steps are complete."));
        }

        let mut text = format!("Still outstanding: {}.", outstanding.join(", "));
        for tool in &outstanding {
            match tool.as_str() {
                NOTIFY => text.push_str(
                    "\nEvaluator: decide Eligible / Not Eligible and send the summary \
                     to the reviewer with the notify tool.",
                ),
                BOOK_MEETING => text.push_str(
                    "\nScheduler: book the interview with the book_meeting tool.",
                ),
                _ => {}
            }
        }
        Ok(Reply::Message(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_adds_tool_instruction_only_with_tools() {
        let with_tools = system_prompt(Role::Evaluator, true);
        let without = system_prompt(Role::Coordinator, false);
        assert!(with_tools.contains(NATIVE_TOOL_INSTRUCTION));
        assert!(!without.contains(NATIVE_TOOL_INSTRUCTION));
        assert!(without.contains(TRANSCRIPT_INSTRUCTION));
    }

    #[tokio::test]
    async fn test_progress_lists_both_calls_before_decision() {
        let reply = ProgressReasoner
            .next_turn(&Actor::coordinator(), &Transcript::new(), &[])
            .await
            .unwrap();

        let Reply::Message(text) = reply else {
            panic!("coordinator must only speak");
        };
        assert!(text.starts_with("Still outstanding: book_meeting, notify."));
        assert!(text.contains("Scheduler: book the interview"));
    }
}
