//! Actors and the runtime that asks the reasoning service for each actor's next turn.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::orchestration::reasoner::{Reasoner, Reply};
use crate::orchestration::transcript::{Decision, Transcript, Turn};
use crate::tools::{ToolError, ToolRegistry, ToolSchema, BOOK_MEETING, NOTIFY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Role {
    Evaluator,
    Scheduler,
    Coordinator,
}

impl Role {
    /// Position in the fixed speaking order.
    pub fn rotation_index(&self) -> usize {
        match self {
            Role::Evaluator => 0,
            Role::Scheduler => 1,
            Role::Coordinator => 2,
        }
    }
}

/// A named participant bound to one role and a fixed set of tools.
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub name: String,
    pub role: Role,
    pub permitted_tools: BTreeSet<String>,
}

impl Actor {
    pub fn new(name: &str, role: Role, tools: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            role,
            permitted_tools: tools.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn evaluator() -> Self {
        Self::new("Evaluator", Role::Evaluator, &[NOTIFY])
    }

    pub fn scheduler() -> Self {
        Self::new("Scheduler", Role::Scheduler, &[BOOK_MEETING])
    }

    pub fn coordinator() -> Self {
        Self::new("Coordinator", Role::Coordinator, &[])
    }

    pub fn permits(&self, tool: &str) -> bool {
        self.permitted_tools.contains(tool)
    }
}

#[derive(Debug, Error)]
pub enum ActorError {
    #[error("{actor} did not answer within {}s", .after.as_secs())]
    Timeout { actor: String, after: Duration },

    #[error("{actor} could not produce a turn: {message}")]
    Reasoning { actor: String, message: String },
}

/// One actor plus its reasoning backend and the schemas it may call.
pub struct ActorRuntime {
    actor: Actor,
    reasoner: Arc<dyn Reasoner>,
    tools: Vec<ToolSchema>,
    timeout: Duration,
}

impl ActorRuntime {
    /// Fails if the actor is permitted a tool the registry does not know.
    pub fn new(
        actor: Actor,
        reasoner: Arc<dyn Reasoner>,
        registry: &ToolRegistry,
        timeout: Duration,
    ) -> Result<Self, ToolError> {
        let tools = actor
            .permitted_tools
            .iter()
            .map(|name| registry.schema(name).cloned())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            actor,
            reasoner,
            tools,
            timeout,
        })
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    /// Produces this actor's next turn: a message or a tool-call request.
    pub async fn respond(&self, transcript: &Transcript) -> Result<Turn, ActorError> {
        if let Some(text) = self.closing_message(transcript) {
            debug!(actor = %self.actor.name, "Closing turn, reasoning service not consulted");
            return Ok(self.message(text.to_string()));
        }

        let reply = tokio::time::timeout(
            self.timeout,
            self.reasoner.next_turn(&self.actor, transcript, &self.tools),
        )
        .await
        .map_err(|_| ActorError::Timeout {
            actor: self.actor.name.clone(),
            after: self.timeout,
        })?
        .map_err(|e| ActorError::Reasoning {
            actor: self.actor.name.clone(),
            message: e.to_string(),
        })?;

        Ok(match reply {
            Reply::Message(text) => self.message(text),
            Reply::ToolCall {
                tool_name,
                arguments,
            } => Turn::ToolCallRequest {
                actor: self.actor.name.clone(),
                role: self.actor.role,
                tool_name,
                arguments,
            },
        })
    }

    /// The fixed reply of an actor whose work is already done.
    fn closing_message(&self, transcript: &Transcript) -> Option<&'static str> {
        match self.actor.role {
            Role::Scheduler if transcript.has_succeeded(BOOK_MEETING) => {
                Some("Interview scheduled.")
            }
            Role::Scheduler if transcript.decision() == Some(Decision::NotEligible) => {
                Some("Candidate assessed as Not Eligible; no interview to schedule.")
            }
            Role::Evaluator if transcript.has_succeeded(NOTIFY) => {
                Some("Evaluation summary delivered to the reviewer.")
            }
            _ => None,
        }
    }

    fn message(&self, text: String) -> Turn {
        Turn::Message {
            actor: self.actor.name.clone(),
            role: self.actor.role,
            text,
        }
    }
}
