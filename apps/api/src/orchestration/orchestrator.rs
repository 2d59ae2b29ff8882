//! Orchestrator: drives the bounded round-robin conversation.
//!
//! Per round: pick the next actor in rotation, ask its runtime for one turn, append it,
//! and if it is a tool call, admit → dedupe → dispatch → append the result. Then check
//! for termination. The orchestrator is the only writer of the transcript and state.

use std::collections::{BTreeSet, HashMap};

use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::orchestration::actor::{Actor, ActorRuntime, Role};
use crate::orchestration::state::{
    ConversationOutcome, ConversationState, FailureReason, Phase, LOOP_GUARD_LIMIT,
};
use crate::orchestration::transcript::{Decision, Transcript, Turn};
use crate::side_effects::ledger::{IdempotencyKey, Ledger, SideEffectRecord};
use crate::tools::{ToolError, ToolOutcome, ToolRegistry, BOOK_MEETING};

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("a conversation needs at least one actor")]
    NoActors,
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct ConversationReport {
    pub outcome: ConversationOutcome,
    pub rounds: u32,
    pub decision: Option<Decision>,
    pub required_calls: BTreeSet<String>,
    pub satisfied_calls: BTreeSet<String>,
    pub transcript: Transcript,
    pub tool_calls: Vec<SideEffectRecord>,
}

pub struct Orchestrator {
    runtimes: Vec<ActorRuntime>,
    registry: ToolRegistry,
    transcript: Transcript,
    state: ConversationState,
    intents: Ledger<ToolOutcome>,
    /// Consecutive rejected requests per (actor, tool).
    rejected_streaks: HashMap<(String, String), u32>,
}

impl Orchestrator {
    /// `seed` opens the transcript as a Coordinator message; it does not use a round.
    pub fn new(
        mut runtimes: Vec<ActorRuntime>,
        registry: ToolRegistry,
        seed: String,
        max_rounds: u32,
    ) -> Result<Self, OrchestratorError> {
        if runtimes.is_empty() {
            return Err(OrchestratorError::NoActors);
        }
        runtimes.sort_by_key(|r| r.actor().role.rotation_index());

        let coordinator = runtimes
            .iter()
            .find(|r| r.actor().role == Role::Coordinator)
            .map(|r| r.actor().name.clone())
            .unwrap_or_else(|| "Coordinator".to_string());

        let mut transcript = Transcript::new();
        transcript.append(Turn::Message {
            actor: coordinator,
            role: Role::Coordinator,
            text: seed,
        });

        Ok(Self {
            runtimes,
            registry,
            transcript,
            state: ConversationState::new(max_rounds),
            intents: Ledger::new(),
            rejected_streaks: HashMap::new(),
        })
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Runs until a terminal state. Cancellation is observed between turns only, so a
    /// side effect that was already dispatched finishes before the run stops.
    pub async fn run(mut self, cancel: CancellationToken) -> ConversationReport {
        while !self.state.is_terminal() {
            if cancel.is_cancelled() {
                warn!(round = self.state.round, "Conversation cancelled by caller");
                self.terminate(ConversationOutcome::Failure(FailureReason::Cancelled));
                break;
            }
            self.step().await;
        }
        self.into_report()
    }

    /// Executes one round. No-op once terminated.
    pub async fn step(&mut self) {
        if self.state.is_terminal() {
            return;
        }

        let index = self.state.round as usize % self.runtimes.len();
        let runtime = &self.runtimes[index];
        let actor = runtime.actor().clone();

        let turn = match runtime.respond(&self.transcript).await {
            Ok(turn) => turn,
            Err(e) => {
                warn!(actor = %actor.name, "Actor failed to produce a turn: {e}");
                self.terminate(ConversationOutcome::Failure(FailureReason::Reasoning {
                    actor: actor.name.clone(),
                    message: e.to_string(),
                }));
                return;
            }
        };

        self.transcript.append(turn.clone());
        self.latch_decision();

        if let Turn::ToolCallRequest {
            tool_name,
            arguments,
            ..
        } = turn
        {
            self.state.phase = Phase::AwaitingToolResult;
            self.handle_tool_call(&actor, tool_name, arguments).await;
            if !self.state.is_terminal() {
                self.state.phase = Phase::Running;
            }
        }

        self.state.round += 1;
        debug!(round = self.state.round, actor = %actor.name, "Round complete");
        self.check_termination();
    }

    fn latch_decision(&mut self) {
        if self.state.decision.is_some() {
            return;
        }
        if let Some(decision) = self.transcript.decision() {
            self.state.latch_decision(decision);
            info!(
                ?decision,
                required = ?self.state.required_calls,
                "Evaluator decision recorded"
            );
        }
    }

    async fn handle_tool_call(&mut self, actor: &Actor, tool_name: String, arguments: Value) {
        if !self.registry.has_tool(&tool_name) {
            warn!(actor = %actor.name, tool_name = %tool_name, "Unknown tool requested");
            self.terminate(ConversationOutcome::Failure(FailureReason::ToolNotFound {
                tool: tool_name,
            }));
            return;
        }

        let outcome = match self.admit(actor, &tool_name, arguments) {
            Ok(arguments) => self.execute(actor, &tool_name, &arguments).await,
            Err(message) => {
                debug!(actor = %actor.name, tool_name = %tool_name, "Tool call rejected: {message}");
                ToolOutcome::ValidationError { message }
            }
        };

        self.transcript.append(Turn::ToolCallResult {
            tool_name: tool_name.clone(),
            outcome: outcome.clone(),
        });
        self.record_outcome(actor, &tool_name, &outcome);
    }

    /// Permission, policy and schema checks. `Err` carries the message the actor sees.
    fn admit(&self, actor: &Actor, tool_name: &str, arguments: Value) -> Result<Value, String> {
        if !actor.permits(tool_name) {
            return Err(format!("{} is not permitted to call '{tool_name}'", actor.name));
        }
        if tool_name == BOOK_MEETING && self.state.decision == Some(Decision::NotEligible) {
            return Err(
                "the candidate was assessed Not Eligible; no interview may be booked".to_string(),
            );
        }
        self.registry
            .validate(tool_name, arguments)
            .map_err(|e| match e {
                ToolError::Validation { message, .. } => message,
                other => other.to_string(),
            })
    }

    async fn execute(&mut self, actor: &Actor, tool_name: &str, arguments: &Value) -> ToolOutcome {
        let key = IdempotencyKey::for_intent(&actor.name, tool_name, arguments);
        if let Some(previous) = self.intents.recorded(&key) {
            info!(
                actor = %actor.name,
                tool_name = %tool_name,
                "Repeated tool call answered from ledger"
            );
            return previous;
        }

        self.intents.begin(&key);
        let outcome = match self.registry.dispatch(tool_name, arguments).await {
            Ok(outcome) => outcome,
            Err(e) => ToolOutcome::ValidationError {
                message: e.to_string(),
            },
        };
        self.intents
            .complete(&key, outcome.is_success(), outcome.attempts(), outcome.clone());
        outcome
    }

    fn record_outcome(&mut self, actor: &Actor, tool_name: &str, outcome: &ToolOutcome) {
        let streak_key = (actor.name.clone(), tool_name.to_string());
        match outcome {
            ToolOutcome::ValidationError { .. } => {
                let streak = self.rejected_streaks.entry(streak_key).or_insert(0);
                *streak += 1;
                if *streak >= LOOP_GUARD_LIMIT {
                    let attempts = *streak;
                    warn!(actor = %actor.name, tool_name = %tool_name, "Loop guard tripped");
                    self.terminate(ConversationOutcome::Failure(FailureReason::LoopDetected {
                        actor: actor.name.clone(),
                        tool: tool_name.to_string(),
                        attempts,
                    }));
                }
            }
            ToolOutcome::Succeeded { .. } => {
                self.rejected_streaks.remove(&streak_key);
                self.state.satisfied_calls.insert(tool_name.to_string());
            }
            ToolOutcome::Failed { kind, reason, .. } => {
                self.rejected_streaks.remove(&streak_key);
                if self.state.required_calls.contains(tool_name) {
                    self.terminate(ConversationOutcome::Failure(FailureReason::ToolFailed {
                        tool: tool_name.to_string(),
                        kind: *kind,
                        reason: reason.clone(),
                    }));
                }
            }
        }
    }

    fn check_termination(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        if self.state.requirements_met() {
            self.terminate(ConversationOutcome::Success);
        } else if self.state.round >= self.state.max_rounds {
            let outstanding = self.state.outstanding();
            self.terminate(ConversationOutcome::Incomplete { outstanding });
        }
    }

    fn terminate(&mut self, outcome: ConversationOutcome) {
        if self.state.is_terminal() {
            return;
        }
        info!(round = self.state.round, outcome = ?outcome, "Conversation terminated");
        self.state.terminate(outcome);
    }

    fn into_report(self) -> ConversationReport {
        let outcome = self
            .state
            .outcome()
            .cloned()
            .unwrap_or(ConversationOutcome::Failure(FailureReason::Cancelled));

        ConversationReport {
            outcome,
            rounds: self.state.round,
            decision: self.state.decision,
            required_calls: self.state.required_calls,
            satisfied_calls: self.state.satisfied_calls,
            transcript: self.transcript,
            tool_calls: self.intents.records(),
        }
    }
}
