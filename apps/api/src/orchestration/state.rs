//! Conversation state machine data: phase, requirements, and terminal outcomes.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::orchestration::transcript::Decision;
use crate::side_effects::FailureKind;
use crate::tools::{BOOK_MEETING, NOTIFY};

/// Consecutive rejected requests for one tool that end the run.
pub const LOOP_GUARD_LIMIT: u32 = 3;

/// Default round ceiling.
pub const DEFAULT_MAX_ROUNDS: u32 = 10;

/// Calls the conversation must complete given the Evaluator's decision.
/// Until a decision is stated both are required.
pub fn required_calls_for(decision: Option<Decision>) -> BTreeSet<String> {
    match decision {
        Some(Decision::NotEligible) => [NOTIFY].iter().map(|t| t.to_string()).collect(),
        _ => [NOTIFY, BOOK_MEETING].iter().map(|t| t.to_string()).collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FailureReason {
    #[error("tool '{tool}' is not registered")]
    ToolNotFound { tool: String },

    #[error("required tool '{tool}' failed ({kind:?}): {reason}")]
    ToolFailed {
        tool: String,
        kind: FailureKind,
        reason: String,
    },

    #[error("{actor} sent {attempts} consecutive invalid '{tool}' requests")]
    LoopDetected {
        actor: String,
        tool: String,
        attempts: u32,
    },

    #[error("reasoning failed: {message}")]
    Reasoning { actor: String, message: String },

    #[error("conversation cancelled")]
    Cancelled,
}

impl FailureReason {
    /// The tool the failure is attributed to, if any.
    pub fn tool(&self) -> Option<&str> {
        match self {
            FailureReason::ToolNotFound { tool }
            | FailureReason::ToolFailed { tool, .. }
            | FailureReason::LoopDetected { tool, .. } => Some(tool),
            FailureReason::Reasoning { .. } | FailureReason::Cancelled => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConversationOutcome {
    Success,
    Failure(FailureReason),
    /// Round budget exhausted; lists the required calls never satisfied.
    Incomplete { outstanding: Vec<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Running,
    AwaitingToolResult,
    Terminated(ConversationOutcome),
}

#[derive(Debug, Clone)]
pub struct ConversationState {
    pub round: u32,
    pub max_rounds: u32,
    pub required_calls: BTreeSet<String>,
    pub satisfied_calls: BTreeSet<String>,
    pub decision: Option<Decision>,
    pub phase: Phase,
}

impl ConversationState {
    pub fn new(max_rounds: u32) -> Self {
        Self {
            round: 0,
            max_rounds,
            required_calls: required_calls_for(None),
            satisfied_calls: BTreeSet::new(),
            decision: None,
            phase: Phase::Running,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, Phase::Terminated(_))
    }

    pub fn outcome(&self) -> Option<&ConversationOutcome> {
        match &self.phase {
            Phase::Terminated(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Records the first decision; later ones are ignored.
    pub fn latch_decision(&mut self, decision: Decision) -> bool {
        if self.decision.is_some() {
            return false;
        }
        self.decision = Some(decision);
        self.required_calls = required_calls_for(Some(decision));
        true
    }

    pub fn requirements_met(&self) -> bool {
        self.required_calls.is_subset(&self.satisfied_calls)
    }

    pub fn outstanding(&self) -> Vec<String> {
        self.required_calls
            .difference(&self.satisfied_calls)
            .cloned()
            .collect()
    }

    /// Terminal states are absorbing: the first outcome sticks.
    pub fn terminate(&mut self, outcome: ConversationOutcome) {
        if !self.is_terminal() {
            self.phase = Phase::Terminated(outcome);
        }
    }
}
