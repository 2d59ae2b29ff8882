//! Multi-actor conversation: actors take turns in a fixed rotation, request tools,
//! and the orchestrator decides when the run is done.
//!
//! Layering:
//! - `transcript`: append-only turn log, decision detection
//! - `actor`: actor identities and the per-actor runtime (timeouts, closing turns)
//! - `reasoner`: reasoning backends (LLM, deterministic progress reporter)
//! - `state`: required calls, outcomes, terminal states
//! - `orchestrator`: the round loop, tool admission, dedupe, loop guard

pub mod actor;
pub mod orchestrator;
pub mod prompts;
pub mod reasoner;
pub mod state;
pub mod transcript;

#[cfg(test)]
pub mod testing;

pub use actor::{Actor, ActorRuntime, Role};
pub use orchestrator::{ConversationReport, Orchestrator, OrchestratorError};
pub use reasoner::{LlmReasoner, ProgressReasoner, Reasoner, Reply};
pub use state::{ConversationOutcome, FailureReason, DEFAULT_MAX_ROUNDS};
pub use transcript::{Decision, Transcript, Turn};
