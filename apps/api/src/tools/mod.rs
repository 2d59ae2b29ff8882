//! Tool layer: named, schema-checked side-effecting operations that actors may request.
//!
//! The registry owns the name → handler mapping; `builtin` wires the two workflow
//! tools (`notify`, `book_meeting`) onto the per-conversation `SideEffectExecutor`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::side_effects::FailureKind;

pub mod builtin;
pub mod registry;
pub mod schema;

pub use registry::ToolRegistry;
pub use schema::{ParamKind, ToolSchema};

/// Sends one email through the executor.
pub const NOTIFY: &str = "notify";
/// Books an interview meeting and mails both parties.
pub const BOOK_MEETING: &str = "book_meeting";

/// Result of one tool call as recorded in the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolOutcome {
    Succeeded {
        detail: Value,
        attempts: u32,
    },
    Failed {
        kind: FailureKind,
        reason: String,
        attempts: u32,
    },
    ValidationError {
        message: String,
    },
}

impl ToolOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ToolOutcome::Succeeded { .. })
    }

    /// Calls made against the external service; rejected requests never reach it.
    pub fn attempts(&self) -> u32 {
        match self {
            ToolOutcome::Succeeded { attempts, .. } | ToolOutcome::Failed { attempts, .. } => {
                *attempts
            }
            ToolOutcome::ValidationError { .. } => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Invalid arguments for '{tool}': {message}")]
    Validation { tool: String, message: String },
}

/// A callable side-effecting operation. Arguments have already passed schema validation.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, arguments: &Value) -> ToolOutcome;
}
