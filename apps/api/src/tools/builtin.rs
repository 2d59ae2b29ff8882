//! The workflow's two tools, backed by the conversation's `SideEffectExecutor`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::side_effects::executor::BookingRequest;
use crate::side_effects::{Attempted, SideEffectExecutor, SideEffectFailure};
use crate::tools::{
    ParamKind, ToolError, ToolHandler, ToolOutcome, ToolRegistry, ToolSchema, BOOK_MEETING,
    NOTIFY,
};

pub fn notify_schema() -> ToolSchema {
    ToolSchema::new(NOTIFY, "Send an email with subject and body to a recipient")
        .required("to", ParamKind::String)
        .required("subject", ParamKind::String)
        .required("body", ParamKind::String)
}

pub fn book_meeting_schema() -> ToolSchema {
    ToolSchema::new(
        BOOK_MEETING,
        "Schedules an interview meeting with the candidate and the reviewer, \
         then emails both the meeting link",
    )
    .required("candidate_name", ParamKind::String)
    .required("candidate_email", ParamKind::String)
    .required("reviewer_email", ParamKind::String)
    .required("availability", ParamKind::String)
}

/// Registers `notify` and `book_meeting` on `registry`.
pub fn register_workflow_tools(
    registry: &mut ToolRegistry,
    executor: Arc<SideEffectExecutor>,
) -> Result<(), ToolError> {
    registry.register(
        notify_schema(),
        Arc::new(NotifyTool {
            executor: executor.clone(),
        }),
    )?;
    registry.register(book_meeting_schema(), Arc::new(BookMeetingTool { executor }))?;
    Ok(())
}

pub struct NotifyTool {
    executor: Arc<SideEffectExecutor>,
}

#[async_trait]
impl ToolHandler for NotifyTool {
    async fn call(&self, arguments: &Value) -> ToolOutcome {
        let outcome = self
            .executor
            .notify(
                str_arg(arguments, "to"),
                str_arg(arguments, "subject"),
                str_arg(arguments, "body"),
            )
            .await;
        to_tool_outcome(outcome)
    }
}

pub struct BookMeetingTool {
    executor: Arc<SideEffectExecutor>,
}

#[async_trait]
impl ToolHandler for BookMeetingTool {
    async fn call(&self, arguments: &Value) -> ToolOutcome {
        let request = BookingRequest {
            candidate_name: str_arg(arguments, "candidate_name").to_string(),
            candidate_email: str_arg(arguments, "candidate_email").to_string(),
            reviewer_email: str_arg(arguments, "reviewer_email").to_string(),
            availability: str_arg(arguments, "availability").to_string(),
        };
        to_tool_outcome(self.executor.book_meeting(&request).await)
    }
}

// Arguments are schema-checked before dispatch, so required strings are present.
fn str_arg<'a>(arguments: &'a Value, field: &str) -> &'a str {
    arguments.get(field).and_then(Value::as_str).unwrap_or_default()
}

fn to_tool_outcome<T>(outcome: Result<T, SideEffectFailure>) -> ToolOutcome
where
    T: serde::Serialize + Attempted,
{
    match outcome {
        Ok(value) => ToolOutcome::Succeeded {
            attempts: value.attempts(),
            detail: serde_json::to_value(value).unwrap_or(Value::Null),
        },
        Err(failure) => ToolOutcome::Failed {
            kind: failure.kind,
            reason: failure.reason,
            attempts: failure.attempts,
        },
    }
}
