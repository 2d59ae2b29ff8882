//! Tool Registry: name → (schema, handler) mapping with validation and dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::tools::{ToolError, ToolHandler, ToolOutcome, ToolSchema};

/// A registered tool entry.
#[derive(Clone)]
pub struct RegisteredTool {
    pub schema: ToolSchema,
    pub handler: Arc<dyn ToolHandler>,
}

/// Per-conversation tool registry. Built once by the workflow controller,
/// read-only while the conversation runs.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, RegisteredTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        schema: ToolSchema,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<(), ToolError> {
        if self.tools.contains_key(&schema.name) {
            return Err(ToolError::AlreadyRegistered(schema.name));
        }

        tracing::debug!(tool_name = %schema.name, "Tool registered");
        self.tools
            .insert(schema.name.clone(), RegisteredTool { schema, handler });
        Ok(())
    }

    #[must_use]
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn schema(&self, name: &str) -> Result<&ToolSchema, ToolError> {
        self.tools
            .get(name)
            .map(|t| &t.schema)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))
    }

    /// Validates arguments against the named tool's schema and hands them back on success.
    pub fn validate(&self, name: &str, arguments: Value) -> Result<Value, ToolError> {
        let schema = self.schema(name)?;
        schema
            .check(&arguments)
            .map_err(|message| ToolError::Validation {
                tool: name.to_string(),
                message,
            })?;
        Ok(arguments)
    }

    /// Runs the named tool. Callers validate first; dispatch only resolves the handler.
    pub async fn dispatch(&self, name: &str, arguments: &Value) -> Result<ToolOutcome, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        let outcome = tool.handler.call(arguments).await;
        tracing::info!(
            tool_name = %name,
            succeeded = outcome.is_success(),
            "Tool dispatched"
        );
        Ok(outcome)
    }
}
