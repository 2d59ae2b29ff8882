// Shared prompt constants and prompt-building utilities.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Appended to every actor system prompt that is offered tools.
pub const NATIVE_TOOL_INSTRUCTION: &str = "\
    All actions MUST be taken through native tool calls. \
    Do NOT write code, pseudo-code, or JSON that describes a call instead of making it. \
    Make at most one tool call per reply. \
    If a previous call returned a validation error, correct the arguments and call again.";

/// Appended to every actor system prompt.
pub const TRANSCRIPT_INSTRUCTION: &str = "\
    You are one participant in a recorded multi-party conversation. \
    The transcript so far is given as the user message, one turn per line block. \
    Reply with your single next turn only. Do NOT speak for other participants.";
