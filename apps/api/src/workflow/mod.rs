//! Screening workflow: request form → case → conversation → HTTP result.

pub mod case;
pub mod controller;
pub mod handlers;
pub mod prompts;
pub mod resume;

pub use controller::WorkflowController;
