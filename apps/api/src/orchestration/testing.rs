//! Scripted reasoning backend for conversation tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::orchestration::actor::{Actor, Role};
use crate::orchestration::reasoner::{Reasoner, ReasoningError, Reply};
use crate::orchestration::transcript::Transcript;
use crate::tools::ToolSchema;

const IDLE_REPLY: &str = "Nothing further from me.";

/// Replies from a per-role queue; an empty queue yields an idle message.
#[derive(Default)]
pub struct ScriptedReasoner {
    scripts: Mutex<HashMap<Role, VecDeque<Reply>>>,
    stalled: HashSet<Role>,
    offered: Mutex<HashMap<Role, Vec<Vec<String>>>>,
    calls: Mutex<u32>,
}

impl ScriptedReasoner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(self, role: Role, reply: Reply) -> Self {
        self.push(role, reply);
        self
    }

    /// Turns for `role` never complete.
    pub fn stalling(mut self, role: Role) -> Self {
        self.stalled.insert(role);
        self
    }

    pub fn push(&self, role: Role, reply: Reply) {
        self.scripts
            .lock()
            .unwrap()
            .entry(role)
            .or_default()
            .push_back(reply);
    }

    /// Tool names offered on each call made for `role`.
    pub fn offered_tools(&self, role: Role) -> Vec<Vec<String>> {
        self.offered
            .lock()
            .unwrap()
            .get(&role)
            .cloned()
            .unwrap_or_default()
    }

    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl Reasoner for ScriptedReasoner {
    async fn next_turn(
        &self,
        actor: &Actor,
        _transcript: &Transcript,
        tools: &[ToolSchema],
    ) -> Result<Reply, ReasoningError> {
        *self.calls.lock().unwrap() += 1;
        self.offered
            .lock()
            .unwrap()
            .entry(actor.role)
            .or_default()
            .push(tools.iter().map(|t| t.name.clone()).collect());

        if self.stalled.contains(&actor.role) {
            std::future::pending::<()>().await;
        }

        let next = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&actor.role)
            .and_then(VecDeque::pop_front);
        Ok(next.unwrap_or_else(|| Reply::message(IDLE_REPLY)))
    }
}
