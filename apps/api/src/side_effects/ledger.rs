//! Idempotency ledger: one record per logical side effect within a conversation.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Pending,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SideEffectRecord {
    pub tool_name: String,
    pub argument_hash: String,
    pub status: RecordStatus,
    pub attempts: u32,
}

/// Stable identifier of one logical side effect.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdempotencyKey {
    pub tool_name: String,
    pub argument_hash: String,
}

impl IdempotencyKey {
    /// Key for an actor's tool call: actor + tool + hash of the canonical JSON arguments.
    /// `serde_json` maps are key-sorted, so field order in the request does not matter.
    pub fn for_intent(actor: &str, tool_name: &str, arguments: &Value) -> Self {
        let canonical = arguments.to_string();
        Self {
            tool_name: tool_name.to_string(),
            argument_hash: digest(&[actor, tool_name, &canonical]),
        }
    }

    /// Key for a single email delivery.
    pub fn for_delivery(recipient: &str, subject: &str, body: &str) -> Self {
        Self {
            tool_name: crate::tools::NOTIFY.to_string(),
            argument_hash: digest(&[recipient, subject, body]),
        }
    }
}

fn digest(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        // separator keeps ("ab", "c") and ("a", "bc") apart
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

struct Entry<O> {
    record: SideEffectRecord,
    outcome: Option<O>,
}

/// Records side effects and the outcome each one produced.
pub struct Ledger<O> {
    entries: HashMap<IdempotencyKey, Entry<O>>,
}

impl<O: Clone> Default for Ledger<O> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<O: Clone> Ledger<O> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The outcome recorded for `key`, if that side effect already finished.
    pub fn recorded(&self, key: &IdempotencyKey) -> Option<O> {
        self.entries.get(key).and_then(|e| e.outcome.clone())
    }

    /// Marks `key` as in flight.
    pub fn begin(&mut self, key: &IdempotencyKey) {
        self.entries.entry(key.clone()).or_insert_with(|| Entry {
            record: SideEffectRecord {
                tool_name: key.tool_name.clone(),
                argument_hash: key.argument_hash.clone(),
                status: RecordStatus::Pending,
                attempts: 0,
            },
            outcome: None,
        });
    }

    pub fn complete(&mut self, key: &IdempotencyKey, succeeded: bool, attempts: u32, outcome: O) {
        self.begin(key);
        if let Some(entry) = self.entries.get_mut(key) {
            entry.record.status = if succeeded {
                RecordStatus::Succeeded
            } else {
                RecordStatus::Failed
            };
            entry.record.attempts = attempts;
            entry.outcome = Some(outcome);
        }
    }

    pub fn records(&self) -> Vec<SideEffectRecord> {
        self.entries.values().map(|e| e.record.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_intent_key_ignores_field_order() {
        let a = IdempotencyKey::for_intent("Evaluator", "notify", &json!({"to": "x", "body": "y"}));
        let b = IdempotencyKey::for_intent("Evaluator", "notify", &json!({"body": "y", "to": "x"}));
        assert_eq!(a, b);
    }

    #[test]
    fn test_intent_key_depends_on_actor() {
        let args = json!({"to": "x"});
        let a = IdempotencyKey::for_intent("Evaluator", "notify", &args);
        let b = IdempotencyKey::for_intent("Coordinator", "notify", &args);
        assert_ne!(a, b);
    }

    #[test]
    fn test_delivery_key_separates_fields() {
        let a = IdempotencyKey::for_delivery("ab", "c", "d");
        let b = IdempotencyKey::for_delivery("a", "bc", "d");
        assert_ne!(a, b);
    }

    #[test]
    fn test_pending_record_has_no_outcome() {
        let mut ledger: Ledger<u32> = Ledger::new();
        let key = IdempotencyKey::for_delivery("a", "b", "c");
        ledger.begin(&key);
        assert_eq!(ledger.records()[0].status, RecordStatus::Pending);
        assert_eq!(ledger.recorded(&key), None);
    }

    #[test]
    fn test_complete_records_status_attempts_and_outcome() {
        let mut ledger: Ledger<&str> = Ledger::new();
        let key = IdempotencyKey::for_delivery("a", "b", "c");
        ledger.begin(&key);
        ledger.complete(&key, false, 3, "relay down");

        let records = ledger.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, RecordStatus::Failed);
        assert_eq!(records[0].attempts, 3);
        assert_eq!(ledger.recorded(&key), Some("relay down"));
    }
}
