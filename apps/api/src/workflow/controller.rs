//! WorkflowController: turns one screening request into one orchestrated conversation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::orchestration::{
    Actor, ActorRuntime, ConversationOutcome, ConversationReport, Decision, Orchestrator,
    ProgressReasoner, Reasoner,
};
use crate::side_effects::ledger::SideEffectRecord;
use crate::side_effects::mail::MailTransport;
use crate::side_effects::meetings::MeetingService;
use crate::side_effects::{RetryPolicy, SideEffectExecutor};
use crate::tools::builtin::register_workflow_tools;
use crate::tools::ToolRegistry;
use crate::workflow::case::{Case, CANDIDATE_QUESTIONS};
use crate::workflow::prompts::{CASE_SEED_TEMPLATE, NO_RESUME};

/// Long-lived collaborators shared by every conversation. Everything stateful
/// (registry, executor, ledgers, transcript) is built fresh per run.
pub struct WorkflowController {
    reasoner: Arc<dyn Reasoner>,
    mailer: Arc<dyn MailTransport>,
    meetings: Arc<dyn MeetingService>,
    retry: RetryPolicy,
    reviewer_email: String,
    max_rounds: u32,
    actor_timeout: Duration,
}

/// Body of a 200 from `POST /scheduler`.
#[derive(Debug, Serialize)]
pub struct SchedulerResponse {
    pub status: &'static str,
    pub message: String,
    pub conversation_id: Uuid,
    pub partial: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub outstanding: Vec<String>,
    pub decision: Option<Decision>,
    pub rounds: u32,
    pub tool_calls: Vec<SideEffectRecord>,
}

impl WorkflowController {
    pub fn new(
        reasoner: Arc<dyn Reasoner>,
        mailer: Arc<dyn MailTransport>,
        meetings: Arc<dyn MeetingService>,
        reviewer_email: String,
        max_rounds: u32,
        actor_timeout: Duration,
    ) -> Self {
        Self {
            reasoner,
            mailer,
            meetings,
            retry: RetryPolicy::default(),
            reviewer_email,
            max_rounds,
            actor_timeout,
        }
    }

    /// Runs the conversation for `case` in its own task.
    ///
    /// If the caller stops waiting (the request future is dropped) the run is cancelled
    /// at the next turn boundary.
    pub async fn run(&self, case: Case) -> Result<(Uuid, ConversationReport)> {
        let conversation_id = Uuid::new_v4();
        let span = info_span!("conversation", %conversation_id);
        let orchestrator = span.in_scope(|| self.build_orchestrator(&case))?;

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(orchestrator.run(cancel.clone()).instrument(span.clone()));
        let _guard = cancel.drop_guard();

        let report = handle.await.context("Conversation task panicked")?;
        span.in_scope(|| {
            info!(
                rounds = report.rounds,
                outcome = ?report.outcome,
                "Conversation finished"
            )
        });
        Ok((conversation_id, report))
    }

    fn build_orchestrator(&self, case: &Case) -> Result<Orchestrator> {
        let executor = Arc::new(SideEffectExecutor::new(
            self.mailer.clone(),
            self.meetings.clone(),
            self.retry,
        ));
        let mut registry = ToolRegistry::new();
        register_workflow_tools(&mut registry, executor)?;

        let coordinator: Arc<dyn Reasoner> = Arc::new(ProgressReasoner);
        let runtimes = [
            (Actor::evaluator(), self.reasoner.clone()),
            (Actor::scheduler(), self.reasoner.clone()),
            (Actor::coordinator(), coordinator),
        ]
        .into_iter()
        .map(|(actor, reasoner)| ActorRuntime::new(actor, reasoner, &registry, self.actor_timeout))
        .collect::<Result<Vec<_>, _>>()?;

        let orchestrator =
            Orchestrator::new(runtimes, registry, self.seed_message(case), self.max_rounds)?;
        Ok(orchestrator)
    }

    /// The Coordinator's opening message: instructions plus the full case.
    pub fn seed_message(&self, case: &Case) -> String {
        let answers = CANDIDATE_QUESTIONS
            .iter()
            .map(|(id, question)| format!("- {question}\n  {}", case.answer(id)))
            .collect::<Vec<_>>()
            .join("\n");
        let resume = if case.resume_text.trim().is_empty() {
            NO_RESUME
        } else {
            case.resume_text.as_str()
        };

        fill_template(
            CASE_SEED_TEMPLATE,
            &[
                ("reviewer_email", &self.reviewer_email),
                ("job_description", case.job_description.trim()),
                ("resume_text", resume),
                ("answers", &answers),
            ],
        )
    }
}

/// Replaces `{name}` placeholders in one pass over `template`. Substituted text is
/// never scanned again, so braces inside values are kept as written. Unknown
/// placeholders are left alone.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Maps a finished conversation onto the HTTP result.
pub fn to_response(
    conversation_id: Uuid,
    report: ConversationReport,
) -> Result<SchedulerResponse, AppError> {
    let (status, partial, outstanding, message) = match report.outcome {
        ConversationOutcome::Success => {
            let message = match report.decision {
                Some(Decision::NotEligible) => {
                    "Candidate assessed as Not Eligible; evaluation summary sent to the reviewer"
                }
                _ => "Interview scheduled and email is sent",
            };
            ("success", false, Vec::new(), message.to_string())
        }
        ConversationOutcome::Incomplete { outstanding } => {
            let message = format!(
                "Conversation ended after {} rounds with steps outstanding: {}",
                report.rounds,
                outstanding.join(", ")
            );
            ("partial", true, outstanding, message)
        }
        ConversationOutcome::Failure(reason) => {
            return Err(AppError::Workflow {
                tool: reason.tool().map(str::to_string),
                reason: reason.to_string(),
            });
        }
    };

    Ok(SchedulerResponse {
        status,
        message,
        conversation_id,
        partial,
        outstanding,
        decision: report.decision,
        rounds: report.rounds,
        tool_calls: report.tool_calls,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestration::testing::ScriptedReasoner;
    use crate::orchestration::{FailureReason, Role};
    use crate::side_effects::testing::{FakeMeetings, RecordingMailer};
    use crate::side_effects::FailureKind;
    use std::collections::BTreeMap;

    fn case() -> Case {
        let fields: BTreeMap<String, String> = [
            ("name", "Jane Doe"),
            ("experience", "4 years"),
            ("skills", "Python, PySpark"),
            ("roles", "Data Engineer"),
            ("availability", "Mon 10am"),
            ("email", "jane@example.com"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Case::from_answers("Python Developer".into(), String::new(), &fields).unwrap()
    }

    fn controller(reasoner: ScriptedReasoner) -> WorkflowController {
        WorkflowController::new(
            Arc::new(reasoner),
            Arc::new(RecordingMailer::default()),
            Arc::new(FakeMeetings::default()),
            "hr@example.com".to_string(),
            10,
            Duration::from_secs(30),
        )
    }

    fn report(outcome: ConversationOutcome) -> ConversationReport {
        ConversationReport {
            outcome,
            rounds: 4,
            decision: Some(Decision::Eligible),
            required_calls: Default::default(),
            satisfied_calls: Default::default(),
            transcript: Default::default(),
            tool_calls: Vec::new(),
        }
    }

    #[test]
    fn test_seed_message_embeds_case_and_reviewer() {
        let seed = controller(ScriptedReasoner::new()).seed_message(&case());
        assert!(seed.contains("to: hr@example.com"));
        assert!(seed.contains("Python Developer"));
        assert!(seed.contains("- What is your availability for interview?\n  Mon 10am"));
        assert!(seed.contains(NO_RESUME));
        assert!(!seed.contains('{'));
    }

    #[test]
    fn test_seed_message_keeps_placeholders_typed_by_the_candidate() {
        let case = case().with_resume_text("Skills: Rust {answers} and {reviewer_email}".into());
        let seed = controller(ScriptedReasoner::new()).seed_message(&case);

        assert!(seed.contains("Skills: Rust {answers} and {reviewer_email}"));
        assert_eq!(seed.matches("Mon 10am").count(), 1);
        assert_eq!(seed.matches("hr@example.com").count(), 2);
    }

    #[test]
    fn test_fill_template_leaves_unknown_braces() {
        assert_eq!(
            fill_template("{a} {b} {", &[("a", "{b}")]),
            "{b} {b} {"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_reports_incomplete_when_nobody_acts() {
        let (_, report) = controller(ScriptedReasoner::new()).run(case()).await.unwrap();
        assert_eq!(
            report.outcome,
            ConversationOutcome::Incomplete {
                outstanding: vec!["book_meeting".to_string(), "notify".to_string()]
            }
        );
        assert_eq!(report.rounds, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_offers_each_llm_actor_only_its_tools() {
        let reasoner = Arc::new(ScriptedReasoner::new());
        let controller = WorkflowController::new(
            reasoner.clone(),
            Arc::new(RecordingMailer::default()),
            Arc::new(FakeMeetings::default()),
            "hr@example.com".to_string(),
            3,
            Duration::from_secs(30),
        );

        controller.run(case()).await.unwrap();

        assert_eq!(reasoner.offered_tools(Role::Evaluator), vec![vec!["notify".to_string()]]);
        assert_eq!(
            reasoner.offered_tools(Role::Scheduler),
            vec![vec!["book_meeting".to_string()]]
        );
        assert!(reasoner.offered_tools(Role::Coordinator).is_empty());
    }

    #[test]
    fn test_incomplete_maps_to_partial_success() {
        let response = to_response(
            Uuid::nil(),
            report(ConversationOutcome::Incomplete {
                outstanding: vec!["notify".to_string()],
            }),
        )
        .unwrap();
        assert!(response.partial);
        assert_eq!(response.status, "partial");
        assert_eq!(response.outstanding, vec!["notify"]);
    }

    #[test]
    fn test_failure_maps_to_workflow_error_naming_tool() {
        let err = to_response(
            Uuid::nil(),
            report(ConversationOutcome::Failure(FailureReason::ToolFailed {
                tool: "book_meeting".to_string(),
                kind: FailureKind::Credential,
                reason: "invalid_client".to_string(),
            })),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Workflow { tool: Some(ref t), .. } if t == "book_meeting"));
    }
}
