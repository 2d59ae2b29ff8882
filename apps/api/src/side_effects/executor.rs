//! SideEffectExecutor: retrying, idempotent wrapper over the mail and meeting transports.
//!
//! One executor is built per conversation, so its ledger never outlives a request.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::side_effects::ledger::{IdempotencyKey, Ledger};
use crate::side_effects::mail::{Email, MailError, MailTransport};
use crate::side_effects::meetings::{MeetingError, MeetingRequest, MeetingService};
use crate::side_effects::{Attempted, FailureKind, RetryPolicy, SideEffectFailure};

pub const INTERVIEW_SUBJECT: &str = "Interview Schedule";

/// A delivered (or previously delivered) email.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Delivery {
    pub recipient: String,
    pub attempts: u32,
}

impl Attempted for Delivery {
    fn attempts(&self) -> u32 {
        self.attempts
    }
}

pub type NotifyOutcome = Result<Delivery, SideEffectFailure>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvitationStatus {
    pub recipient: String,
    pub delivered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeetingBooking {
    pub meeting_link: String,
    pub passcode: String,
    pub start_time: String,
    pub invitations: Vec<InvitationStatus>,
    /// Booking attempts, each with its own credential exchange.
    pub attempts: u32,
}

impl Attempted for MeetingBooking {
    fn attempts(&self) -> u32 {
        self.attempts
    }
}

pub type BookingOutcome = Result<MeetingBooking, SideEffectFailure>;

#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub candidate_name: String,
    pub candidate_email: String,
    pub reviewer_email: String,
    /// Echoed verbatim into the invitation; never parsed.
    pub availability: String,
}

pub struct SideEffectExecutor {
    mailer: Arc<dyn MailTransport>,
    meetings: Arc<dyn MeetingService>,
    policy: RetryPolicy,
    deliveries: Mutex<Ledger<NotifyOutcome>>,
}

impl SideEffectExecutor {
    pub fn new(
        mailer: Arc<dyn MailTransport>,
        meetings: Arc<dyn MeetingService>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            mailer,
            meetings,
            policy,
            deliveries: Mutex::new(Ledger::new()),
        }
    }

    /// Sends one email, at most once per `(recipient, subject, body)` for this executor.
    /// Transport failures are retried with backoff; the result is always an outcome.
    pub async fn notify(&self, recipient: &str, subject: &str, body: &str) -> NotifyOutcome {
        let key = IdempotencyKey::for_delivery(recipient, subject, body);

        // Held across the send so an identical request waits for the first one's outcome.
        let mut ledger = self.deliveries.lock().await;
        if let Some(previous) = ledger.recorded(&key) {
            info!(recipient = %recipient, "Duplicate notification short-circuited");
            return previous;
        }
        ledger.begin(&key);

        let email = Email {
            to: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        };

        let mut attempts = 0;
        let outcome = loop {
            attempts += 1;
            tokio::time::sleep(self.policy.delay_before(attempts)).await;

            match self.mailer.send(&email).await {
                Ok(()) => {
                    info!(recipient = %recipient, subject = %subject, attempts, "Email sent");
                    break Ok(Delivery {
                        recipient: recipient.to_string(),
                        attempts,
                    });
                }
                Err(MailError::InvalidMessage(reason)) => {
                    warn!(recipient = %recipient, "Email rejected before sending: {reason}");
                    break Err(SideEffectFailure::new(FailureKind::InvalidMessage, reason)
                        .after_attempts(attempts));
                }
                Err(MailError::Transport(reason)) if attempts < self.policy.max_attempts => {
                    warn!(
                        "Email to {} failed (attempt {}/{}): {}, retrying",
                        recipient, attempts, self.policy.max_attempts, reason
                    );
                }
                Err(MailError::Transport(reason)) => {
                    warn!(recipient = %recipient, attempts, "Email delivery gave up: {reason}");
                    break Err(SideEffectFailure::new(
                        FailureKind::Transport,
                        format!("gave up after {attempts} attempts: {reason}"),
                    )
                    .after_attempts(attempts));
                }
            }
        };

        ledger.complete(&key, outcome.is_ok(), attempts, outcome.clone());
        outcome
    }

    /// Books the interview meeting and mails the invitation to candidate and reviewer.
    ///
    /// Every attempt starts with a fresh credential: a stale token is the usual reason
    /// meeting creation fails, so creation is never retried with the old one. An
    /// unconfirmed creation ends the booking at once: the meeting may already exist.
    pub async fn book_meeting(&self, request: &BookingRequest) -> BookingOutcome {
        let mut last_failure = SideEffectFailure::new(FailureKind::Credential, "no attempt made");

        for attempt in 1..=self.policy.max_attempts {
            tokio::time::sleep(self.policy.delay_before(attempt)).await;

            let token = match self.meetings.acquire_credential().await {
                Ok(token) => token,
                Err(e) => {
                    warn!(attempt, "Meeting credential acquisition failed: {e}");
                    last_failure = failure_from(e).after_attempts(attempt);
                    continue;
                }
            };

            let meeting_request = MeetingRequest::interview(&request.candidate_name, Utc::now());
            let meeting = match self.meetings.create_meeting(&token, &meeting_request).await {
                Ok(meeting) => meeting,
                Err(MeetingError::Unconfirmed(reason)) => {
                    warn!(attempt, "Meeting creation unconfirmed, not retrying: {reason}");
                    return Err(SideEffectFailure::new(
                        FailureKind::MeetingCreation,
                        format!("meeting may have been created but was not confirmed: {reason}"),
                    )
                    .after_attempts(attempt));
                }
                Err(e) => {
                    warn!(attempt, "Meeting creation failed: {e}");
                    last_failure = failure_from(e).after_attempts(attempt);
                    continue;
                }
            };

            info!(
                candidate = %request.candidate_name,
                start_time = %meeting_request.start_time,
                "Interview meeting created"
            );

            let body = invitation_body(
                &request.candidate_name,
                &request.availability,
                &meeting.join_url,
                &meeting.password,
            );
            let mut invitations = Vec::with_capacity(2);
            for recipient in [&request.candidate_email, &request.reviewer_email] {
                let status = match self.notify(recipient, INTERVIEW_SUBJECT, &body).await {
                    Ok(_) => InvitationStatus {
                        recipient: recipient.clone(),
                        delivered: true,
                        error: None,
                    },
                    Err(failure) => InvitationStatus {
                        recipient: recipient.clone(),
                        delivered: false,
                        error: Some(failure.reason),
                    },
                };
                invitations.push(status);
            }

            return Ok(MeetingBooking {
                meeting_link: meeting.join_url,
                passcode: meeting.password,
                start_time: meeting_request.start_time,
                invitations,
                attempts: attempt,
            });
        }

        warn!(
            candidate = %request.candidate_name,
            "Interview booking failed after {} attempts: {}",
            self.policy.max_attempts,
            last_failure
        );
        Err(last_failure)
    }
}

fn failure_from(error: MeetingError) -> SideEffectFailure {
    match error {
        MeetingError::Credential(reason) => SideEffectFailure::new(FailureKind::Credential, reason),
        MeetingError::Creation(reason) | MeetingError::Unconfirmed(reason) => {
            SideEffectFailure::new(FailureKind::MeetingCreation, reason)
        }
    }
}

fn invitation_body(candidate_name: &str, availability: &str, link: &str, passcode: &str) -> String {
    format!(
        "Interview scheduled for {candidate_name}\n\
         Time: {availability}\n\
         Link: {link}\n\
         Password: {passcode}\n"
    )
}
