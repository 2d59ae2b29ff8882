//! Recording fakes for the mail and meeting transports.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::side_effects::mail::{Email, MailError, MailTransport};
use crate::side_effects::meetings::{
    AccessToken, Meeting, MeetingError, MeetingRequest, MeetingService,
};

/// Records every delivered email; optionally fails the first `n` sends.
#[derive(Default)]
pub struct RecordingMailer {
    fail_first: u32,
    calls: AtomicU32,
    sent: Mutex<Vec<Email>>,
}

impl RecordingMailer {
    pub fn failing_first(n: u32) -> Self {
        Self {
            fail_first: n,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MailTransport for RecordingMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if !email.to.contains('@') {
            return Err(MailError::InvalidMessage(format!("bad address {}", email.to)));
        }
        if call <= self.fail_first {
            return Err(MailError::Transport("connection refused".to_string()));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// In-memory meeting service issuing numbered tokens.
#[derive(Default)]
pub struct FakeMeetings {
    credential_failures: u32,
    creation_failures: u32,
    unconfirmed: bool,
    credential_calls: AtomicU32,
    creation_calls: AtomicU32,
    requests: Mutex<Vec<MeetingRequest>>,
    tokens: Mutex<Vec<String>>,
}

impl FakeMeetings {
    pub fn credential_failures(n: u32) -> Self {
        Self {
            credential_failures: n,
            ..Default::default()
        }
    }

    pub fn creation_failures(n: u32) -> Self {
        Self {
            creation_failures: n,
            ..Default::default()
        }
    }

    /// Every creation is accepted but its response is lost.
    pub fn unconfirmed() -> Self {
        Self {
            unconfirmed: true,
            ..Default::default()
        }
    }

    pub fn credential_calls(&self) -> u32 {
        self.credential_calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<MeetingRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn tokens_used(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }
}

#[async_trait]
impl MeetingService for FakeMeetings {
    async fn acquire_credential(&self) -> Result<AccessToken, MeetingError> {
        let call = self.credential_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.credential_failures {
            return Err(MeetingError::Credential("invalid_client".to_string()));
        }
        Ok(AccessToken(format!("token-{call}")))
    }

    async fn create_meeting(
        &self,
        token: &AccessToken,
        request: &MeetingRequest,
    ) -> Result<Meeting, MeetingError> {
        let call = self.creation_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().unwrap().push(request.clone());
        self.tokens.lock().unwrap().push(token.0.clone());
        if call <= self.creation_failures {
            return Err(MeetingError::Creation("status 401: token expired".to_string()));
        }
        if self.unconfirmed {
            return Err(MeetingError::Unconfirmed("operation timed out".to_string()));
        }
        Ok(Meeting {
            join_url: format!("https://meet.example/j/{call}"),
            password: format!("pass{call}"),
        })
    }
}
