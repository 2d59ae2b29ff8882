use std::sync::Arc;

use crate::config::Config;
use crate::workflow::WorkflowController;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Loaded once at startup; every case is evaluated against it.
    pub job_description: Arc<str>,
    pub workflow: Arc<WorkflowController>,
}

#[cfg(test)]
impl AppState {
    pub fn for_tests(
        reasoner: Arc<dyn crate::orchestration::Reasoner>,
        mailer: Arc<dyn crate::side_effects::mail::MailTransport>,
        meetings: Arc<dyn crate::side_effects::meetings::MeetingService>,
    ) -> Self {
        let config = Config::for_tests();
        let workflow = WorkflowController::new(
            reasoner,
            mailer,
            meetings,
            config.reviewer_email.clone(),
            config.max_rounds,
            config.actor_timeout,
        );
        Self {
            config,
            job_description: Arc::from(crate::workflow::case::DEFAULT_JOB_DESCRIPTION),
            workflow: Arc::new(workflow),
        }
    }
}
