//! Meeting service client: Zoom server-to-server OAuth, then meeting creation.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;

/// Minutes between booking and the meeting start.
pub const START_OFFSET_MINUTES: i64 = 10;
/// Meeting length in minutes.
pub const DURATION_MINUTES: u32 = 30;
const SCHEDULED_MEETING: u8 = 2;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeetingError {
    #[error("credential exchange failed: {0}")]
    Credential(String),

    #[error("meeting creation failed: {0}")]
    Creation(String),

    /// The request may have reached the service but its result is unknown, so the
    /// meeting may exist. Retrying could book it twice.
    #[error("meeting creation unconfirmed: {0}")]
    Unconfirmed(String),
}

/// Short-lived bearer token issued by the meeting service.
#[derive(Clone)]
pub struct AccessToken(pub String);

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeetingSettings {
    pub host_video: bool,
    pub participant_video: bool,
    pub join_before_host: bool,
    pub mute_upon_entry: bool,
    pub auto_recording: String,
}

/// Body of the meeting-creation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeetingRequest {
    pub topic: String,
    #[serde(rename = "type")]
    pub meeting_type: u8,
    /// `%Y-%m-%dT%H:%M:%SZ`
    pub start_time: String,
    pub duration: u32,
    pub timezone: String,
    pub agenda: String,
    pub settings: MeetingSettings,
}

impl MeetingRequest {
    /// A 30-minute UTC interview starting ten minutes after `now`.
    pub fn interview(candidate_name: &str, now: DateTime<Utc>) -> Self {
        let start = now + Duration::minutes(START_OFFSET_MINUTES);
        Self {
            topic: format!("Interview: {candidate_name}"),
            meeting_type: SCHEDULED_MEETING,
            start_time: start.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            duration: DURATION_MINUTES,
            timezone: "UTC".to_string(),
            agenda: "Auto-generated interview".to_string(),
            settings: MeetingSettings {
                host_video: true,
                participant_video: true,
                join_before_host: false,
                mute_upon_entry: true,
                auto_recording: "cloud".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Meeting {
    pub join_url: String,
    pub password: String,
}

/// The two-step meeting service contract.
#[async_trait]
pub trait MeetingService: Send + Sync {
    async fn acquire_credential(&self) -> Result<AccessToken, MeetingError>;

    async fn create_meeting(
        &self,
        token: &AccessToken,
        request: &MeetingRequest,
    ) -> Result<Meeting, MeetingError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// Zoom REST client using account-credentials OAuth.
#[derive(Clone)]
pub struct ZoomClient {
    client: Client,
    oauth_url: String,
    api_base: String,
    account_id: String,
    client_id: String,
    client_secret: String,
}

impl ZoomClient {
    pub fn from_config(config: &Config) -> reqwest::Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()?,
            oauth_url: config.zoom_oauth_url.clone(),
            api_base: config.zoom_api_base.trim_end_matches('/').to_string(),
            account_id: config.zoom_account_id.clone(),
            client_id: config.zoom_client_id.clone(),
            client_secret: config.zoom_client_secret.clone(),
        })
    }
}

#[async_trait]
impl MeetingService for ZoomClient {
    async fn acquire_credential(&self) -> Result<AccessToken, MeetingError> {
        let response = self
            .client
            .post(&self.oauth_url)
            .query(&[
                ("grant_type", "account_credentials"),
                ("account_id", self.account_id.as_str()),
            ])
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .header("content-type", "application/x-www-form-urlencoded")
            .send()
            .await
            .map_err(|e| MeetingError::Credential(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| MeetingError::Credential(e.to_string()))?;

        if !status.is_success() {
            warn!("Token endpoint returned {}: {}", status, body);
            return Err(MeetingError::Credential(format!("status {status}: {body}")));
        }

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| MeetingError::Credential(format!("unreadable token response: {e}")))?;

        match parsed.access_token {
            Some(token) if !token.is_empty() => {
                debug!("Meeting service access token acquired");
                Ok(AccessToken(token))
            }
            _ => Err(MeetingError::Credential(format!(
                "no access_token in response: {body}"
            ))),
        }
    }

    async fn create_meeting(
        &self,
        token: &AccessToken,
        request: &MeetingRequest,
    ) -> Result<Meeting, MeetingError> {
        let response = self
            .client
            .post(format!("{}/users/me/meetings", self.api_base))
            .bearer_auth(&token.0)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    MeetingError::Creation(e.to_string())
                } else {
                    MeetingError::Unconfirmed(e.to_string())
                }
            })?;

        let status = response.status();
        if status != StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            warn!("Meeting creation returned {}: {}", status, body);
            return Err(MeetingError::Creation(format!("status {status}: {body}")));
        }

        response.json::<Meeting>().await.map_err(|e| {
            warn!("Meeting created but the response was unreadable: {e}");
            MeetingError::Unconfirmed(format!("unreadable meeting response: {e}"))
        })
    }
}
