use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub zoom_account_id: String,
    pub zoom_client_id: String,
    pub zoom_client_secret: String,
    pub zoom_oauth_url: String,
    pub zoom_api_base: String,
    /// Address that receives evaluation summaries and interview invitations.
    pub reviewer_email: String,
    /// Optional file holding the job description; the built-in one is used otherwise.
    pub job_description_path: Option<PathBuf>,
    pub upload_dir: PathBuf,
    pub max_rounds: u32,
    pub actor_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            smtp_host: optional_env("SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".to_string()),
            smtp_port: parse_env("SMTP_PORT", 587)?,
            smtp_username: require_env("SMTP_USERNAME")?,
            smtp_password: require_env("SMTP_PASSWORD")?,
            zoom_account_id: require_env("ZOOM_ACCOUNT_ID")?,
            zoom_client_id: require_env("ZOOM_CLIENT_ID")?,
            zoom_client_secret: require_env("ZOOM_CLIENT_SECRET")?,
            zoom_oauth_url: optional_env("ZOOM_OAUTH_URL")
                .unwrap_or_else(|| "https://zoom.us/oauth/token".to_string()),
            zoom_api_base: optional_env("ZOOM_API_BASE")
                .unwrap_or_else(|| "https://api.zoom.us/v2".to_string()),
            reviewer_email: require_env("REVIEWER_EMAIL")?,
            job_description_path: optional_env("JOB_DESCRIPTION_PATH").map(PathBuf::from),
            upload_dir: optional_env("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("uploads")),
            max_rounds: parse_env("MAX_ROUNDS", 10)?,
            actor_timeout: Duration::from_secs(parse_env("ACTOR_TIMEOUT_SECS", 30)?),
            port: parse_env("PORT", 1122)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Configuration with placeholder credentials, for tests that never reach the network.
    pub fn for_tests() -> Self {
        Config {
            anthropic_api_key: "test-key".to_string(),
            smtp_host: "localhost".to_string(),
            smtp_port: 2525,
            smtp_username: "scheduler@example.com".to_string(),
            smtp_password: "secret".to_string(),
            zoom_account_id: "account".to_string(),
            zoom_client_id: "client".to_string(),
            zoom_client_secret: "client-secret".to_string(),
            zoom_oauth_url: "http://127.0.0.1:9/oauth/token".to_string(),
            zoom_api_base: "http://127.0.0.1:9/v2".to_string(),
            reviewer_email: "reviewer@example.com".to_string(),
            job_description_path: None,
            upload_dir: std::env::temp_dir(),
            max_rounds: 10,
            actor_timeout: Duration::from_secs(30),
            port: 0,
            rust_log: "info".to_string(),
        }
    }
}
