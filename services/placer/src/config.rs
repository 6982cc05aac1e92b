//! Configuration for the placer.
//!
//! Handles:
//! - Application (registered-app) credentials for the token endpoint
//! - The account pool, in priority order
//! - The image anchor and pacing policy
//! - Remote endpoints and per-call timeouts

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use pixfleet_canvas::CanvasPoint;
use serde::{Deserialize, Serialize};

use crate::error::PlacerError;
use crate::scheduler::SchedulerConfig;

/// Default configuration file name.
pub const CONFIG_FILE: &str = "config.json";

const DEFAULT_TOKEN_URL: &str = "https://ssl.reddit.com/api/v1/access_token";
const DEFAULT_WRITE_URL: &str = "https://gql-realtime-2.reddit.com/query";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/15.4 Safari/605.1.15";

/// Placer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Registered-app credentials used for HTTP Basic auth on token requests.
    pub client: AppCredentials,

    /// Accounts in priority order.
    pub accounts: Vec<AccountCredentials>,

    /// Canvas x of the target image's top-left corner.
    #[serde(alias = "X")]
    pub x: i64,

    /// Canvas y of the target image's top-left corner.
    #[serde(alias = "Y")]
    pub y: i64,

    /// Base delay between updates, in seconds.
    #[serde(default, alias = "SleepSeconds")]
    pub sleep_seconds: u64,

    /// Upper bound (exclusive) of the random delay added to each pause.
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,

    /// Pause after a successful write.
    #[serde(default = "default_post_write_pause_ms")]
    pub post_write_pause_ms: u64,

    /// Timeout for each outbound HTTP call.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// How long an account sits out after a failed token request.
    #[serde(default = "default_auth_backoff_secs")]
    pub auth_backoff_secs: u64,

    /// OAuth2 token endpoint.
    #[serde(default = "default_token_url")]
    pub token_url: String,

    /// Pixel write endpoint.
    #[serde(default = "default_write_url")]
    pub write_url: String,

    /// User-Agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_jitter_ms() -> u64 {
    1500
}

fn default_post_write_pause_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_auth_backoff_secs() -> u64 {
    300
}

fn default_token_url() -> String {
    std::env::var("PIXFLEET_TOKEN_URL").unwrap_or_else(|_| DEFAULT_TOKEN_URL.to_string())
}

fn default_write_url() -> String {
    std::env::var("PIXFLEET_WRITE_URL").unwrap_or_else(|_| DEFAULT_WRITE_URL.to_string())
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Config {
    /// Load and validate config from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;

        Self::parse(&contents).with_context(|| format!("Invalid config in {:?}", path))
    }

    /// Parse and validate config from a JSON string.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(contents).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the scheduler relies on.
    pub fn validate(&self) -> Result<(), PlacerError> {
        if self.client.client_id.trim().is_empty() {
            return Err(PlacerError::Config("client id is empty".to_string()));
        }

        if self.accounts.is_empty() {
            return Err(PlacerError::Config(
                "at least one account is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for account in &self.accounts {
            if account.username.trim().is_empty() {
                return Err(PlacerError::Config("account username is empty".to_string()));
            }
            if !seen.insert(account.username.as_str()) {
                return Err(PlacerError::Config(format!(
                    "duplicate account: {}",
                    account.username
                )));
            }
        }

        Ok(())
    }

    /// Top-left corner of the target image on the canvas.
    pub fn anchor(&self) -> CanvasPoint {
        CanvasPoint::new(self.x, self.y)
    }

    /// Timeout applied to every outbound call.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Pacing and backoff policy for the scheduler.
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            base_delay: Duration::from_secs(self.sleep_seconds),
            jitter: Duration::from_millis(self.jitter_ms),
            post_write_pause: Duration::from_millis(self.post_write_pause_ms),
            auth_backoff: Duration::from_secs(self.auth_backoff_secs),
        }
    }
}

/// Registered-app credentials, distinct from any account's login.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppCredentials {
    #[serde(alias = "clientID")]
    pub client_id: String,

    #[serde(alias = "clientSecret")]
    pub client_secret: String,
}

impl fmt::Debug for AppCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Login for one account.
#[derive(Clone, Serialize, Deserialize)]
pub struct AccountCredentials {
    pub username: String,
    pub password: String,
}

impl AccountCredentials {
    /// Create new credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for AccountCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
