//! OAuth2 password-grant tokens for pool accounts.
//!
//! Each account owns an [`AuthSession`]. A session starts expired and is
//! refreshed on demand through the shared [`TokenClient`]; a failed refresh
//! leaves the previous (expired) state untouched so the caller never writes
//! with a token known to be stale.

use chrono::{DateTime, TimeDelta, Utc};
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::{AccountCredentials, AppCredentials, Config};
use crate::error::PlacerError;

/// Token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,

    #[serde(default)]
    pub token_type: String,

    /// Lifetime in seconds.
    pub expires_in: i64,

    #[serde(default)]
    pub scope: String,
}

/// Error body some token endpoints return with a 200 status.
#[derive(Debug, Deserialize)]
struct TokenErrorBody {
    error: String,
}

/// Client for the password-grant token endpoint.
#[derive(Debug, Clone)]
pub struct TokenClient {
    client: reqwest::Client,
    token_url: String,
    app: AppCredentials,
    user_agent: String,
}

impl TokenClient {
    /// Create a token client from config.
    pub fn new(config: &Config) -> Result<Self, PlacerError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            token_url: config.token_url.clone(),
            app: config.client.clone(),
            user_agent: config.user_agent.clone(),
        })
    }

    /// Exchange an account's username and password for a bearer token.
    pub async fn request_token(
        &self,
        account: &AccountCredentials,
    ) -> Result<TokenGrant, PlacerError> {
        let form = [
            ("grant_type", "password"),
            ("username", account.username.as_str()),
            ("password", account.password.as_str()),
        ];

        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(&self.app.client_id, Some(&self.app.client_secret))
            .header(USER_AGENT, &self.user_agent)
            .form(&form)
            .send()
            .await
            .map_err(|e| PlacerError::auth(&account.username, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PlacerError::auth(&account.username, e.to_string()))?;

        if !status.is_success() {
            return Err(PlacerError::auth(
                &account.username,
                format!("HTTP {}: {}", status.as_u16(), body),
            ));
        }

        serde_json::from_str::<TokenGrant>(&body).map_err(|e| {
            let message = match serde_json::from_str::<TokenErrorBody>(&body) {
                Ok(rejection) => format!("rejected: {}", rejection.error),
                Err(_) => format!("malformed token response: {}", e),
            };
            PlacerError::auth(&account.username, message)
        })
    }
}

/// Bearer token and its expiry for one account.
#[derive(Debug, Clone)]
pub struct AuthSession {
    token: String,
    expires_at: DateTime<Utc>,
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthSession {
    /// Create a session with no token.
    pub fn new() -> Self {
        Self {
            token: String::new(),
            expires_at: DateTime::<Utc>::MIN_UTC,
        }
    }

    /// Current bearer token (empty until the first refresh).
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Check whether the token is expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Force the next [`AuthSession::ensure_valid`] to refresh.
    pub fn invalidate(&mut self) {
        self.expires_at = DateTime::<Utc>::MIN_UTC;
    }

    /// Short hash identifying the current token in logs.
    pub fn fingerprint(&self) -> String {
        if self.token.is_empty() {
            return "none".to_string();
        }
        let digest = Sha256::digest(self.token.as_bytes());
        hex::encode(&digest[..6])
    }

    /// Refresh the token if it has expired.
    ///
    /// Returns `true` when a token request was made. Expiry is measured from
    /// the moment the request started.
    pub async fn ensure_valid(
        &mut self,
        client: &TokenClient,
        account: &AccountCredentials,
    ) -> Result<bool, PlacerError> {
        let started = Utc::now();
        if !self.is_expired_at(started) {
            return Ok(false);
        }

        let grant = client.request_token(account).await?;

        let expires_at = TimeDelta::try_seconds(grant.expires_in)
            .and_then(|lifetime| started.checked_add_signed(lifetime))
            .ok_or_else(|| {
                PlacerError::auth(
                    &account.username,
                    format!("token lifetime out of range: {}", grant.expires_in),
                )
            })?;

        self.token = grant.access_token;
        self.expires_at = expires_at;

        debug!(
            username = %account.username,
            token = %self.fingerprint(),
            expires_at = %self.expires_at.to_rfc3339(),
            "Refreshed access token"
        );

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_new_session_is_expired() {
        let session = AuthSession::new();
        assert!(session.is_expired_at(Utc::now()));
        assert_eq!(session.token(), "");
        assert_eq!(session.fingerprint(), "none");
    }

    #[test]
    fn test_invalidate_expires_session() {
        let mut session = AuthSession {
            token: "abc".to_string(),
            expires_at: Utc::now() + Duration::hours(1),
        };
        assert!(!session.is_expired_at(Utc::now()));

        session.invalidate();
        assert!(session.is_expired_at(Utc::now()));
        assert_eq!(session.token(), "abc");
    }

    #[test]
    fn test_fingerprint_hides_token() {
        let session = AuthSession {
            token: "super-secret-token".to_string(),
            expires_at: Utc::now(),
        };
        let fingerprint = session.fingerprint();
        assert_eq!(fingerprint.len(), 12);
        assert!(!fingerprint.contains("secret"));
        assert_eq!(fingerprint, session.clone().fingerprint());
    }

    #[test]
    fn test_token_grant_parsing() {
        let grant: TokenGrant = serde_json::from_str(
            r#"{"access_token": "tok", "token_type": "bearer", "expires_in": 3600, "scope": "*"}"#,
        )
        .unwrap();
        assert_eq!(grant.access_token, "tok");
        assert_eq!(grant.expires_in, 3600);
    }
}
