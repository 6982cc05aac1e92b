//! Pool accounts and their cooldown state.
//!
//! The pool is fixed for the life of the process and keeps configuration
//! order, which is also selection priority. Only the scheduler task mutates
//! accounts, so no locking is involved.

use chrono::{DateTime, Utc};

use crate::auth::{AuthSession, TokenClient};
use crate::config::AccountCredentials;
use crate::error::PlacerError;

/// One credentialed identity.
#[derive(Debug, Clone)]
pub struct Account {
    credentials: AccountCredentials,
    session: AuthSession,
    next_eligible_at: DateTime<Utc>,
    auth_failures: u32,
}

impl Account {
    /// Create an account that is eligible immediately and has no token.
    pub fn new(credentials: AccountCredentials) -> Self {
        Self {
            credentials,
            session: AuthSession::new(),
            next_eligible_at: DateTime::<Utc>::MIN_UTC,
            auth_failures: 0,
        }
    }

    pub fn username(&self) -> &str {
        &self.credentials.username
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut AuthSession {
        &mut self.session
    }

    /// Earliest time this account may write.
    pub fn next_eligible_at(&self) -> DateTime<Utc> {
        self.next_eligible_at
    }

    pub fn set_next_eligible_at(&mut self, at: DateTime<Utc>) {
        self.next_eligible_at = at;
    }

    /// Returns true once `now` is strictly past the cooldown.
    pub fn is_eligible(&self, now: DateTime<Utc>) -> bool {
        now > self.next_eligible_at
    }

    /// Consecutive failed token requests.
    pub fn auth_failures(&self) -> u32 {
        self.auth_failures
    }

    /// Refresh the account's token if needed.
    pub async fn ensure_session(&mut self, client: &TokenClient) -> Result<bool, PlacerError> {
        self.session.ensure_valid(client, &self.credentials).await
    }

    /// Record a failed token request and sit the account out until `until`.
    pub fn record_auth_failure(&mut self, until: DateTime<Utc>) {
        self.auth_failures += 1;
        self.next_eligible_at = self.next_eligible_at.max(until);
    }

    /// Clear the failure streak after a usable token.
    pub fn record_auth_success(&mut self) {
        self.auth_failures = 0;
    }
}

/// Ordered, fixed-size set of accounts.
#[derive(Debug, Clone, Default)]
pub struct AccountPool {
    accounts: Vec<Account>,
}

impl AccountPool {
    /// Build a pool from credentials, preserving order.
    pub fn new(credentials: impl IntoIterator<Item = AccountCredentials>) -> Self {
        Self {
            accounts: credentials.into_iter().map(Account::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Account> {
        self.accounts.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Account> {
        self.accounts.get_mut(index)
    }

    /// Look up an account by username.
    pub fn find(&self, username: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.username() == username)
    }

    /// Look up an account by username for mutation.
    pub fn find_mut(&mut self, username: &str) -> Option<&mut Account> {
        self.accounts.iter_mut().find(|a| a.username() == username)
    }

    /// Returns true when every account's latest token request failed.
    pub fn all_auth_failed(&self) -> bool {
        !self.accounts.is_empty() && self.accounts.iter().all(|a| a.auth_failures > 0)
    }

    /// Earliest cooldown expiry across the pool.
    pub fn earliest_eligible_at(&self) -> Option<DateTime<Utc>> {
        self.accounts.iter().map(|a| a.next_eligible_at).min()
    }
}
