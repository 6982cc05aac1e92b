//! Account scheduler.
//!
//! For each desired update the scheduler:
//! - Scans the pool in order for the first account off cooldown
//! - Makes sure that account holds a valid token
//! - Issues the write and records the server's next-eligible time
//! - Falls through to the next account on a failed attempt
//!
//! Updates are handled strictly one at a time, so at most one write is in
//! flight for any account. After each update the scheduler pauses for the
//! base delay plus a random jitter before pulling the next one, and for the
//! post-write pause on top of that when the update was placed. Shutdown cuts
//! either pause short.

use std::time::Duration;

use chrono::{TimeDelta, Utc};
use pixfleet_canvas::{ColorTable, DesiredUpdate};
use rand::Rng;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::account::AccountPool;
use crate::auth::TokenClient;
use crate::client::PlacementClient;
use crate::config::Config;
use crate::error::PlacerError;
use crate::protocol::PlacementOutcome;

/// Pacing and backoff policy.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Fixed pause between updates.
    pub base_delay: Duration,

    /// Exclusive upper bound of the uniform jitter added to `base_delay`.
    pub jitter: Duration,

    /// Extra pause after an update that was placed.
    pub post_write_pause: Duration,

    /// Cooldown applied to an account whose token request failed.
    pub auth_backoff: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::ZERO,
            jitter: Duration::from_millis(1500),
            post_write_pause: Duration::from_secs(1),
            auth_backoff: Duration::from_secs(300),
        }
    }
}

impl SchedulerConfig {
    /// Pause before the next update: base delay plus uniform jitter.
    pub fn pacing_delay(&self) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return self.base_delay;
        }
        self.base_delay + Duration::from_millis(rand::rng().random_range(0..jitter_ms))
    }
}

/// What happened to a single update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Account that wrote the pixel, if any.
    pub placed_by: Option<String>,

    /// Write requests issued.
    pub attempts: u32,

    /// Accounts skipped because they were on cooldown.
    pub skipped: u32,
}

/// Totals for a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub updates: u64,
    pub placed: u64,
}

/// Sequential scheduler over a fixed account pool.
pub struct Scheduler {
    pool: AccountPool,
    tokens: TokenClient,
    placement: PlacementClient,
    palette: ColorTable,
    config: SchedulerConfig,
}

impl Scheduler {
    /// Create a scheduler over an existing pool.
    pub fn new(
        pool: AccountPool,
        tokens: TokenClient,
        placement: PlacementClient,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            pool,
            tokens,
            placement,
            palette: ColorTable::new(),
            config,
        }
    }

    /// Build the pool and clients from config.
    pub fn from_config(config: &Config) -> Result<Self, PlacerError> {
        Ok(Self::new(
            AccountPool::new(config.accounts.iter().cloned()),
            TokenClient::new(config)?,
            PlacementClient::new(config)?,
            config.scheduler_config(),
        ))
    }

    pub fn pool(&self) -> &AccountPool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut AccountPool {
        &mut self.pool
    }

    /// Consume updates until the feed closes, shutdown is signalled, or the
    /// pool can no longer authenticate.
    pub async fn run(
        &mut self,
        mut updates: mpsc::Receiver<DesiredUpdate>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<RunSummary, PlacerError> {
        info!(
            accounts = self.pool.len(),
            base_delay_ms = self.config.base_delay.as_millis() as u64,
            jitter_ms = self.config.jitter.as_millis() as u64,
            "Starting scheduler"
        );

        let mut summary = RunSummary::default();

        loop {
            if *shutdown.borrow() {
                info!("Scheduler shutting down");
                break;
            }

            let update = tokio::select! {
                update = updates.recv() => match update {
                    Some(update) => update,
                    None => {
                        info!("Update feed closed");
                        break;
                    }
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Scheduler shutting down");
                        break;
                    }
                    continue;
                }
            };

            let report = self.process(&update).await?;
            summary.updates += 1;
            if report.placed_by.is_some() {
                summary.placed += 1;
            }

            let mut delay = self.config.pacing_delay();
            if report.placed_by.is_some() {
                delay += self.config.post_write_pause;
            }
            debug!(delay_ms = delay.as_millis() as u64, "Pacing");
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Scheduler shutting down");
                        break;
                    }
                }
            }
        }

        info!(
            updates = summary.updates,
            placed = summary.placed,
            "Scheduler stopped"
        );
        Ok(summary)
    }

    /// Run one select/authenticate/write cycle for `update`.
    ///
    /// Returns [`PlacerError::PoolExhausted`] once no account can
    /// authenticate; every other failure is handled per account.
    pub async fn process(&mut self, update: &DesiredUpdate) -> Result<CycleReport, PlacerError> {
        let mut report = CycleReport::default();

        let color = match self.palette.index_of(&update.color) {
            Ok(color) => color,
            Err(e) => {
                warn!(update = %update, error = %e, "Dropping update");
                return Ok(report);
            }
        };
        if let Err(e) = update.point.to_tile() {
            warn!(update = %update, error = %e, "Dropping update");
            return Ok(report);
        }

        let auth_backoff = TimeDelta::from_std(self.config.auth_backoff)
            .unwrap_or_else(|_| TimeDelta::seconds(300));

        for index in 0..self.pool.len() {
            let now = Utc::now();
            let Some(account) = self.pool.get_mut(index) else {
                break;
            };

            if !account.is_eligible(now) {
                info!(
                    username = %account.username(),
                    until = %account.next_eligible_at().to_rfc3339(),
                    "Account still on cooldown"
                );
                report.skipped += 1;
                continue;
            }

            if let Err(e) = account.ensure_session(&self.tokens).await {
                account.record_auth_failure(Utc::now() + auth_backoff);
                warn!(
                    username = %account.username(),
                    failures = account.auth_failures(),
                    until = %account.next_eligible_at().to_rfc3339(),
                    error = %e,
                    "Authentication failed, backing off account"
                );
                if self.pool.all_auth_failed() {
                    error!("Every account failed to authenticate");
                    return Err(PlacerError::PoolExhausted);
                }
                continue;
            }
            account.record_auth_success();

            report.attempts += 1;
            match self.placement.place(account, update.point, color).await {
                Ok(PlacementOutcome::Success { next_eligible_at }) => {
                    account.set_next_eligible_at(next_eligible_at);
                    info!(
                        username = %account.username(),
                        color = self.palette.name_of(color).unwrap_or(update.color.as_str()),
                        x = update.point.x,
                        y = update.point.y,
                        next_eligible_at = %next_eligible_at.to_rfc3339(),
                        "Wrote pixel"
                    );
                    report.placed_by = Some(account.username().to_string());
                    break;
                }
                Ok(PlacementOutcome::Failure {
                    reason,
                    next_eligible_at,
                }) => {
                    if let Some(at) = next_eligible_at {
                        account.set_next_eligible_at(at);
                    }
                    warn!(
                        username = %account.username(),
                        reason = %reason,
                        until = %account.next_eligible_at().to_rfc3339(),
                        "Write refused"
                    );
                }
                Err(e) => {
                    if e.is_unauthorized() {
                        account.session_mut().invalidate();
                    }
                    warn!(
                        username = %account.username(),
                        error = %e,
                        "Write attempt failed"
                    );
                }
            }
        }

        if report.placed_by.is_none() {
            let next_free = self
                .pool
                .earliest_eligible_at()
                .map(|at| at.to_rfc3339())
                .unwrap_or_default();
            debug!(
                update = %update,
                attempts = report.attempts,
                skipped = report.skipped,
                next_free = %next_free,
                "No account placed update"
            );
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduler_config_default() {
        let config = SchedulerConfig::default();
        assert_eq!(config.base_delay, Duration::ZERO);
        assert_eq!(config.jitter, Duration::from_millis(1500));
        assert_eq!(config.post_write_pause, Duration::from_secs(1));
        assert_eq!(config.auth_backoff, Duration::from_secs(300));
    }

    #[test]
    fn test_pacing_delay_bounds() {
        let config = SchedulerConfig {
            base_delay: Duration::from_secs(2),
            jitter: Duration::from_millis(500),
            ..SchedulerConfig::default()
        };
        for _ in 0..100 {
            let delay = config.pacing_delay();
            assert!(delay >= Duration::from_secs(2));
            assert!(delay < Duration::from_millis(2500));
        }
    }

    #[test]
    fn test_pacing_delay_without_jitter() {
        let config = SchedulerConfig {
            base_delay: Duration::from_millis(750),
            jitter: Duration::ZERO,
            ..SchedulerConfig::default()
        };
        assert_eq!(config.pacing_delay(), Duration::from_millis(750));
    }
}
