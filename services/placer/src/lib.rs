//! pixfleet placer
//!
//! Drives pixel writes to a collaborative canvas across a pool of
//! credentialed accounts, respecting each account's cooldown and token
//! lifetime.
//!
//! ## Architecture
//!
//! ```text
//! UpdateSource ──► Scheduler ──► AccountPool
//!                     │            └── Account ── AuthSession ──► token endpoint
//!                     └──► PlacementClient ──────────────────────► write endpoint
//! ```
//!
//! ## Modules
//!
//! - `account`: accounts, cooldowns, and the ordered pool
//! - `auth`: password-grant tokens and per-account sessions
//! - `client`: the pixel write HTTP client
//! - `config`: JSON configuration
//! - `feed`: update sources
//! - `protocol`: request and response wire shapes
//! - `scheduler`: the select/authenticate/write/pace loop

pub mod account;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod feed;
pub mod protocol;
pub mod scheduler;

pub use account::{Account, AccountPool};
pub use auth::{AuthSession, TokenClient, TokenGrant};
pub use client::PlacementClient;
pub use config::{AccountCredentials, AppCredentials, Config};
pub use error::PlacerError;
pub use feed::{JsonLinesSource, UpdateSource};
pub use protocol::PlacementOutcome;
pub use scheduler::{CycleReport, RunSummary, Scheduler, SchedulerConfig};
