//! lexicube-sync - Async match synchronization runtime
//!
//! This crate feeds the pure reconciliation core (`lexicube-core`) from the
//! external match service's event stream and executes the commands it emits.
//! All platform services are reached through client traits, so the whole
//! loop runs under test against in-memory fakes.
//!
//! # Modules
//!
//! - [`client`]: traits for the match service, notifications, and saved
//!   games, plus the shared error surface
//! - [`driver`]: the event loop, clock injection, and command dispatch
//! - [`telemetry`]: tracing subscriber setup

pub mod client;
pub mod driver;
pub mod telemetry;

pub use client::{ClientError, EndMatchRequest, MatchClient, NotificationClient, SavedGamesClient};
pub use driver::{Clock, DriverRunResult, SyncDriver, SystemClock};
