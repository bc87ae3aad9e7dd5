//! Shift-balance leaderboard engine.
//!
//! Operators report a balance at the end of each shift; the engine
//! aggregates those balances over daily and weekly windows, rolls them
//! up the operator → admin → top-admin hierarchy, and publishes ranked
//! leaderboards on a wall-clock schedule. A retention sweep keeps the
//! entry ledger bounded.

pub mod aggregate;
pub mod config;
pub mod delivery;
pub mod error;
pub mod intake;
pub mod rank;
pub mod report;
pub mod scheduler;
pub mod store;
pub mod types;
pub mod window;
