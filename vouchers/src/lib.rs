#![deny(clippy::dbg_macro)]

pub mod aggregator;
pub mod config;
pub mod controller;
pub mod errors;
pub mod types;
pub mod wallet;

pub use aggregator::{compute_stats, BalanceAggregator, UnknownChainPolicy};
pub use config::Config;
pub use controller::{ControllerState, RefreshController, RefreshOutcome, RefreshPhase};
pub use errors::{ConfigError, RefreshError};
pub use wallet::{WalletAccount, WalletChange, WalletSession};
