//! Core domain types and pure logic for tgtg-watch.
//!
//! Holds the item model, the typed discovery payload, the aggregator and diff
//! engine, and the environment-driven application config. Nothing in this
//! crate performs I/O beyond reading environment variables.

pub mod aggregate;
pub mod app_config;
pub mod config;
pub mod diff;
pub mod items;
pub mod payload;

pub use aggregate::aggregate;
pub use app_config::{AppConfig, ConfigOverrides, Credentials};
pub use config::{load_app_config, load_app_config_from_env};
pub use diff::newly_available;
pub use items::{Interval, ItemDetails, ItemRecord, Picture, Price, Rating, Snapshot, Store};
pub use payload::{Bucket, DiscoverResults};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
