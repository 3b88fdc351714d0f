//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (the football-data token) are referenced by env-var name in
//! the config and resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::fs;

use crate::odds::OddsPolicy;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub wallet: WalletConfig,
    pub feed: FeedConfig,
    #[serde(default)]
    pub odds: OddsConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WalletConfig {
    /// Balance handed to a user with no saved state.
    pub initial_balance: Decimal,
    pub currency: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FeedKind {
    Snapshot,
    FootballData,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    #[serde(rename = "source")]
    pub kind: FeedKind,
    /// Snapshot URL. Takes precedence over `path`.
    #[serde(default)]
    pub url: Option<String>,
    /// Snapshot file on disk.
    #[serde(default)]
    pub path: Option<String>,
    pub poll_interval_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Only show this league on the board.
    #[serde(default)]
    pub league: Option<String>,
    #[serde(default)]
    pub football_data: Option<FootballDataConfig>,
}

fn default_timeout_secs() -> u64 {
    15
}

#[derive(Debug, Deserialize, Clone)]
pub struct FootballDataConfig {
    /// Competition code, e.g. "PL", "BSA", "PD", "SA".
    pub competition: String,
    pub api_token_env: String,
    #[serde(default = "default_finished_limit")]
    pub finished_limit: usize,
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_finished_limit() -> usize {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct OddsConfig {
    pub synthesize_missing: bool,
    pub min_open_odd: Decimal,
}

impl Default for OddsConfig {
    fn default() -> Self {
        Self {
            synthesize_missing: true,
            min_open_odd: dec!(1.01),
        }
    }
}

impl OddsConfig {
    pub fn policy(&self) -> OddsPolicy {
        OddsPolicy {
            synthesize_missing: self.synthesize_missing,
            min_open_odd: self.min_open_odd,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub path: String,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        if config.wallet.initial_balance < Decimal::ZERO {
            anyhow::bail!("wallet.initial_balance must not be negative");
        }
        if config.feed.poll_interval_secs == 0 {
            anyhow::bail!("feed.poll_interval_secs must be at least 1");
        }
        Ok(config)
    }
}
