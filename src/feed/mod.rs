//! Match data sources.
//!
//! Defines the `MatchSource` trait and the parsed `MatchFeed` snapshot
//! every source produces. Parsing is lenient: a missing or malformed list
//! is treated as empty, and individual bad entries are dropped, so one
//! broken record never blocks settlement of the rest.

pub mod football_data;
pub mod snapshot;

use anyhow::{Context, Result};
use async_trait::async_trait;
use secrecy::SecretString;
use serde::Serialize;
use std::time::Duration;
use tracing::warn;

use crate::config::{FeedConfig, FeedKind};
use crate::types::{Match, MatchStatus};

use self::football_data::FootballDataSource;
use self::snapshot::{SnapshotLocation, SnapshotSource};

/// One retrieval of the match board.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MatchFeed {
    /// Fixtures still open for betting.
    pub upcoming: Vec<Match>,
    /// Fixtures with published results.
    pub finished: Vec<Match>,
}

impl MatchFeed {
    /// Parse a snapshot document. Errors only when the body is not JSON.
    pub fn parse(body: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(body).context("Feed body is not valid JSON")?;
        Ok(Self::from_value(&value))
    }

    pub fn from_value(value: &serde_json::Value) -> Self {
        if !value.is_object() {
            warn!("Feed root is not an object, treating as empty");
            return Self::default();
        }

        let upcoming = Self::parse_list(value.get("upcoming"), "upcoming");
        let mut finished = Self::parse_list(value.get("finished"), "finished");
        for m in &mut finished {
            m.status = MatchStatus::Finished;
        }

        Self { upcoming, finished }
    }

    fn parse_list(value: Option<&serde_json::Value>, list: &str) -> Vec<Match> {
        let Some(value) = value else {
            return Vec::new();
        };
        let Some(items) = value.as_array() else {
            warn!(list, "Match list is not an array, treating as empty");
            return Vec::new();
        };

        items
            .iter()
            .filter_map(|item| match serde_json::from_value::<Match>(item.clone()) {
                Ok(m) => Some(m),
                Err(e) => {
                    warn!(list, error = %e, "Skipping malformed match entry");
                    None
                }
            })
            .collect()
    }

    pub fn find_upcoming(&self, match_id: &str) -> Option<&Match> {
        self.upcoming.iter().find(|m| m.id == match_id)
    }

    pub fn is_empty(&self) -> bool {
        self.upcoming.is_empty() && self.finished.is_empty()
    }
}

/// Abstraction over wherever the match board comes from.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MatchSource: Send + Sync {
    /// Retrieve the current board.
    async fn fetch(&self) -> Result<MatchFeed>;

    /// Source name for logging.
    fn name(&self) -> &'static str;
}

/// Build the configured source.
pub fn build_source(cfg: &FeedConfig) -> Result<Box<dyn MatchSource>> {
    let timeout = Duration::from_secs(cfg.timeout_secs);
    match cfg.kind {
        FeedKind::Snapshot => {
            let location = match (&cfg.url, &cfg.path) {
                (Some(url), _) => SnapshotLocation::Url(url.clone()),
                (None, Some(path)) => SnapshotLocation::File(path.into()),
                (None, None) => anyhow::bail!("Snapshot feed needs either `url` or `path`"),
            };
            Ok(Box::new(SnapshotSource::new(location, timeout)?))
        }
        FeedKind::FootballData => {
            let fd = cfg
                .football_data
                .as_ref()
                .context("Missing [feed.football_data] section")?;
            let token = std::env::var(&fd.api_token_env)
                .with_context(|| format!("Environment variable not set: {}", fd.api_token_env))?;
            Ok(Box::new(FootballDataSource::new(
                SecretString::new(token),
                fd.competition.clone(),
                fd.finished_limit,
                fd.base_url.clone(),
                timeout,
            )?))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
