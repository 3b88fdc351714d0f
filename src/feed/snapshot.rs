//! Static JSON snapshot source.
//!
//! Reads the `{upcoming, finished}` document from an HTTP URL or a local
//! file. HTTP requests carry a `t=<millis>` query parameter so stale
//! copies are never served from an intermediate cache.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use super::{MatchFeed, MatchSource};

const SOURCE_NAME: &str = "snapshot";

#[derive(Debug, Clone)]
pub enum SnapshotLocation {
    Url(String),
    File(PathBuf),
}

pub struct SnapshotSource {
    http: Client,
    location: SnapshotLocation,
}

impl SnapshotSource {
    pub fn new(location: SnapshotLocation, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent("BETSIM/0.1.0")
            .build()
            .context("Failed to build snapshot HTTP client")?;
        Ok(Self { http, location })
    }

    async fn fetch_url(&self, url: &str) -> Result<String> {
        let cache_buster = Utc::now().timestamp_millis();
        debug!(url, cache_buster, "Fetching snapshot");

        let resp = self
            .http
            .get(url)
            .query(&[("t", cache_buster)])
            .send()
            .await
            .context("Snapshot request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            anyhow::bail!("Snapshot not available yet ({status})");
        }

        resp.text().await.context("Failed to read snapshot body")
    }
}

#[async_trait]
impl MatchSource for SnapshotSource {
    async fn fetch(&self) -> Result<MatchFeed> {
        let body = match &self.location {
            SnapshotLocation::Url(url) => self.fetch_url(url).await?,
            SnapshotLocation::File(path) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read snapshot file {}", path.display()))?,
        };

        let feed = MatchFeed::parse(&body)?;
        debug!(
            upcoming = feed.upcoming.len(),
            finished = feed.finished.len(),
            "Snapshot parsed"
        );
        Ok(feed)
    }

    fn name(&self) -> &'static str {
        SOURCE_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
