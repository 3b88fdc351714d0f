//! football-data.org source.
//!
//! Pulls a competition's fixtures straight from the public v4 API and
//! turns them into a `MatchFeed`. The API publishes no prices, so these
//! matches rely on the odds policy to synthesise them.
//!
//! API: `https://api.football-data.org/v4/competitions/{code}/matches`
//! Auth: `X-Auth-Token` header. Free tier: 10 req/min.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{MatchFeed, MatchSource};
use crate::types::{Match, MatchStatus};

const DEFAULT_BASE_URL: &str = "https://api.football-data.org/v4";
const SOURCE_NAME: &str = "football-data";

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct MatchesResponse {
    #[serde(default)]
    competition: Option<ApiCompetition>,
    #[serde(default)]
    matches: Vec<ApiMatch>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiMatch {
    id: u64,
    utc_date: DateTime<Utc>,
    status: String,
    #[serde(default)]
    competition: Option<ApiCompetition>,
    home_team: ApiTeam,
    away_team: ApiTeam,
    #[serde(default)]
    score: Option<ApiScore>,
}

#[derive(Debug, Deserialize)]
struct ApiCompetition {
    name: String,
}

/// Team names are null until a knockout slot is decided.
#[derive(Debug, Deserialize)]
struct ApiTeam {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiScore {
    #[serde(default)]
    full_time: Option<ApiFullTime>,
}

#[derive(Debug, Deserialize)]
struct ApiFullTime {
    home: Option<u32>,
    away: Option<u32>,
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

pub struct FootballDataSource {
    http: Client,
    token: SecretString,
    competition: String,
    finished_limit: usize,
    base_url: String,
}

impl FootballDataSource {
    pub fn new(
        token: SecretString,
        competition: String,
        finished_limit: usize,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent("BETSIM/0.1.0")
            .build()
            .context("Failed to build football-data HTTP client")?;
        Ok(Self {
            http,
            token,
            competition,
            finished_limit,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }

    fn convert(resp: MatchesResponse, finished_limit: usize) -> MatchFeed {
        let default_league = resp
            .competition
            .map(|c| c.name)
            .unwrap_or_default();

        let mut feed = MatchFeed::default();
        for api in resp.matches {
            let league_name = api
                .competition
                .map(|c| c.name)
                .unwrap_or_else(|| default_league.clone());
            let (Some(home_team), Some(away_team)) = (api.home_team.name, api.away_team.name) else {
                continue;
            };
            let full_time = api.score.and_then(|s| s.full_time);

            let mut m = Match {
                id: api.id.to_string(),
                league_name,
                home_team,
                away_team,
                kickoff_time: api.utc_date,
                status: MatchStatus::Scheduled,
                home_score: None,
                away_score: None,
                odds: None,
            };

            match api.status.as_str() {
                "FINISHED" => {
                    let Some(ft) = full_time else { continue };
                    m.status = MatchStatus::Finished;
                    m.home_score = ft.home;
                    m.away_score = ft.away;
                    feed.finished.push(m);
                }
                "SCHEDULED" | "TIMED" => feed.upcoming.push(m),
                _ => {}
            }
        }

        // Keep only the most recent results.
        feed.finished.sort_by_key(|m| m.kickoff_time);
        let excess = feed.finished.len().saturating_sub(finished_limit);
        feed.finished.drain(..excess);

        feed
    }
}

#[async_trait]
impl MatchSource for FootballDataSource {
    async fn fetch(&self) -> Result<MatchFeed> {
        let url = format!(
            "{}/competitions/{}/matches",
            self.base_url,
            urlencoding::encode(&self.competition),
        );
        debug!(url = %url, "Fetching football-data matches");

        let resp = self
            .http
            .get(&url)
            .header("X-Auth-Token", self.token.expose_secret().as_str())
            .send()
            .await
            .context("football-data request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("football-data API error {status}: {body}");
        }

        let parsed: MatchesResponse = resp
            .json()
            .await
            .context("Failed to parse football-data matches response")?;

        Ok(Self::convert(parsed, self.finished_limit))
    }

    fn name(&self) -> &'static str {
        SOURCE_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
