//! Mock match source for integration testing.
//!
//! Provides a deterministic `MatchSource` whose board is controlled from
//! test code: publish results, break the feed, count fetches. Clones share
//! state, so a test keeps a handle while the poller owns another.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use std::sync::{Arc, Mutex};

use betsim::feed::{MatchFeed, MatchSource};
use betsim::types::*;

#[derive(Clone, Default)]
pub struct MockSource {
    feed: Arc<Mutex<MatchFeed>>,
    fetches: Arc<Mutex<u32>>,
    /// If set, every fetch fails with this message.
    force_error: Arc<Mutex<Option<String>>>,
}

impl MockSource {
    /// A source with the default upcoming fixtures and no results.
    pub fn new() -> Self {
        Self::with_upcoming(Self::default_matches())
    }

    pub fn with_upcoming(upcoming: Vec<Match>) -> Self {
        let source = Self::default();
        source.feed.lock().unwrap().upcoming = upcoming;
        source
    }

    /// Move a fixture from `upcoming` to `finished` with a full-time score.
    pub fn publish_result(&self, match_id: &str, home: u32, away: u32) {
        let mut feed = self.feed.lock().unwrap();
        let pos = feed
            .upcoming
            .iter()
            .position(|m| m.id == match_id)
            .expect("publishing result for unknown fixture");
        let mut m = feed.upcoming.remove(pos);
        m.status = MatchStatus::Finished;
        m.home_score = Some(home);
        m.away_score = Some(away);
        feed.finished.push(m);
    }

    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    pub fn clear_error(&self) {
        *self.force_error.lock().unwrap() = None;
    }

    pub fn fetches(&self) -> u32 {
        *self.fetches.lock().unwrap()
    }

    /// Three fixtures across two leagues with known prices.
    fn default_matches() -> Vec<Match> {
        let kickoff = Utc::now() + Duration::days(3);
        vec![
            Match {
                id: "PL-001".to_string(),
                league_name: "Premier League".to_string(),
                home_team: "Arsenal FC".to_string(),
                away_team: "Chelsea FC".to_string(),
                kickoff_time: kickoff,
                status: MatchStatus::Scheduled,
                home_score: None,
                away_score: None,
                odds: Some(Odds { home: dec!(2.00), draw: dec!(3.40), away: dec!(3.80) }),
            },
            Match {
                id: "PL-002".to_string(),
                league_name: "Premier League".to_string(),
                home_team: "Everton FC".to_string(),
                away_team: "Fulham FC".to_string(),
                kickoff_time: kickoff + Duration::hours(2),
                status: MatchStatus::Scheduled,
                home_score: None,
                away_score: None,
                odds: Some(Odds { home: dec!(2.60), draw: dec!(3.10), away: dec!(2.75) }),
            },
            Match {
                id: "BSA-001".to_string(),
                league_name: "Campeonato Brasileiro Série A".to_string(),
                home_team: "Flamengo".to_string(),
                away_team: "Palmeiras".to_string(),
                kickoff_time: kickoff + Duration::hours(5),
                status: MatchStatus::Scheduled,
                home_score: None,
                away_score: None,
                odds: None,
            },
        ]
    }
}

#[async_trait]
impl MatchSource for MockSource {
    async fn fetch(&self) -> Result<MatchFeed> {
        *self.fetches.lock().unwrap() += 1;
        if let Some(msg) = self.force_error.lock().unwrap().as_ref() {
            return Err(anyhow!("{msg}"));
        }
        Ok(self.feed.lock().unwrap().clone())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_fetch_defaults() {
        let source = MockSource::new();
        let feed = source.fetch().await.unwrap();
        assert_eq!(feed.upcoming.len(), 3);
        assert!(feed.finished.is_empty());
        assert_eq!(source.fetches(), 1);
    }

    #[tokio::test]
    async fn test_mock_publish_result() {
        let source = MockSource::new();
        source.publish_result("PL-002", 1, 1);
        let feed = source.fetch().await.unwrap();
        assert_eq!(feed.upcoming.len(), 2);
        assert_eq!(feed.finished[0].outcome(), Some(Pick::Draw));
    }

    #[tokio::test]
    async fn test_mock_forced_error() {
        let source = MockSource::new();
        source.set_error("snapshot not generated yet");
        assert!(source.fetch().await.is_err());
        source.clear_error();
        assert!(source.fetch().await.is_ok());
        assert_eq!(source.fetches(), 2);
    }

    #[tokio::test]
    async fn test_mock_clones_share_state() {
        let source = MockSource::new();
        let handle = source.clone();
        handle.publish_result("PL-001", 2, 0);
        assert_eq!(source.fetch().await.unwrap().finished.len(), 1);
    }
}
