//! Shared types for BETSIM.
//!
//! Matches, bets, the wallet, and the persisted `Book` that ties them
//! together. Engine, feed, storage and render modules all depend on
//! these without depending on each other.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Match
// ---------------------------------------------------------------------------

/// A fixture as published by the data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: String,
    #[serde(default)]
    pub league_name: String,
    pub home_team: String,
    pub away_team: String,
    /// Unix epoch when missing or unparsable; settlement never reads it.
    #[serde(default, deserialize_with = "lenient_kickoff")]
    pub kickoff_time: DateTime<Utc>,
    #[serde(default)]
    pub status: MatchStatus,
    #[serde(default)]
    pub home_score: Option<u32>,
    #[serde(default)]
    pub away_score: Option<u32>,
    /// Decimal odds for the 1X2 market. Absent when the source has none.
    #[serde(default, deserialize_with = "lenient_odds")]
    pub odds: Option<Odds>,
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.home_score, self.away_score) {
            (Some(h), Some(a)) => write!(
                f,
                "[{}] {} {h}-{a} {} ({})",
                self.league_name, self.home_team, self.away_team, self.status,
            ),
            _ => write!(
                f,
                "[{}] {} vs {} @ {} ({})",
                self.league_name,
                self.home_team,
                self.away_team,
                self.kickoff_time.format("%Y-%m-%d %H:%M"),
                self.status,
            ),
        }
    }
}

impl Match {
    /// Final 1X2 outcome, or `None` while either score is unpublished.
    pub fn outcome(&self) -> Option<Pick> {
        let (home, away) = (self.home_score?, self.away_score?);
        Some(match home.cmp(&away) {
            std::cmp::Ordering::Greater => Pick::Home,
            std::cmp::Ordering::Less => Pick::Away,
            std::cmp::Ordering::Equal => Pick::Draw,
        })
    }

    pub fn is_finished(&self) -> bool {
        self.status == MatchStatus::Finished
    }

    /// Selection label shown on the slip and stored on the bet.
    pub fn label_for(&self, pick: Pick) -> String {
        match pick {
            Pick::Home => self.home_team.clone(),
            Pick::Draw => "Draw".to_string(),
            Pick::Away => self.away_team.clone(),
            Pick::Unknown => "?".to_string(),
        }
    }

    /// Helper to build a test fixture with sensible defaults.
    #[cfg(test)]
    pub fn sample(id: &str) -> Self {
        Match {
            id: id.to_string(),
            league_name: "Premier League".to_string(),
            home_team: "Arsenal FC".to_string(),
            away_team: "Chelsea FC".to_string(),
            kickoff_time: Utc::now() + chrono::Duration::days(2),
            status: MatchStatus::Scheduled,
            home_score: None,
            away_score: None,
            odds: Some(Odds {
                home: Decimal::new(210, 2),
                draw: Decimal::new(340, 2),
                away: Decimal::new(330, 2),
            }),
        }
    }

    /// Same fixture, finished with the given full-time score.
    #[cfg(test)]
    pub fn finished(id: &str, home: u32, away: u32) -> Self {
        Match {
            status: MatchStatus::Finished,
            home_score: Some(home),
            away_score: Some(away),
            ..Match::sample(id)
        }
    }
}

/// Fixture lifecycle as reported by the source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    #[default]
    Scheduled,
    InPlay,
    Finished,
    Postponed,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStatus::Scheduled => write!(f, "SCHEDULED"),
            MatchStatus::InPlay => write!(f, "IN_PLAY"),
            MatchStatus::Finished => write!(f, "FINISHED"),
            MatchStatus::Postponed => write!(f, "POSTPONED"),
            MatchStatus::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Odds
// ---------------------------------------------------------------------------

/// Decimal odds for home win, draw and away win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Odds {
    pub home: Decimal,
    pub draw: Decimal,
    pub away: Decimal,
}

impl fmt::Display for Odds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "1 {:.2} | X {:.2} | 2 {:.2}",
            self.home, self.draw, self.away
        )
    }
}

impl Odds {
    /// The odd offered for a pick. `Unknown` has no price.
    pub fn for_pick(&self, pick: Pick) -> Option<Decimal> {
        match pick {
            Pick::Home => Some(self.home),
            Pick::Draw => Some(self.draw),
            Pick::Away => Some(self.away),
            Pick::Unknown => None,
        }
    }

    /// Build odds from a loosely-typed JSON object. Each price may be a
    /// number or a numeric string; anything unusable becomes 1.00, which
    /// leaves that selection unbettable.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Odds {
            home: lenient_price(obj.get("home")),
            draw: lenient_price(obj.get("draw")),
            away: lenient_price(obj.get("away")),
        })
    }
}

fn lenient_price(value: Option<&serde_json::Value>) -> Decimal {
    let parsed = match value {
        Some(serde_json::Value::Number(n)) => Decimal::from_str(&n.to_string()).ok(),
        Some(serde_json::Value::String(s)) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    };
    parsed
        .filter(|d| *d > Decimal::ZERO)
        .unwrap_or(Decimal::ONE)
}

fn lenient_kickoff<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let Some(serde_json::Value::String(s)) = raw else {
        return Ok(DateTime::<Utc>::default());
    };
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| chrono::NaiveDateTime::parse_from_str(s, fmt).ok());
    Ok(naive.map(|n| n.and_utc()).unwrap_or_default())
}

fn lenient_odds<'de, D>(deserializer: D) -> Result<Option<Odds>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(Odds::from_value))
}

// ---------------------------------------------------------------------------
// Pick
// ---------------------------------------------------------------------------

/// 1X2 selection. Also used as the outcome of a finished match.
///
/// `Unknown` absorbs unrecognised values from storage so a corrupt bet
/// still loads; it never wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Pick {
    Home,
    Draw,
    Away,
    #[serde(other)]
    Unknown,
}

impl Pick {
    pub const ALL: &'static [Pick] = &[Pick::Home, Pick::Draw, Pick::Away];

    /// Board column label (1 / X / 2).
    pub fn column(&self) -> &'static str {
        match self {
            Pick::Home => "1",
            Pick::Draw => "X",
            Pick::Away => "2",
            Pick::Unknown => "?",
        }
    }
}

impl fmt::Display for Pick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pick::Home => write!(f, "HOME"),
            Pick::Draw => write!(f, "DRAW"),
            Pick::Away => write!(f, "AWAY"),
            Pick::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Parse a pick from user input (case-insensitive, 1/X/2 accepted).
impl FromStr for Pick {
    type Err = BetsimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "home" | "1" => Ok(Pick::Home),
            "draw" | "x" => Ok(Pick::Draw),
            "away" | "2" => Ok(Pick::Away),
            _ => Err(BetsimError::UnknownPick(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Bet
// ---------------------------------------------------------------------------

/// Bet lifecycle. `Won` and `Lost` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BetStatus {
    Open,
    Won,
    Lost,
}

impl BetStatus {
    pub fn is_settled(&self) -> bool {
        !matches!(self, BetStatus::Open)
    }
}

impl fmt::Display for BetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BetStatus::Open => write!(f, "OPEN"),
            BetStatus::Won => write!(f, "WON"),
            BetStatus::Lost => write!(f, "LOST"),
        }
    }
}

/// A single simulated bet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bet {
    pub id: Uuid,
    pub match_id: String,
    pub pick: Pick,
    pub selection_label: String,
    pub odd: Decimal,
    pub stake: Decimal,
    /// stake × odd, fixed at placement.
    pub potential_return: Decimal,
    pub status: BetStatus,
    pub placed_at: DateTime<Utc>,
}

impl fmt::Display for Bet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}) stake={:.2} @ {:.2} -> {:.2} [{}]",
            self.match_id,
            self.pick,
            self.selection_label,
            self.stake,
            self.odd,
            self.potential_return,
            self.status,
        )
    }
}

impl Bet {
    pub fn is_open(&self) -> bool {
        self.status == BetStatus::Open
    }

    /// Helper to build an open test bet.
    #[cfg(test)]
    pub fn sample(match_id: &str, pick: Pick, odd: Decimal, stake: Decimal) -> Self {
        Bet {
            id: Uuid::new_v4(),
            match_id: match_id.to_string(),
            pick,
            selection_label: pick.to_string(),
            odd,
            stake,
            potential_return: stake * odd,
            status: BetStatus::Open,
            placed_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Wallet & book
// ---------------------------------------------------------------------------

/// Fake-currency balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub balance: Decimal,
}

impl fmt::Display for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.balance)
    }
}

impl Wallet {
    pub fn new(balance: Decimal) -> Self {
        Self { balance }
    }

    /// Take a stake out of the wallet. Never lets the balance go negative.
    pub fn debit(&mut self, amount: Decimal) -> Result<(), BetsimError> {
        if amount > self.balance {
            return Err(BetsimError::InsufficientBalance {
                needed: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        Ok(())
    }

    pub fn credit(&mut self, amount: Decimal) {
        self.balance += amount;
    }
}

/// Everything the user owns: the wallet and the bet history (newest first).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub wallet: Wallet,
    pub bets: Vec<Bet>,
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "balance={} | bets={} (open {} / W{} / L{}) | staked={:.2} | returned={:.2}",
            self.wallet,
            self.bets.len(),
            self.count(BetStatus::Open),
            self.count(BetStatus::Won),
            self.count(BetStatus::Lost),
            self.total_staked(),
            self.total_returned(),
        )
    }
}

impl Book {
    pub fn new(initial_balance: Decimal) -> Self {
        Self {
            wallet: Wallet::new(initial_balance),
            bets: Vec::new(),
        }
    }

    pub fn open_bets(&self) -> impl Iterator<Item = &Bet> {
        self.bets.iter().filter(|b| b.is_open())
    }

    pub fn count(&self, status: BetStatus) -> usize {
        self.bets.iter().filter(|b| b.status == status).count()
    }

    pub fn total_staked(&self) -> Decimal {
        self.bets.iter().map(|b| b.stake).sum()
    }

    /// Sum paid out by winning bets.
    pub fn total_returned(&self) -> Decimal {
        self.bets
            .iter()
            .filter(|b| b.status == BetStatus::Won)
            .map(|b| b.potential_return)
            .sum()
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for BETSIM.
#[derive(Debug, thiserror::Error)]
pub enum BetsimError {
    #[error("Stake must be a positive amount in whole cents, got {0}")]
    InvalidStake(Decimal),

    #[error("Insufficient balance: need {needed:.2}, have {available:.2}")]
    InsufficientBalance { needed: Decimal, available: Decimal },

    #[error("Market closed for match {0}")]
    MarketClosed(String),

    #[error("Match {0} has already finished")]
    MatchFinished(String),

    #[error("Match not found: {0}")]
    MatchNotFound(String),

    #[error("Invalid odd {odd} on match {match_id}")]
    InvalidOdd { match_id: String, odd: Decimal },

    #[error("Unknown pick: {0}")]
    UnknownPick(String),

    #[error("Bet slip is empty")]
    EmptySlip,

    #[error("Storage error: {0}")]
    Storage(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
