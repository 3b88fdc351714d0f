//! Match board: open markets grouped by league and ordered by kickoff.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::odds::OddsPolicy;
use crate::types::{Match, Odds};

const UNNAMED_LEAGUE: &str = "Other";

#[derive(Debug, Clone, PartialEq)]
pub struct BoardRow {
    pub match_id: String,
    pub kickoff: DateTime<Utc>,
    pub home_team: String,
    pub away_team: String,
    pub odds: Odds,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeagueGroup {
    pub league: String,
    pub rows: Vec<BoardRow>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Board {
    pub groups: Vec<LeagueGroup>,
}

impl Board {
    /// Build the board from upcoming matches. Closed markets are left out;
    /// `league` keeps only that league (case-insensitive).
    pub fn build(matches: &[Match], policy: &OddsPolicy, league: Option<&str>) -> Self {
        let mut open: Vec<(&Match, Odds)> = matches
            .iter()
            .filter(|m| {
                league
                    .map(|l| m.league_name.eq_ignore_ascii_case(l))
                    .unwrap_or(true)
            })
            .filter(|m| policy.is_open(m))
            .filter_map(|m| policy.resolve(m).map(|odds| (m, odds)))
            .collect();
        open.sort_by_key(|(m, _)| m.kickoff_time);

        let mut grouped: BTreeMap<String, Vec<BoardRow>> = BTreeMap::new();
        for (m, odds) in open {
            let league = if m.league_name.trim().is_empty() {
                UNNAMED_LEAGUE.to_string()
            } else {
                m.league_name.clone()
            };
            grouped.entry(league).or_default().push(BoardRow {
                match_id: m.id.clone(),
                kickoff: m.kickoff_time,
                home_team: m.home_team.clone(),
                away_team: m.away_team.clone(),
                odds,
            });
        }

        Self {
            groups: grouped
                .into_iter()
                .map(|(league, rows)| LeagueGroup { league, rows })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of matches on the board.
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.rows.len()).sum()
    }

    pub fn leagues(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.league.as_str()).collect()
    }
}
