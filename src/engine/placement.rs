//! Bet slip and placement.
//!
//! The slip holds a single selection at a time; picking another odd
//! replaces it. Placing validates the stake against the wallet, debits it
//! and records an OPEN bet at the head of the history.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::info;
use uuid::Uuid;

use crate::odds::OddsPolicy;
use crate::types::{Bet, BetStatus, BetsimError, Book, Match, Pick};

/// Money is kept in whole cents.
const CENTS: u32 = 2;

/// A priced outcome chosen from the board.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub match_id: String,
    pub pick: Pick,
    pub odd: Decimal,
    pub label: String,
}

impl Selection {
    /// Price `pick` on `m` using the odds policy.
    pub fn from_match(m: &Match, pick: Pick, policy: &OddsPolicy) -> Result<Self, BetsimError> {
        if pick == Pick::Unknown {
            return Err(BetsimError::UnknownPick(pick.to_string()));
        }
        if m.is_finished() || m.outcome().is_some() {
            return Err(BetsimError::MatchFinished(m.id.clone()));
        }
        if !policy.is_open(m) {
            return Err(BetsimError::MarketClosed(m.id.clone()));
        }

        let odd = policy
            .resolve(m)
            .and_then(|odds| odds.for_pick(pick))
            .ok_or_else(|| BetsimError::MarketClosed(m.id.clone()))?;
        if odd <= Decimal::ONE {
            return Err(BetsimError::InvalidOdd { match_id: m.id.clone(), odd });
        }

        Ok(Self {
            match_id: m.id.clone(),
            pick,
            odd,
            label: m.label_for(pick),
        })
    }

    /// `stake × odd`, rounded half away from zero to the cent.
    pub fn potential_return(&self, stake: Decimal) -> Decimal {
        (stake * self.odd).round_dp_with_strategy(CENTS, RoundingStrategy::MidpointAwayFromZero)
    }
}

/// Single-selection bet slip.
#[derive(Debug, Default, Clone)]
pub struct BetSlip {
    selection: Option<Selection>,
}

impl BetSlip {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace whatever is on the slip.
    pub fn select(&mut self, selection: Selection) {
        self.selection = Some(selection);
    }

    pub fn clear(&mut self) {
        self.selection = None;
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.selection.is_none()
    }

    /// Return shown on the slip for a given stake.
    pub fn potential_return(&self, stake: Decimal) -> Option<Decimal> {
        self.selection.as_ref().map(|s| s.potential_return(stake))
    }

    /// Place the slip's selection and clear the slip.
    pub fn place(&mut self, book: &mut Book, stake: Decimal, now: DateTime<Utc>) -> Result<Bet, BetsimError> {
        let selection = self.selection.as_ref().ok_or(BetsimError::EmptySlip)?;
        let bet = book.place_bet(selection, stake, now)?;
        self.clear();
        Ok(bet)
    }
}

impl Book {
    /// Debit `stake` and record a new OPEN bet. Leaves the book untouched
    /// on any validation failure.
    pub fn place_bet(
        &mut self,
        selection: &Selection,
        stake: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Bet, BetsimError> {
        if stake <= Decimal::ZERO || stake.normalize().scale() > CENTS {
            return Err(BetsimError::InvalidStake(stake));
        }
        if selection.pick == Pick::Unknown {
            return Err(BetsimError::UnknownPick(selection.pick.to_string()));
        }
        if selection.odd <= Decimal::ONE {
            return Err(BetsimError::InvalidOdd {
                match_id: selection.match_id.clone(),
                odd: selection.odd,
            });
        }

        self.wallet.debit(stake)?;

        let bet = Bet {
            id: Uuid::new_v4(),
            match_id: selection.match_id.clone(),
            pick: selection.pick,
            selection_label: selection.label.clone(),
            odd: selection.odd,
            stake,
            potential_return: selection.potential_return(stake),
            status: BetStatus::Open,
            placed_at: now,
        };
        self.bets.insert(0, bet.clone());

        info!(
            bet_id = %bet.id,
            match_id = %bet.match_id,
            pick = %bet.pick,
            stake = format!("{:.2}", bet.stake),
            odd = format!("{:.2}", bet.odd),
            balance = %self.wallet,
            "Bet placed"
        );

        Ok(bet)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
