//! Settlement engine.
//!
//! Reconciles open bets against finished matches. Pure: takes the current
//! bets and wallet, returns updated copies plus a `changed` flag, and never
//! touches storage or the display.
//!
//! Each bet moves OPEN → WON or OPEN → LOST at most once. Bets whose match
//! has no published result stay OPEN, and already-settled bets are skipped,
//! so running it again over the same data changes nothing.

use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::types::{Bet, BetStatus, Match, Pick, Wallet};

// ---------------------------------------------------------------------------
// Settlement result
// ---------------------------------------------------------------------------

/// One bet resolved during a settlement pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SettledBet {
    pub bet_id: Uuid,
    pub match_id: String,
    pub selection_label: String,
    pub pick: Pick,
    pub outcome: Pick,
    pub status: BetStatus,
    /// Amount credited to the wallet (zero for a loss).
    pub payout: Decimal,
}

/// Output of a settlement pass.
#[derive(Debug, Clone)]
pub struct Settlement {
    pub bets: Vec<Bet>,
    pub wallet: Wallet,
    /// Whether any bet changed status. Callers persist and re-render only
    /// when this is set.
    pub changed: bool,
    pub settled: Vec<SettledBet>,
}

impl Settlement {
    pub fn won(&self) -> usize {
        self.settled.iter().filter(|s| s.status == BetStatus::Won).count()
    }

    pub fn lost(&self) -> usize {
        self.settled.iter().filter(|s| s.status == BetStatus::Lost).count()
    }

    /// Total paid out in this pass.
    pub fn credited(&self) -> Decimal {
        self.settled.iter().map(|s| s.payout).sum()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct SettlementEngine;

impl SettlementEngine {
    /// Settle every open bet whose match appears in `finished` with a
    /// full-time score.
    pub fn settle(bets: &[Bet], finished: &[Match], wallet: &Wallet) -> Settlement {
        let results: HashMap<&str, Pick> = finished
            .iter()
            .filter_map(|m| m.outcome().map(|outcome| (m.id.as_str(), outcome)))
            .collect();

        let mut wallet = *wallet;
        let mut settled = Vec::new();
        let mut updated = Vec::with_capacity(bets.len());

        for bet in bets {
            let mut bet = bet.clone();

            if bet.status == BetStatus::Open {
                if let Some(&outcome) = results.get(bet.match_id.as_str()) {
                    let payout = if bet.pick == outcome {
                        bet.status = BetStatus::Won;
                        wallet.credit(bet.potential_return);
                        bet.potential_return
                    } else {
                        bet.status = BetStatus::Lost;
                        Decimal::ZERO
                    };

                    debug!(
                        bet_id = %bet.id,
                        match_id = %bet.match_id,
                        pick = %bet.pick,
                        %outcome,
                        status = %bet.status,
                        "Bet settled"
                    );

                    settled.push(SettledBet {
                        bet_id: bet.id,
                        match_id: bet.match_id.clone(),
                        selection_label: bet.selection_label.clone(),
                        pick: bet.pick,
                        outcome,
                        status: bet.status,
                        payout,
                    });
                }
            }

            updated.push(bet);
        }

        let settlement = Settlement {
            bets: updated,
            wallet,
            changed: !settled.is_empty(),
            settled,
        };

        if settlement.changed {
            info!(
                won = settlement.won(),
                lost = settlement.lost(),
                credited = format!("{:.2}", settlement.credited()),
                balance = %settlement.wallet,
                "Settlement pass complete"
            );
        }

        settlement
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
