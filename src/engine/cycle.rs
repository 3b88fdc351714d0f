//! Poll cycle: fetch → settle → persist → render.
//!
//! One cycle runs to completion before the next tick, so placement and
//! settlement never interleave on the book.

use anyhow::Result;
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{error, info, warn};

use crate::engine::settlement::SettlementEngine;
use crate::feed::MatchSource;
use crate::odds::OddsPolicy;
use crate::render::{Board, Renderer};
use crate::storage::{self, KeyValueStore};
use crate::types::Book;

/// Summary of one poll cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle_number: u64,
    /// False when the fetch failed and settlement was skipped.
    pub feed_ok: bool,
    pub upcoming: usize,
    pub finished: usize,
    pub bets_won: usize,
    pub bets_lost: usize,
    pub credited: Decimal,
    pub balance_before: Decimal,
    pub balance_after: Decimal,
    pub persisted: bool,
    pub timestamp: chrono::DateTime<Utc>,
}

impl CycleReport {
    fn skipped(cycle_number: u64, balance: Decimal) -> Self {
        Self {
            cycle_number,
            feed_ok: false,
            upcoming: 0,
            finished: 0,
            bets_won: 0,
            bets_lost: 0,
            credited: Decimal::ZERO,
            balance_before: balance,
            balance_after: balance,
            persisted: false,
            timestamp: Utc::now(),
        }
    }
}

pub struct Poller {
    source: Box<dyn MatchSource>,
    store: Box<dyn KeyValueStore>,
    renderer: Box<dyn Renderer>,
    odds: OddsPolicy,
    league: Option<String>,
    cycles: u64,
}

impl Poller {
    pub fn new(
        source: Box<dyn MatchSource>,
        store: Box<dyn KeyValueStore>,
        renderer: Box<dyn Renderer>,
        odds: OddsPolicy,
        league: Option<String>,
    ) -> Self {
        Self {
            source,
            store,
            renderer,
            odds,
            league,
            cycles: 0,
        }
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn store_mut(&mut self) -> &mut dyn KeyValueStore {
        self.store.as_mut()
    }

    /// Run one cycle against `book`. A failed fetch is not an error: the
    /// cycle is reported as skipped and the book is left alone.
    pub async fn run_cycle(&mut self, book: &mut Book) -> Result<CycleReport> {
        self.cycles += 1;
        let balance_before = book.wallet.balance;

        let feed = match self.source.fetch().await {
            Ok(feed) => feed,
            Err(e) => {
                warn!(
                    cycle = self.cycles,
                    source = self.source.name(),
                    error = %e,
                    "Feed unavailable, skipping settlement this cycle"
                );
                return Ok(CycleReport::skipped(self.cycles, balance_before));
            }
        };

        let settlement = SettlementEngine::settle(&book.bets, &feed.finished, &book.wallet);
        let changed = settlement.changed;
        let (won, lost, credited) = (settlement.won(), settlement.lost(), settlement.credited());

        let mut persisted = false;
        if changed {
            book.bets = settlement.bets;
            book.wallet = settlement.wallet;
            match storage::save_book(self.store.as_mut(), book) {
                Ok(()) => persisted = true,
                Err(e) => error!(
                    cycle = self.cycles,
                    error = %e,
                    "Failed to persist settled book, will retry on next save"
                ),
            }
            self.renderer.notify_settled(&settlement.settled, &book.wallet)?;
            self.renderer.render_book(book)?;
        }

        let board = Board::build(&feed.upcoming, &self.odds, self.league.as_deref());
        self.renderer.render_board(&board)?;

        let report = CycleReport {
            cycle_number: self.cycles,
            feed_ok: true,
            upcoming: feed.upcoming.len(),
            finished: feed.finished.len(),
            bets_won: won,
            bets_lost: lost,
            credited,
            balance_before,
            balance_after: book.wallet.balance,
            persisted,
            timestamp: Utc::now(),
        };

        info!(
            cycle = report.cycle_number,
            upcoming = report.upcoming,
            finished = report.finished,
            on_board = board.len(),
            won = report.bets_won,
            lost = report.bets_lost,
            balance = format!("{:.2}", report.balance_after),
            "Cycle complete"
        );

        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
