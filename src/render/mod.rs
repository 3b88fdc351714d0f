//! Display layer.
//!
//! The engine hands finished state to a `Renderer` and never formats
//! anything itself. `TextRenderer` writes plain text to any `Write` sink
//! (stdout for the binary, a buffer in tests).

pub mod board;

use anyhow::Result;
use std::io::Write;

use crate::engine::settlement::SettledBet;
use crate::types::{BetStatus, Book, Wallet};

pub use board::Board;

/// Refreshes the user's view after state changes.
pub trait Renderer: Send {
    fn render_board(&mut self, board: &Board) -> Result<()>;
    fn render_book(&mut self, book: &Book) -> Result<()>;
    /// Tell the user which bets were just resolved.
    fn notify_settled(&mut self, settled: &[SettledBet], wallet: &Wallet) -> Result<()>;
}

pub struct TextRenderer<W: Write + Send> {
    out: W,
    currency: String,
}

impl<W: Write + Send> TextRenderer<W> {
    pub fn new(out: W, currency: impl Into<String>) -> Self {
        Self { out, currency: currency.into() }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn money(&self, amount: rust_decimal::Decimal) -> String {
        format!("{} {:.2}", self.currency, amount)
    }
}

impl<W: Write + Send> Renderer for TextRenderer<W> {
    fn render_board(&mut self, board: &Board) -> Result<()> {
        if board.is_empty() {
            writeln!(self.out, "No matches with odds available right now.")?;
            return Ok(());
        }

        for group in &board.groups {
            writeln!(self.out, "== {} ==", group.league)?;
            for row in &group.rows {
                writeln!(
                    self.out,
                    "  {}  {} vs {}  [{}]  {}",
                    row.kickoff.format("%d/%m %H:%M"),
                    row.home_team,
                    row.away_team,
                    row.match_id,
                    row.odds,
                )?;
            }
        }
        Ok(())
    }

    fn render_book(&mut self, book: &Book) -> Result<()> {
        let balance = self.money(book.wallet.balance);
        writeln!(self.out, "My bets (balance {balance})")?;

        if book.bets.is_empty() {
            writeln!(self.out, "  No bet history.")?;
            return Ok(());
        }

        for bet in &book.bets {
            let marker = match bet.status {
                BetStatus::Open => " ",
                BetStatus::Won => "+",
                BetStatus::Lost => "-",
            };
            let stake = self.money(bet.stake);
            let ret = self.money(bet.potential_return);
            writeln!(
                self.out,
                "{marker} {:<4} {}  stake {stake} @ {:.2}  return {ret}",
                bet.status.to_string(),
                bet.selection_label,
                bet.odd,
            )?;
        }
        Ok(())
    }

    fn notify_settled(&mut self, settled: &[SettledBet], wallet: &Wallet) -> Result<()> {
        for s in settled {
            match s.status {
                BetStatus::Won => {
                    let payout = self.money(s.payout);
                    writeln!(self.out, "Bet on {} WON: +{payout}", s.selection_label)?;
                }
                _ => writeln!(
                    self.out,
                    "Bet on {} LOST (result: {})",
                    s.selection_label, s.outcome
                )?,
            }
        }
        let balance = self.money(wallet.balance);
        writeln!(self.out, "Balance: {balance}")?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
